//! In-memory `SlackApi` used by unit tests across the crate.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::error::{AppError, Result};
use crate::slack::{
    AuthIdentity, ChannelInfo, HistoryQuery, Message, Reaction, SlackApi, SlackUser,
    SlackUserGroup, SlackUserProfile,
};

#[derive(Default)]
pub struct FakeSlack {
    pub users: HashMap<String, SlackUser>,
    /// `None` makes `usergroups` fail.
    pub usergroups: Option<Vec<SlackUserGroup>>,
    pub reactions: Vec<Reaction>,
    pub history: Vec<Message>,
    pub channel_name: Option<String>,
    pub user_calls: RefCell<Vec<String>>,
    pub usergroup_calls: Cell<usize>,
    pub posted: RefCell<Vec<(String, String, Option<String>)>>,
}

impl FakeSlack {
    pub fn new() -> Self {
        Self {
            usergroups: Some(Vec::new()),
            ..Self::default()
        }
    }

    pub fn with_user(mut self, id: &str, name: &str) -> Self {
        self.users.insert(
            id.to_string(),
            SlackUser {
                id: id.to_string(),
                name: name.to_string(),
                ..SlackUser::default()
            },
        );
        self
    }

    pub fn with_user_email(mut self, id: &str, name: &str, email: &str) -> Self {
        self.users.insert(
            id.to_string(),
            SlackUser {
                id: id.to_string(),
                name: name.to_string(),
                real_name: None,
                profile: SlackUserProfile {
                    email: Some(email.to_string()),
                    ..SlackUserProfile::default()
                },
            },
        );
        self
    }

    pub fn with_usergroup(mut self, id: &str, handle: &str) -> Self {
        self.usergroups.get_or_insert_with(Vec::new).push(SlackUserGroup {
            id: id.to_string(),
            handle: handle.to_string(),
            name: String::new(),
        });
        self
    }

    pub fn user_call_count(&self) -> usize {
        self.user_calls.borrow().len()
    }
}

impl SlackApi for FakeSlack {
    fn thread_replies(&self, _channel_id: &str, ts: &str) -> Result<Vec<Message>> {
        Ok(self
            .history
            .iter()
            .filter(|m| m.ts == ts || m.thread_ts.as_deref() == Some(ts))
            .cloned()
            .collect())
    }

    fn channel_history(&self, _channel_id: &str, _query: &HistoryQuery) -> Result<Vec<Message>> {
        Ok(self.history.clone())
    }

    fn user_info(&self, user_id: &str) -> Result<SlackUser> {
        self.user_calls.borrow_mut().push(user_id.to_string());
        self.users
            .get(user_id)
            .cloned()
            .ok_or_else(|| AppError::LookupFailed("user not found".to_string()))
    }

    fn usergroups(&self) -> Result<Vec<SlackUserGroup>> {
        self.usergroup_calls.set(self.usergroup_calls.get() + 1);
        self.usergroups
            .clone()
            .ok_or_else(|| AppError::LookupFailed("the token lacks a required scope".to_string()))
    }

    fn reactions(&self, _channel_id: &str, _ts: &str) -> Result<Vec<Reaction>> {
        Ok(self.reactions.clone())
    }

    fn channel_info(&self, channel_id: &str) -> Result<ChannelInfo> {
        Ok(ChannelInfo {
            id: channel_id.to_string(),
            name: self.channel_name.clone(),
        })
    }

    fn post_message(
        &self,
        channel_id: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<String> {
        self.posted.borrow_mut().push((
            channel_id.to_string(),
            text.to_string(),
            thread_ts.map(str::to_string),
        ));
        Ok("1770000000.000100".to_string())
    }

    fn auth_test(&self) -> Result<AuthIdentity> {
        Ok(AuthIdentity {
            user: Some("tester".to_string()),
            team: Some("example".to_string()),
        })
    }
}
