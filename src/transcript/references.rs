use std::collections::HashMap;

use tracing::debug;

use crate::slack::{SlackApi, SlackUser, SlackUserGroup};

/// Users and user groups already fetched while rendering.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct SlackReferences {
    pub users: HashMap<String, SlackUser>,
    pub usergroups: HashMap<String, SlackUserGroup>,
    /// Set once `usergroups.list` has succeeded, even when it returned nothing.
    pub usergroups_loaded: bool,
}

/// Resolves user, user group and channel IDs into display names, fetching at
/// most once per ID for users and once per run for user groups.
pub struct Resolver<'a> {
    api: &'a dyn SlackApi,
    references: SlackReferences,
    lookups: usize,
}

impl<'a> Resolver<'a> {
    pub fn new(api: &'a dyn SlackApi) -> Self {
        Self {
            api,
            references: SlackReferences::default(),
            lookups: 0,
        }
    }

    #[cfg(test)]
    pub(crate) fn references(&self) -> &SlackReferences {
        &self.references
    }

    /// Number of remote calls made so far.
    pub fn lookups(&self) -> usize {
        self.lookups
    }

    /// Fetch a user, caching successes only so failures are retried.
    pub fn user(&mut self, user_id: &str) -> Option<&SlackUser> {
        if !self.references.users.contains_key(user_id) {
            self.lookups += 1;
            match self.api.user_info(user_id) {
                Ok(user) => {
                    self.references.users.insert(user_id.to_string(), user);
                }
                Err(e) => {
                    debug!(user = user_id, error = %e, "user lookup failed");
                    return None;
                }
            }
        }
        self.references.users.get(user_id)
    }

    pub fn user_display(&mut self, user_id: &str) -> String {
        match self.user(user_id) {
            Some(user) => format!("@{}", user.handle()),
            None => format!("@{}", user_id),
        }
    }

    fn load_usergroups(&mut self) {
        self.lookups += 1;
        match self.api.usergroups() {
            Ok(groups) => {
                for group in groups {
                    self.references.usergroups.insert(group.id.clone(), group);
                }
                self.references.usergroups_loaded = true;
            }
            Err(e) => debug!(error = %e, "user group lookup failed"),
        }
    }

    pub fn usergroup_display(&mut self, group_id: &str) -> String {
        if !self.references.usergroups.contains_key(group_id)
            && !self.references.usergroups_loaded
        {
            self.load_usergroups();
        }

        match self.references.usergroups.get(group_id) {
            Some(group) if !group.handle.is_empty() => format!("@{}", group.handle),
            _ => format!("@{}", group_id),
        }
    }

    pub fn channel_display(&self, channel_id: &str, name: Option<&str>) -> String {
        match name.filter(|n| !n.is_empty()) {
            Some(name) => format!("#{}", name),
            None => format!("#{}", channel_id),
        }
    }
}
