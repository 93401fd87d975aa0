use std::collections::HashMap;

use chrono::NaiveDate;

use super::mentions::{self, Mention};
use super::references::Resolver;
use crate::error::{AppError, Result};
use crate::slack::Message;
use crate::timestamp;

pub const THREAD_LABEL: &str = "Slackスレッドの内容";
pub const CHANNEL_LABEL: &str = "Slackチャンネルの内容";
pub const FOOTER: &str = "--- ここまで ---";
pub const EMPTY_BODY: &str = "(メッセージの内容がありません)";

const REPLY_FIRST_LINE: &str = "  └─ ";
const REPLY_CONTINUATION: &str = "     ";

/// Renders messages into the plain-text transcript format.
pub struct TranscriptFormatter<'r, 'a> {
    resolver: &'r mut Resolver<'a>,
    captured_on: NaiveDate,
}

impl<'r, 'a> TranscriptFormatter<'r, 'a> {
    pub fn new(resolver: &'r mut Resolver<'a>, captured_on: NaiveDate) -> Self {
        Self {
            resolver,
            captured_on,
        }
    }

    fn header(&self, label: &str) -> String {
        format!(
            "--- {} ({} 取得) ---\n",
            label,
            self.captured_on.format("%Y/%m/%d")
        )
    }

    /// Every message in input order, one block each.
    pub fn format_thread(&mut self, messages: &[Message]) -> Result<String> {
        if messages.is_empty() {
            return Err(AppError::EmptyInput);
        }

        let mut out = self.header(THREAD_LABEL);
        out.push('\n');

        for message in messages {
            out.push_str(&self.message_block(message)?);
            out.push_str("\n\n");
        }

        out.push_str(FOOTER);
        Ok(out)
    }

    /// Root messages in input order with their replies nested underneath.
    ///
    /// Replies whose root is missing from `messages` are dropped.
    pub fn format_channel(
        &mut self,
        messages: &[Message],
        channel_name: Option<&str>,
    ) -> Result<String> {
        if messages.is_empty() {
            return Err(AppError::EmptyInput);
        }

        let mut out = self.header(CHANNEL_LABEL);
        if let Some(name) = channel_name.filter(|n| !n.is_empty()) {
            out.push_str(&format!("チャンネル: #{}\n", name));
        }
        out.push('\n');

        let mut replies: HashMap<&str, Vec<&Message>> = HashMap::new();
        for message in messages {
            if message.is_reply()
                && let Some(anchor) = message.thread_ts.as_deref()
            {
                replies.entry(anchor).or_default().push(message);
            }
        }
        for group in replies.values_mut() {
            group.sort_by(|a, b| a.ts.cmp(&b.ts));
        }

        for root in messages.iter().filter(|m| !m.is_reply()) {
            out.push_str(&self.message_block(root)?);
            out.push('\n');

            for reply in replies.get(root.ts.as_str()).into_iter().flatten() {
                let block = self.message_block(reply)?;
                for (i, line) in block.split('\n').enumerate() {
                    let prefix = if i == 0 {
                        REPLY_FIRST_LINE
                    } else {
                        REPLY_CONTINUATION
                    };
                    out.push_str(prefix);
                    out.push_str(line);
                    out.push('\n');
                }
            }

            out.push('\n');
        }

        out.push_str(FOOTER);
        Ok(out)
    }

    fn message_block(&mut self, message: &Message) -> Result<String> {
        self.format_message(message).map_err(|e| AppError::FormatMessage {
            ts: message.ts.clone(),
            source: Box::new(e),
        })
    }

    /// `[<time>][@<author>]:\n<body>`
    pub fn format_message(&mut self, message: &Message) -> Result<String> {
        let time = timestamp::render(&message.ts)?;

        let author = match message.user.as_deref().filter(|id| !id.is_empty()) {
            Some(user_id) => self.resolver.user_display(user_id),
            None => format!("@{}", message.fallback_author()),
        };

        let body = self.clean_body(&message.text);
        Ok(format!("[{}][{}]:\n{}", time, author, body))
    }

    fn clean_body(&mut self, text: &str) -> String {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return EMPTY_BODY.to_string();
        }

        let normalized = trimmed.replace("\r\n", "\n").replace('\r', "\n");
        let resolver = &mut *self.resolver;
        mentions::rewrite(&normalized, |mention| match mention {
            Mention::User(id) => resolver.user_display(id),
            Mention::Subteam(id) => resolver.usergroup_display(id),
            Mention::Channel { id, name } => resolver.channel_display(id, name),
        })
    }
}
