use std::collections::HashSet;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::error::{AppError, Result};

pub const SLACK_API_BASE: &str = "https://slack.com/api";

/// Hard cap the Web API applies to a single history or replies page.
pub const MAX_PAGE_SIZE: u32 = 1000;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Remote error codes with a human readable explanation, matched by substring.
const KNOWN_API_ERRORS: &[(&str, &str)] = &[
    (
        "invalid_auth",
        "authentication failed: the token is invalid or expired",
    ),
    ("account_inactive", "the account is inactive"),
    ("token_revoked", "the token has been revoked"),
    ("not_authed", "not authenticated"),
    ("channel_not_found", "channel not found"),
    ("thread_not_found", "thread not found"),
    ("message_not_found", "message not found"),
    ("user_not_found", "user not found"),
    ("not_in_channel", "no permission to access this channel"),
    ("missing_scope", "the token lacks a required scope"),
    (
        "rate_limited",
        "API rate limit reached, wait a moment and try again",
    ),
    (
        "ratelimited",
        "API rate limit reached, wait a moment and try again",
    ),
    ("timeout", "network timeout"),
    ("no_network", "network connection error"),
];

/// Turn a Slack error code (or any error text containing one) into a readable message.
pub fn translate_api_error(code: &str) -> String {
    KNOWN_API_ERRORS
        .iter()
        .find(|(needle, _)| code.contains(needle))
        .map(|(_, message)| message.to_string())
        .unwrap_or_else(|| format!("Slack API error: {}", code))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub bot_id: Option<String>,
    #[serde(default)]
    pub text: String,
    pub ts: String,
    #[serde(default)]
    pub thread_ts: Option<String>,
    #[serde(default)]
    pub reply_count: u32,
}

impl Message {
    pub fn new(user: &str, ts: &str, text: &str) -> Self {
        Self {
            user: Some(user.to_string()),
            text: text.to_string(),
            ts: ts.to_string(),
            ..Self::default()
        }
    }

    pub fn in_thread(mut self, thread_ts: &str) -> Self {
        self.thread_ts = Some(thread_ts.to_string());
        self
    }

    /// A message is a reply when it carries a thread anchor other than its own timestamp.
    pub fn is_reply(&self) -> bool {
        matches!(&self.thread_ts, Some(thread_ts) if *thread_ts != self.ts)
    }

    /// Sender label for messages without a user ID (bots, integrations).
    pub fn fallback_author(&self) -> &str {
        self.username
            .as_deref()
            .or(self.bot_id.as_deref())
            .unwrap_or("unknown")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlackUserProfile {
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlackUser {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub profile: SlackUserProfile,
}

impl SlackUser {
    pub fn real_name(&self) -> Option<&str> {
        self.real_name
            .as_deref()
            .or(self.profile.real_name.as_deref())
            .filter(|name| !name.is_empty())
    }

    pub fn email(&self) -> Option<&str> {
        self.profile.email.as_deref().filter(|email| !email.is_empty())
    }

    /// Handle, then real name, then ID.
    pub fn handle(&self) -> &str {
        if !self.name.is_empty() {
            return &self.name;
        }
        self.real_name().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlackUserGroup {
    pub id: String,
    #[serde(default)]
    pub handle: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    pub name: String,
    #[serde(default)]
    pub users: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthIdentity {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
}

/// Bounds for a single `conversations.history` fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub limit: u32,
    pub oldest: Option<String>,
    pub latest: Option<String>,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            limit: 100,
            oldest: None,
            latest: None,
        }
    }
}

/// The calls the transcript tooling needs from Slack.
pub trait SlackApi {
    /// Thread root followed by its replies, oldest first.
    fn thread_replies(&self, channel_id: &str, ts: &str) -> Result<Vec<Message>>;

    /// Root-level channel messages in server order (newest first).
    fn channel_history(&self, channel_id: &str, query: &HistoryQuery) -> Result<Vec<Message>>;

    fn user_info(&self, user_id: &str) -> Result<SlackUser>;

    fn usergroups(&self) -> Result<Vec<SlackUserGroup>>;

    fn reactions(&self, channel_id: &str, ts: &str) -> Result<Vec<Reaction>>;

    fn channel_info(&self, channel_id: &str) -> Result<ChannelInfo>;

    /// Returns the timestamp of the posted message.
    fn post_message(&self, channel_id: &str, text: &str, thread_ts: Option<&str>) -> Result<String>;

    fn auth_test(&self) -> Result<AuthIdentity>;
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct UserResponse {
    user: SlackUser,
}

#[derive(Deserialize)]
struct UserGroupsResponse {
    #[serde(default)]
    usergroups: Vec<SlackUserGroup>,
}

#[derive(Deserialize)]
struct ReactedItem {
    #[serde(default)]
    reactions: Vec<Reaction>,
}

#[derive(Deserialize)]
struct ReactionsResponse {
    message: ReactedItem,
}

#[derive(Deserialize)]
struct ChannelResponse {
    channel: ChannelInfo,
}

#[derive(Deserialize)]
struct PostMessageResponse {
    ts: String,
}

#[derive(Serialize)]
struct PostMessageRequest<'a> {
    channel: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    thread_ts: Option<&'a str>,
}

fn transport_error(err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::LookupFailed(translate_api_error("timeout"))
    } else if err.is_connect() {
        AppError::LookupFailed(translate_api_error("no_network"))
    } else {
        AppError::LookupFailed(format!("Slack API error: {}", err))
    }
}

/// Check the `ok` envelope every Web API response carries.
fn check_envelope(body: &serde_json::Value) -> Result<()> {
    let ok = body
        .get("ok")
        .and_then(|v| v.as_bool())
        .ok_or_else(|| AppError::JsonParse("missing 'ok' field in response".to_string()))?;

    if ok {
        return Ok(());
    }

    let code = body
        .get("error")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown_error");
    let mut message = translate_api_error(code);
    if let Some(needed) = body.get("needed").and_then(|v| v.as_str()) {
        message.push_str(&format!(" (needed scope: {})", needed));
    }
    Err(AppError::LookupFailed(message))
}

/// Blocking Slack Web API client authenticated with a user token.
pub struct SlackClient {
    http: Client,
    token: String,
    base_url: String,
}

impl SlackClient {
    pub fn new(token: &str) -> Result<Self> {
        Self::with_base_url(token, SLACK_API_BASE)
    }

    pub fn with_base_url(token: &str, base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(transport_error)?;

        Ok(Self {
            http,
            token: token.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, method: &str, params: &[(&str, &str)]) -> Result<Url> {
        let raw = format!("{}/{}", self.base_url, method);
        Url::parse_with_params(&raw, params)
            .map_err(|e| AppError::InvalidArgument(format!("bad API URL {}: {}", raw, e)))
    }

    fn get<T: DeserializeOwned>(&self, method: &str, params: &[(&str, &str)]) -> Result<T> {
        let url = self.endpoint(method, params)?;
        debug!(method, "calling Slack API");

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .map_err(transport_error)?;

        Self::decode(response)
    }

    fn post_json<T: DeserializeOwned, B: Serialize>(&self, method: &str, body: &B) -> Result<T> {
        let url = self.endpoint(method, &[])?;
        debug!(method, "calling Slack API");

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .map_err(transport_error)?;

        Self::decode(response)
    }

    fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::LookupFailed(translate_api_error("rate_limited")));
        }

        let body: serde_json::Value = response
            .json()
            .map_err(|e| AppError::JsonParse(e.to_string()))?;
        check_envelope(&body)?;

        serde_json::from_value(body).map_err(|e| AppError::JsonParse(e.to_string()))
    }
}

impl SlackApi for SlackClient {
    fn thread_replies(&self, channel_id: &str, ts: &str) -> Result<Vec<Message>> {
        let limit = MAX_PAGE_SIZE.to_string();
        let response: MessagesResponse = self.get(
            "conversations.replies",
            &[
                ("channel", channel_id),
                ("ts", ts),
                ("inclusive", "true"),
                ("limit", &limit),
            ],
        )?;
        Ok(response.messages)
    }

    fn channel_history(&self, channel_id: &str, query: &HistoryQuery) -> Result<Vec<Message>> {
        let limit = query.limit.min(MAX_PAGE_SIZE).to_string();
        let mut params = vec![
            ("channel", channel_id),
            ("limit", limit.as_str()),
            ("inclusive", "true"),
        ];
        if let Some(oldest) = &query.oldest {
            params.push(("oldest", oldest.as_str()));
        }
        if let Some(latest) = &query.latest {
            params.push(("latest", latest.as_str()));
        }

        let response: MessagesResponse = self.get("conversations.history", &params)?;
        Ok(response.messages)
    }

    fn user_info(&self, user_id: &str) -> Result<SlackUser> {
        let response: UserResponse = self.get("users.info", &[("user", user_id)])?;
        Ok(response.user)
    }

    fn usergroups(&self) -> Result<Vec<SlackUserGroup>> {
        let response: UserGroupsResponse = self.get("usergroups.list", &[])?;
        Ok(response.usergroups)
    }

    fn reactions(&self, channel_id: &str, ts: &str) -> Result<Vec<Reaction>> {
        let response: ReactionsResponse = self.get(
            "reactions.get",
            &[("channel", channel_id), ("timestamp", ts), ("full", "true")],
        )?;
        Ok(response.message.reactions)
    }

    fn channel_info(&self, channel_id: &str) -> Result<ChannelInfo> {
        let response: ChannelResponse =
            self.get("conversations.info", &[("channel", channel_id)])?;
        Ok(response.channel)
    }

    fn post_message(
        &self,
        channel_id: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<String> {
        let request = PostMessageRequest {
            channel: channel_id,
            text,
            thread_ts,
        };
        let response: PostMessageResponse = self.post_json("chat.postMessage", &request)?;
        Ok(response.ts)
    }

    fn auth_test(&self) -> Result<AuthIdentity> {
        self.get("auth.test", &[])
    }
}

/// Fetch channel history and splice in the replies of every threaded root.
///
/// A thread whose replies cannot be fetched is logged and skipped; its root
/// message is kept.
pub fn fetch_channel_with_threads(
    api: &dyn SlackApi,
    channel_id: &str,
    query: &HistoryQuery,
) -> Result<Vec<Message>> {
    let history = api.channel_history(channel_id, query)?;

    let mut seen: HashSet<String> = history.iter().map(|m| m.ts.clone()).collect();
    let mut all_messages = Vec::with_capacity(history.len());

    for message in history {
        let root_ts = message.ts.clone();
        let threaded =
            message.reply_count > 0 || message.thread_ts.as_deref() == Some(root_ts.as_str());
        all_messages.push(message);

        if !threaded {
            continue;
        }

        match api.thread_replies(channel_id, &root_ts) {
            Ok(replies) => {
                for reply in replies {
                    if reply.ts != root_ts && seen.insert(reply.ts.clone()) {
                        all_messages.push(reply);
                    }
                }
            }
            Err(e) => warn!(thread = %root_ts, error = %e, "skipping thread replies"),
        }
    }

    Ok(all_messages)
}

/// Find a single root message by its exact timestamp.
pub fn find_message(api: &dyn SlackApi, channel_id: &str, ts: &str) -> Result<Message> {
    let query = HistoryQuery {
        limit: 1,
        oldest: Some(ts.to_string()),
        latest: Some(ts.to_string()),
    };

    api.channel_history(channel_id, &query)?
        .into_iter()
        .find(|m| m.ts == ts)
        .ok_or_else(|| AppError::LookupFailed(translate_api_error("message_not_found")))
}
