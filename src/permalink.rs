use url::Url;

use crate::error::{AppError, Result};
use crate::timestamp::decode_compact;

pub const CHANNEL_URL_TEMPLATE: &str = "https://your-workspace.slack.com/archives/C12345678";
pub const THREAD_URL_TEMPLATE: &str =
    "https://your-workspace.slack.com/archives/C12345678/p1234567890123456";
pub const REPLY_URL_TEMPLATE: &str = "https://your-workspace.slack.com/archives/C12345678/p1234567890123456?thread_ts=1234567890.123456&cid=C12345678";

const SLACK_DOMAIN_SUFFIX: &str = ".slack.com";

/// The URL shape a call site expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlShape {
    Channel,
    Thread,
    Message,
}

impl UrlShape {
    fn error(self) -> AppError {
        let (kind, template) = match self {
            UrlShape::Channel => ("channel", CHANNEL_URL_TEMPLATE),
            UrlShape::Thread => ("thread", THREAD_URL_TEMPLATE),
            UrlShape::Message => ("message", THREAD_URL_TEMPLATE),
        };
        AppError::InvalidUrl { kind, template }
    }
}

/// Identifiers recovered from a Slack URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLocator {
    pub channel_id: String,
    /// Canonical timestamp of the linked message; `None` for channel URLs.
    pub timestamp: Option<String>,
    /// Thread anchor, only present on reply permalinks (`?thread_ts=`).
    pub thread_timestamp: Option<String>,
}

impl ResourceLocator {
    /// Timestamp of the thread root this URL points into.
    pub fn thread_root(&self) -> Option<&str> {
        self.thread_timestamp
            .as_deref()
            .or(self.timestamp.as_deref())
    }
}

/// The pieces of an `/archives/...` URL before any timestamp decoding.
struct ArchivePath {
    channel_id: String,
    compact_ts: Option<String>,
    thread_ts: Option<String>,
}

fn is_channel_id(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

fn compact_ts_segment(segment: &str) -> Option<&str> {
    let digits = segment.strip_prefix('p')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(digits)
}

fn is_workspace_host(host: &str) -> bool {
    match host.strip_suffix(SLACK_DOMAIN_SUFFIX) {
        Some(workspace) => !workspace.is_empty() && !workspace.starts_with('.'),
        None => false,
    }
}

fn split_archive_url(input: &str) -> Option<ArchivePath> {
    let url = Url::parse(input.trim()).ok()?;
    if url.scheme() != "https" || !is_workspace_host(url.host_str()?) {
        return None;
    }

    let mut segments: Vec<&str> = url.path_segments()?.collect();
    if segments.last() == Some(&"") {
        segments.pop();
    }

    let (channel_id, compact_ts) = match segments.as_slice() {
        ["archives", channel] => (*channel, None),
        ["archives", channel, ts] => (*channel, Some(compact_ts_segment(ts)?)),
        _ => return None,
    };
    if !is_channel_id(channel_id) {
        return None;
    }

    let thread_ts = url
        .query_pairs()
        .find(|(key, _)| key == "thread_ts")
        .map(|(_, value)| value.into_owned());

    Some(ArchivePath {
        channel_id: channel_id.to_string(),
        compact_ts: compact_ts.map(str::to_string),
        thread_ts,
    })
}

fn is_canonical_thread_ts(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit() || b == b'.')
}

fn locate(path: ArchivePath) -> Result<ResourceLocator> {
    match (path.compact_ts, path.thread_ts) {
        (Some(compact), Some(thread_ts)) => {
            if !is_canonical_thread_ts(&thread_ts) {
                return Err(AppError::InvalidUrl {
                    kind: "thread reply",
                    template: REPLY_URL_TEMPLATE,
                });
            }
            Ok(ResourceLocator {
                channel_id: path.channel_id,
                timestamp: Some(decode_compact(&compact)?),
                thread_timestamp: Some(thread_ts),
            })
        }
        (Some(compact), None) => Ok(ResourceLocator {
            channel_id: path.channel_id,
            timestamp: Some(decode_compact(&compact)?),
            thread_timestamp: None,
        }),
        (None, _) => Ok(ResourceLocator {
            channel_id: path.channel_id,
            timestamp: None,
            thread_timestamp: None,
        }),
    }
}

/// Parse a URL that must have the given shape.
///
/// `Thread` and `Message` accept both plain permalinks and reply permalinks;
/// `Channel` only accepts a bare `/archives/<CHANNEL>` URL.
pub fn parse_as(input: &str, expected: UrlShape) -> Result<ResourceLocator> {
    let path = split_archive_url(input).ok_or_else(|| expected.error())?;

    let has_timestamp = path.compact_ts.is_some();
    let shape_matches = match expected {
        UrlShape::Channel => !has_timestamp,
        UrlShape::Thread | UrlShape::Message => has_timestamp,
    };
    if !shape_matches {
        return Err(expected.error());
    }

    locate(path)
}

pub fn parse_channel_url(input: &str) -> Result<ResourceLocator> {
    parse_as(input, UrlShape::Channel)
}

pub fn parse_thread_url(input: &str) -> Result<ResourceLocator> {
    parse_as(input, UrlShape::Thread)
}

pub fn parse_message_url(input: &str) -> Result<ResourceLocator> {
    parse_as(input, UrlShape::Message)
}

/// Check that a raw channel ID looks like a channel, private group or DM.
pub fn validate_channel_id(channel_id: &str) -> Result<()> {
    if channel_id.is_empty() {
        return Err(AppError::InvalidArgument("channel ID is empty".to_string()));
    }
    if !channel_id.starts_with(['C', 'G', 'D']) {
        return Err(AppError::InvalidArgument(format!(
            "invalid channel ID format: {}",
            channel_id
        )));
    }
    Ok(())
}
