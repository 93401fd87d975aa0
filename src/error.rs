use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("invalid Slack {kind} URL, expected format: {template}")]
    InvalidUrl {
        kind: &'static str,
        template: &'static str,
    },

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("failed to format message {ts}: {source}")]
    FormatMessage {
        ts: String,
        #[source]
        source: Box<AppError>,
    },

    #[error("no messages to format")]
    EmptyInput,

    #[error("{0}")]
    LookupFailed(String),

    #[error(
        "Slack API token is not set. Run `slack-transcript config set token \"xoxp-...\"` or set SLACK_TOKEN"
    )]
    MissingToken,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("invalid date format: {0}")]
    InvalidDate(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("could not determine config directory: neither XDG_CONFIG_HOME nor HOME is set")]
    MissingConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to read file at {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to write file at {path}: {source}")]
    WriteFile {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("JSON parse error: {0}")]
    JsonParse(String),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
