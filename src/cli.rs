use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "slack-transcript")]
#[command(about = "Fetch Slack threads and channels as readable transcripts")]
pub struct Cli {
    /// Show debug logs on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch a thread, channel or reaction list
    Get(GetArgs),

    /// Fetch a channel transcript including thread replies
    Channel(ChannelArgs),

    /// List the users who reacted to a message
    Reactions(ReactionsArgs),

    /// Post a message to a channel or thread
    Post(PostArgs),

    /// Manage the stored configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Args)]
#[command(args_conflicts_with_subcommands = true, arg_required_else_help = true)]
pub struct GetArgs {
    #[command(subcommand)]
    pub command: Option<GetCommands>,

    /// Thread URL, same as `get thread <URL>`
    pub url: Option<String>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Subcommand)]
pub enum GetCommands {
    /// Fetch a thread transcript
    Thread(ThreadArgs),

    /// Fetch a channel transcript including thread replies
    Channel(ChannelArgs),

    /// List the users who reacted to a message
    Reactions(ReactionsArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Write to this file instead of stdout (`.md` is added when no extension is given)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format, defaults to the file extension
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,
}

#[derive(Args, Debug, Clone)]
pub struct ThreadArgs {
    /// Thread or reply permalink
    pub url: String,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ChannelArgs {
    /// Channel URL
    pub url: String,

    /// Number of messages to fetch (the API returns at most 1000)
    #[arg(short, long, default_value_t = 100)]
    pub limit: u32,

    /// Start of the window (2024-01-01, 2024-01-01T00:00:00 or unix seconds)
    #[arg(long)]
    pub oldest: Option<String>,

    /// End of the window (2024-12-31, 2024-12-31T23:59:59 or unix seconds)
    #[arg(long)]
    pub latest: Option<String>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ReactionsArgs {
    /// Message permalink
    pub url: String,

    /// Only list this reaction (e.g. :参加します:)
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Print email addresses instead of user names
    #[arg(short, long)]
    pub email: bool,

    /// Write the list to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Count skin-tone variants as their base reaction
    #[arg(long)]
    pub merge: bool,

    /// Group users under each reaction with a count
    #[arg(long)]
    pub summary: bool,
}

#[derive(Args, Debug, Clone)]
pub struct PostArgs {
    /// Message text
    pub message: String,

    /// Channel ID or channel URL
    #[arg(short, long, conflicts_with = "thread_url", required_unless_present = "thread_url")]
    pub channel: Option<String>,

    /// Timestamp of the thread to reply to
    #[arg(short, long, requires = "channel")]
    pub thread: Option<String>,

    /// Permalink of the thread to reply to
    #[arg(short = 'u', long)]
    pub thread_url: Option<String>,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Store a setting
    Set {
        #[command(subcommand)]
        key: SetCommands,
    },

    /// Show the config file path and the masked token
    Show,
}

#[derive(Subcommand)]
pub enum SetCommands {
    /// Store the Slack user token (xoxp-...)
    Token { token: String },
}
