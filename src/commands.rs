use std::path::Path;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::cli::{
    ChannelArgs, ConfigCommands, GetArgs, GetCommands, OutputArgs, PostArgs, ReactionsArgs,
    SetCommands, ThreadArgs,
};
use crate::error::{AppError, Result};
use crate::output::{OutputFormat, save_transcript};
use crate::permalink::{self, ResourceLocator};
use crate::reactions;
use crate::settings::{self, Settings};
use crate::slack::{self, HistoryQuery, MAX_PAGE_SIZE, SlackApi, SlackClient};
use crate::timestamp::{self, Bound};
use crate::transcript::{Resolver, TranscriptFormatter};

/// Load the token and check it against `auth.test` before any API command.
fn connect() -> Result<SlackClient> {
    let token = settings::load_token()?;
    let client = SlackClient::new(&token)?;

    let identity = client.auth_test()?;
    debug!(user = ?identity.user, team = ?identity.team, "connected to Slack");

    Ok(client)
}

fn today() -> NaiveDate {
    timestamp::capture_date(Utc::now())
}

fn emit(transcript: &str, output: &OutputArgs) -> Result<()> {
    match &output.output {
        Some(path) => {
            let written = save_transcript(transcript, path, output.format)?;
            eprintln!("Saved to {}", written.display());
        }
        None => {
            let format = output.format.unwrap_or(OutputFormat::Text);
            println!("{}", format.apply(transcript));
        }
    }
    Ok(())
}

pub fn thread_transcript(
    api: &dyn SlackApi,
    locator: &ResourceLocator,
    captured_on: NaiveDate,
) -> Result<String> {
    let root = locator.thread_root().ok_or_else(|| AppError::InvalidUrl {
        kind: "thread",
        template: permalink::THREAD_URL_TEMPLATE,
    })?;

    let messages = api.thread_replies(&locator.channel_id, root)?;
    info!("Fetched {} messages from thread {}", messages.len(), root);

    let mut resolver = Resolver::new(api);
    TranscriptFormatter::new(&mut resolver, captured_on).format_thread(&messages)
}

pub fn channel_query(args: &ChannelArgs) -> Result<HistoryQuery> {
    if args.limit > MAX_PAGE_SIZE {
        warn!(
            "Requested limit {} exceeds the API maximum of {}; only {} messages will be fetched. \
             Use --oldest/--latest to fetch large ranges in several runs.",
            args.limit, MAX_PAGE_SIZE, MAX_PAGE_SIZE
        );
    }

    Ok(HistoryQuery {
        limit: args.limit,
        oldest: args
            .oldest
            .as_deref()
            .map(|s| timestamp::parse_bound(s, Bound::Oldest))
            .transpose()?,
        latest: args
            .latest
            .as_deref()
            .map(|s| timestamp::parse_bound(s, Bound::Latest))
            .transpose()?,
    })
}

pub fn channel_transcript(
    api: &dyn SlackApi,
    channel_id: &str,
    query: &HistoryQuery,
    captured_on: NaiveDate,
) -> Result<String> {
    let messages = slack::fetch_channel_with_threads(api, channel_id, query)?;
    let roots = messages.iter().filter(|m| !m.is_reply()).count();
    info!(
        "Fetched {} messages ({} including thread replies)",
        roots,
        messages.len()
    );
    if roots >= MAX_PAGE_SIZE as usize {
        warn!(
            "Reached the {} message limit; older messages may be missing. \
             Use --oldest/--latest to fetch the full history in several runs.",
            MAX_PAGE_SIZE
        );
    }

    let channel_name = match api.channel_info(channel_id) {
        Ok(info) => info.name.unwrap_or_else(|| channel_id.to_string()),
        Err(e) => {
            debug!(channel = channel_id, error = %e, "channel name lookup failed");
            channel_id.to_string()
        }
    };

    let mut resolver = Resolver::new(api);
    TranscriptFormatter::new(&mut resolver, captured_on)
        .format_channel(&messages, Some(channel_name.as_str()))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReactionOptions<'a> {
    pub filter: Option<&'a str>,
    pub use_email: bool,
    pub merge: bool,
    pub summary: bool,
}

pub fn reaction_listing(
    api: &dyn SlackApi,
    locator: &ResourceLocator,
    options: ReactionOptions<'_>,
) -> Result<String> {
    let ts = locator.timestamp.as_deref().ok_or_else(|| AppError::InvalidUrl {
        kind: "message",
        template: permalink::THREAD_URL_TEMPLATE,
    })?;

    let mut found = api.reactions(&locator.channel_id, ts)?;
    if options.merge {
        found = reactions::merge_variants(found);
    }
    if let Some(filter) = options.filter {
        found = reactions::filter_by_name(found, filter);
    }

    let mut resolver = Resolver::new(api);
    let resolved = reactions::resolve_members(&mut resolver, &found);

    Ok(if options.summary {
        reactions::render_summary(&resolved, options.use_email)
    } else {
        reactions::render_members(&resolved, options.use_email)
    })
}

/// Where a post goes: a channel, optionally inside a thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostTarget {
    pub channel_id: String,
    pub thread_ts: Option<String>,
}

/// Accept a channel ID or a channel URL.
pub fn channel_target(channel: &str, thread_ts: Option<&str>) -> Result<PostTarget> {
    let channel_id = if channel.starts_with("https://") {
        permalink::parse_channel_url(channel)?.channel_id
    } else {
        permalink::validate_channel_id(channel)?;
        channel.to_string()
    };

    Ok(PostTarget {
        channel_id,
        thread_ts: thread_ts.map(str::to_string),
    })
}

/// Reply permalinks carry their thread anchor; plain permalinks are looked up
/// so a missing message fails before anything is posted.
pub fn thread_url_target(api: &dyn SlackApi, thread_url: &str) -> Result<PostTarget> {
    let locator = permalink::parse_thread_url(thread_url)?;

    let thread_ts = match (&locator.thread_timestamp, &locator.timestamp) {
        (Some(anchor), _) => anchor.clone(),
        (None, Some(ts)) => slack::find_message(api, &locator.channel_id, ts)?.ts,
        (None, None) => {
            return Err(AppError::InvalidUrl {
                kind: "thread",
                template: permalink::THREAD_URL_TEMPLATE,
            });
        }
    };

    Ok(PostTarget {
        channel_id: locator.channel_id,
        thread_ts: Some(thread_ts),
    })
}

pub fn post(api: &dyn SlackApi, target: &PostTarget, message: &str) -> Result<String> {
    let ts = api.post_message(&target.channel_id, message, target.thread_ts.as_deref())?;
    info!(channel = %target.channel_id, ts = %ts, "message posted");
    Ok(ts)
}

pub fn run_get(args: GetArgs) -> Result<()> {
    match (args.command, args.url) {
        (Some(GetCommands::Thread(thread)), _) => run_thread(thread),
        (Some(GetCommands::Channel(channel)), _) => run_channel(channel),
        (Some(GetCommands::Reactions(reactions)), _) => run_reactions(reactions),
        (None, Some(url)) => run_thread(ThreadArgs {
            url,
            output: args.output,
        }),
        (None, None) => Err(AppError::InvalidArgument(
            "a thread URL or a subcommand is required".to_string(),
        )),
    }
}

pub fn run_thread(args: ThreadArgs) -> Result<()> {
    let locator = permalink::parse_thread_url(&args.url)?;
    let client = connect()?;

    let transcript = thread_transcript(&client, &locator, today())?;
    emit(&transcript, &args.output)
}

pub fn run_channel(args: ChannelArgs) -> Result<()> {
    let locator = permalink::parse_channel_url(&args.url)?;
    let query = channel_query(&args)?;
    let client = connect()?;

    let transcript = channel_transcript(&client, &locator.channel_id, &query, today())?;
    emit(&transcript, &args.output)
}

pub fn run_reactions(args: ReactionsArgs) -> Result<()> {
    let locator = permalink::parse_message_url(&args.url)?;
    let client = connect()?;

    let options = ReactionOptions {
        filter: args.filter.as_deref(),
        use_email: args.email,
        merge: args.merge,
        summary: args.summary,
    };
    let listing = reaction_listing(&client, &locator, options)?;

    match &args.output {
        Some(path) => {
            write_listing(path, &listing)?;
            eprintln!("Saved reactions to {}", path.display());
        }
        None => print!("{}", listing),
    }
    Ok(())
}

fn write_listing(path: &Path, listing: &str) -> Result<()> {
    std::fs::write(path, listing).map_err(|e| AppError::WriteFile {
        path: path.display().to_string(),
        source: e,
    })
}

pub fn run_post(args: PostArgs) -> Result<()> {
    let client = connect()?;

    let target = match (&args.thread_url, &args.channel) {
        (Some(url), _) => thread_url_target(&client, url)?,
        (None, Some(channel)) => channel_target(channel, args.thread.as_deref())?,
        (None, None) => {
            return Err(AppError::InvalidArgument(
                "either --channel or --thread-url is required".to_string(),
            ));
        }
    };

    post(&client, &target, &args.message)?;
    if target.thread_ts.is_some() {
        println!("Posted thread reply: {}", args.message);
    } else {
        println!("Posted message: {}", args.message);
    }
    Ok(())
}

pub fn run_config(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Set {
            key: SetCommands::Token { token },
        } => {
            settings::validate_token(&token)?;
            let mut stored = Settings::load()?;
            stored.slack.token = token;
            let path = stored.save()?;
            println!("Token saved to {}", path.display());
        }
        ConfigCommands::Show => {
            let path = settings::config_path()?;
            let stored = Settings::load_from(&path)?;
            println!("Config file: {}", path.display());
            if stored.slack.token.is_empty() {
                println!("Slack token: (not set)");
            } else {
                println!("Slack token: {}", settings::mask_token(&stored.slack.token));
            }
        }
    }
    Ok(())
}
