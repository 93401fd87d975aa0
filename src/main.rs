use clap::Parser;
use slack_transcript::commands::{run_channel, run_config, run_get, run_post, run_reactions};
use slack_transcript::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: bool) {
    let default_level = if verbose {
        "slack_transcript=debug"
    } else {
        "slack_transcript=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let result = match cli.command {
        Commands::Get(args) => run_get(args),
        Commands::Channel(args) => run_channel(args),
        Commands::Reactions(args) => run_reactions(args),
        Commands::Post(args) => run_post(args),
        Commands::Config { command } => run_config(command),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
