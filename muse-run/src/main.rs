//! muse-run - Generate and publish one post per configured topic
//!
//! Builds the pipeline from configuration, walks the topic list once with
//! the pacing interval between topics, prints a summary and exits.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use libmusecast::logging::{LogFormat, LoggingConfig};
use libmusecast::setup::{self, PipelineOptions};
use libmusecast::{Config, Credentials, Result};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "muse-run")]
#[command(version)]
#[command(about = "Generate and publish one post per configured topic")]
#[command(long_about = "\
muse-run - Generate and publish one post per configured topic

DESCRIPTION:
    muse-run writes a short post for every topic in the configured list,
    in the voice of the configured persona, illustrates it with a
    generated image when the image backend allows, and publishes it to a
    Mastodon-compatible account.

    Topics are processed one at a time. A failure on one topic (text,
    image, upload or publish) is logged and the run moves on to the next
    topic after the pacing interval.

USAGE:
    # Run over the configured topics
    muse-run

    # Try it out without posting anything
    muse-run --dry-run --topic \"Edge AI\" --pacing 0s

    # Use another configuration file
    muse-run --config ./persona.toml

CREDENTIALS (environment):
    TEXT_API_KEY          Text generation key (required)
    IMAGE_API_KEY         Image generation key (defaults to TEXT_API_KEY
                          for the gemini backend)
    SOCIAL_ACCESS_TOKEN   Mastodon access token (not needed with --dry-run)
    SOCIAL_INSTANCE_URL   Mastodon instance URL (not needed with --dry-run)

CONFIGURATION:
    Configuration file: ~/.config/musecast/config.toml
    (or the path in MUSECAST_CONFIG)

    [schedule]
    pacing_interval = \"30s\"

    [image]
    backend = \"gemini\"  # gemini, stability or none

EXIT CODES:
    0 - Run completed (individual topics may still have been skipped)
    1 - Runtime error
    2 - Configuration or initialization error
")]
struct Cli {
    /// Configuration file (overrides MUSECAST_CONFIG)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Topic to post about; repeat to replace the configured list
    #[arg(short, long = "topic", value_name = "TOPIC")]
    topics: Vec<String>,

    /// Wait between topics, e.g. "30s" or "2m" (overrides config)
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    pacing: Option<Duration>,

    /// Log what would be posted instead of posting
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Log output format: text, json or pretty
    #[arg(long, value_name = "FORMAT")]
    log_format: Option<LogFormat>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(&cli);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

fn init_logging(cli: &Cli) {
    LoggingConfig::from_env(cli.verbose)
        .with_format_override(cli.log_format)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };

    let topics = if cli.topics.is_empty() {
        config.topics.clone()
    } else {
        cli.topics.clone()
    };

    let options = PipelineOptions {
        dry_run: cli.dry_run,
        pacing_interval: cli.pacing,
    };
    let pipeline = setup::create_pipeline(&config, &Credentials::from_env(), &options).await?;

    info!("muse-run starting with {} topic(s)", topics.len());
    let summary = pipeline.run(&topics).await;

    println!("{}", summary);
    Ok(())
}
