//! muse-reply - Reply to a message in the persona's voice
//!
//! Prints exactly one reply on stdout. Once a message has been read, the
//! user always gets a reply: provider and setup failures are logged and
//! answered with the fallback acknowledgment.

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use libmusecast::logging::{LogFormat, LoggingConfig};
use libmusecast::{setup, Config, Credentials, InteractiveResponder, FALLBACK_REPLY};
use tracing::error;

#[derive(Parser, Debug)]
#[command(name = "muse-reply")]
#[command(version)]
#[command(about = "Reply to a message in the persona's voice")]
#[command(long_about = "\
muse-reply - Reply to a message in the persona's voice

DESCRIPTION:
    muse-reply asks the text provider for a short reply to one message,
    written as the configured persona, and prints it to stdout.

    If the provider cannot be reached, a fixed acknowledgment is printed
    instead. Diagnostics go to stderr.

USAGE:
    # Reply to an argument
    muse-reply \"What do you think about edge AI?\"

    # Reply to stdin
    echo \"hi\" | muse-reply

CREDENTIALS (environment):
    TEXT_API_KEY   Text generation key

EXIT CODES:
    0 - A reply was printed
    1 - No message could be read
")]
struct Cli {
    /// Message to reply to (reads from stdin if not provided)
    message: Option<String>,

    /// Configuration file (overrides MUSECAST_CONFIG)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

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

    LoggingConfig::from_env(cli.verbose)
        .with_format_override(cli.log_format)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let message = read_message(cli.message)?;

    let reply = match build_responder(cli.config) {
        Ok(responder) => responder.respond(&message).await,
        Err(e) => {
            error!("Cannot reach the text provider: {}", e);
            FALLBACK_REPLY.to_string()
        }
    };

    println!("{}", reply);
    Ok(())
}

fn build_responder(config_path: Option<PathBuf>) -> libmusecast::Result<InteractiveResponder> {
    let config = match config_path {
        Some(path) => Config::load_from_path(&path)?,
        None => Config::load()?,
    };
    setup::create_responder(&config, &Credentials::from_env())
}

fn read_message(arg: Option<String>) -> anyhow::Result<String> {
    let message = match arg {
        Some(message) => message,
        None => {
            if io::stdin().is_terminal() {
                bail!("No message provided. Pass it as an argument or pipe it on stdin");
            }
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read message from stdin")?;
            buffer
        }
    };

    let message = message.trim().to_string();
    if message.is_empty() {
        bail!("Message is empty");
    }
    Ok(message)
}
