//! webnotify CLI — entry point.
//!
//! # Commands
//!
//! - `webnotify send -m MESSAGE [-c CHANNEL]...` — fan a message out once
//! - `webnotify status` — show which channels are configured
//! - `webnotify init` — write a default config file

mod helpers;
mod init;
mod send;
mod status;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use webnotify_core::ChannelKind;

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// 📣 webnotify — send one message to Telegram and email
#[derive(Parser)]
#[command(name = "webnotify", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a notification through the configured channels
    Send {
        /// Message text
        #[arg(short, long)]
        message: String,

        /// Channel to use (repeatable; default: every configured channel)
        #[arg(short, long = "channel")]
        channels: Vec<ChannelKind>,

        /// Give up after this many seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Config file (default: ~/.webnotify/config.json)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Show configured channels
    Status {
        /// Config file (default: ~/.webnotify/config.json)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Write a default config file if none exists
    Init {
        /// Config file (default: ~/.webnotify/config.json)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Send {
            message,
            channels,
            timeout,
            config,
            logs,
        } => {
            init_logging(logs);
            send::run(send::SendArgs {
                message,
                channels,
                timeout,
                config,
            })
            .await
        }
        Commands::Status { config } => {
            init_logging(false);
            status::run(config.as_deref())
        }
        Commands::Init { config } => {
            init_logging(false);
            init::run(config.as_deref())
        }
    }
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("webnotify=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
