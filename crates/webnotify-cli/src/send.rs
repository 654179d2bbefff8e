//! `webnotify send` — build a dispatcher from config and fan one message out.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use colored::Colorize;
use tracing::{debug, info};

use webnotify_channels::Dispatcher;
use webnotify_core::config::{load_config, Config};
use webnotify_core::{ChannelKind, Context};

use crate::helpers::resolve_config_path;

pub struct SendArgs {
    pub message: String,
    pub channels: Vec<ChannelKind>,
    pub timeout: Option<u64>,
    pub config: Option<PathBuf>,
}

/// Run the send command.
pub async fn run(args: SendArgs) -> Result<()> {
    let config_path = resolve_config_path(args.config.as_deref());
    let config = load_config(Some(config_path.as_path()));

    let dispatcher = build_dispatcher(config, &args.channels);
    if dispatcher.is_empty() {
        bail!(
            "no channel is configured (config: {}); run `webnotify status`",
            config_path.display()
        );
    }
    info!(channels = ?dispatcher.channel_names(), "dispatching notification");

    let ctx = send_context(args.timeout);

    let interrupt = ctx.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("interrupt received, cancelling");
            interrupt.cancel();
        }
    });

    let result = dispatcher.notify_with_context(&ctx, &args.message).await;
    watcher.abort();

    match result {
        Ok(()) => {
            println!(
                "{} sent via {}",
                "✓".green(),
                dispatcher.channel_names().join(", ")
            );
            Ok(())
        }
        Err(aggregate) => {
            for e in aggregate.errors() {
                eprintln!("{} {}", "✗".red(), e);
            }
            Err(aggregate.into())
        }
    }
}

/// `--timeout` in seconds; absent means wait as long as it takes.
fn send_context(timeout: Option<u64>) -> Context {
    match timeout {
        Some(secs) => Context::with_timeout(Duration::from_secs(secs)),
        None => Context::background(),
    }
}

/// Requested kinds, or every kind when none were given.
fn build_dispatcher(config: Config, requested: &[ChannelKind]) -> Dispatcher {
    let kinds: &[ChannelKind] = if requested.is_empty() {
        &ChannelKind::ALL
    } else {
        requested
    };
    Dispatcher::build_with_limits(config.notifier, kinds, &config.rate_limits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use webnotify_core::NotifierConfig;

    fn telegram_only() -> Config {
        Config {
            notifier: NotifierConfig {
                tg_api_key: "123:abc".into(),
                tg_channel_id: "-100".into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn no_channels_requested_means_all() {
        let dispatcher = build_dispatcher(telegram_only(), &[]);
        assert_eq!(dispatcher.kinds(), vec![ChannelKind::Telegram]);
    }

    #[test]
    fn requested_unconfigured_channel_is_skipped() {
        let dispatcher = build_dispatcher(telegram_only(), &[ChannelKind::Email]);
        assert!(dispatcher.is_empty());
    }

    #[test]
    fn rate_limits_come_from_config() {
        let mut config = telegram_only();
        config.rate_limits.global_capacity = 7;
        let dispatcher = build_dispatcher(config, &[]);
        assert_eq!(dispatcher.rate_limiter().global().capacity(), 7);
    }

    #[tokio::test]
    async fn timeout_sets_deadline() {
        assert!(send_context(None).deadline().is_none());
        assert!(send_context(Some(5)).deadline().is_some());
        // Too far out to represent: no deadline rather than a panic.
        assert!(send_context(Some(u64::MAX)).deadline().is_none());
    }

    #[tokio::test]
    async fn empty_config_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(SendArgs {
            message: "hello".into(),
            channels: vec![],
            timeout: None,
            config: Some(dir.path().join("missing.json")),
        })
        .await
        .unwrap_err();
        assert!(err.to_string().contains("no channel is configured"));
    }
}
