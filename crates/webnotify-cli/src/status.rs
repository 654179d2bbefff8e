//! `webnotify status` — show the config file and per-channel readiness.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use webnotify_core::config::{load_config, NotifierConfig};
use webnotify_core::utils::mask_secret;
use webnotify_core::ChannelKind;

use crate::helpers::{mark, print_header, resolve_config_path};

/// Run the status command.
pub fn run(config_path: Option<&Path>) -> Result<()> {
    let config_path = resolve_config_path(config_path);
    let config = load_config(Some(config_path.as_path()));
    let notifier = &config.notifier;

    print_header("Status");

    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        config_path.display(),
        if config_path.exists() {
            "✓".green().to_string()
        } else {
            "(not found, using defaults)".red().to_string()
        }
    );

    println!();
    println!("  {}", "Channels:".bold());
    for kind in ChannelKind::ALL {
        println!(
            "    {:<20} {}",
            kind.as_str(),
            mark(notifier.is_valid_for(kind), "not configured")
        );
        for (label, value) in channel_details(notifier, kind) {
            println!("      {:<18} {}", label.dimmed(), value);
        }
    }

    let limits = &config.rate_limits;
    println!();
    println!(
        "  {:<18} {}",
        "Rate limits:".bold(),
        format!(
            "global {}/{}s, per chat {}/{}s",
            limits.global_capacity,
            limits.global_per_second,
            limits.destination_capacity,
            limits.destination_per_second
        )
        .dimmed()
    );
    println!();

    Ok(())
}

/// Label/value rows for one channel. Secrets are masked.
fn channel_details(config: &NotifierConfig, kind: ChannelKind) -> Vec<(&'static str, String)> {
    match kind {
        ChannelKind::Telegram => vec![
            ("token", or_unset(mask_secret(&config.tg_api_key))),
            ("chat id", or_unset(config.tg_channel_id.clone())),
            ("api base", config.telegram_api_base().to_string()),
        ],
        ChannelKind::Email => vec![
            (
                "relay",
                if config.smtp_host.is_empty() {
                    or_unset(String::new())
                } else {
                    format!("{}:{}", config.smtp_host, config.smtp_port)
                },
            ),
            ("username", or_unset(config.smtp_username.clone())),
            ("password", or_unset(mask_secret(&config.smtp_password))),
            ("from", or_unset(config.from_email.clone())),
            ("to", or_unset(config.to_email.clone())),
        ],
    }
}

fn or_unset(value: String) -> String {
    if value.is_empty() {
        "-".to_string()
    } else {
        value
    }
}
