//! Channel identifiers shared by the config, the senders and the CLI.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which sender implementation to instantiate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// Telegram Bot API (`sendMessage`), rate limited.
    Telegram,
    /// SMTP submission to a mail relay.
    Email,
}

impl ChannelKind {
    /// Every supported kind, in the default fan-out order.
    pub const ALL: [ChannelKind; 2] = [ChannelKind::Telegram, ChannelKind::Email];

    /// Lowercase name used in config, logs and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Telegram => "telegram",
            ChannelKind::Email => "email",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "telegram" | "tg" => Ok(ChannelKind::Telegram),
            "email" | "mail" | "smtp" => Ok(ChannelKind::Email),
            other => Err(format!(
                "unknown channel '{}' (expected 'telegram' or 'email')",
                other
            )),
        }
    }
}
