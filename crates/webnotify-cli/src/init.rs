//! `webnotify init` — write a default config file.
//!
//! An existing file is never overwritten.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use webnotify_core::config::{save_config, Config};

use crate::helpers::{print_header, resolve_config_path};

/// Run the init command.
pub fn run(config_path: Option<&Path>) -> Result<()> {
    let config_path = resolve_config_path(config_path);

    print_header("Setup");

    if write_default_config(&config_path)? {
        println!(
            "  {} created config at {}",
            "✓".green(),
            config_path.display()
        );
        println!();
        println!(
            "{}",
            "  Fill in the notifier section, then run `webnotify status`.".green()
        );
    } else {
        println!(
            "  {} config already exists at {}",
            "✓".green(),
            config_path.display()
        );
    }
    println!();

    Ok(())
}

/// Returns `false` when the file already existed.
fn write_default_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    save_config(&Config::default(), Some(path))
        .with_context(|| format!("failed to write config: {}", path.display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        assert!(write_default_config(&path).unwrap());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"tgApiKey\""));
        assert!(content.contains("\"rateLimits\""));
    }

    #[test]
    fn keeps_existing_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{\"notifier\":{}}").unwrap();

        assert!(!write_default_config(&path).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"notifier\":{}}");
    }
}
