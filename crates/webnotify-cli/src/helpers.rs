//! Shared CLI helpers — config path resolution and status marks.

use std::path::{Path, PathBuf};

use colored::Colorize;

use webnotify_core::config::get_config_path;
use webnotify_core::utils::expand_home;

/// Resolve `--config`, expanding a leading `~`. Falls back to
/// `~/.webnotify/config.json`.
pub fn resolve_config_path(path: Option<&Path>) -> PathBuf {
    match path {
        Some(p) => expand_home(&p.to_string_lossy()),
        None => get_config_path(),
    }
}

/// Section header used by `status` and `init`.
pub fn print_header(title: &str) {
    println!();
    println!("{}", format!("📣 webnotify {}", title).cyan().bold());
    println!();
}

/// `✓` in green or a dimmed placeholder.
pub fn mark(ok: bool, missing: &str) -> String {
    if ok {
        "✓".green().to_string()
    } else {
        format!("· {}", missing).dimmed().to_string()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
