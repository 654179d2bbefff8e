//! Utility helpers — path resolution and log-safe string shortening.

use std::path::PathBuf;

fn home_dir() -> PathBuf {
    dirs_next::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Get the webnotify data directory (e.g. `~/.webnotify/`).
pub fn get_data_path() -> PathBuf {
    home_dir().join(".webnotify")
}

/// Expand a leading `~` (alone or followed by `/`) to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix('~') {
        Some("") => home_dir(),
        Some(rest) if rest.starts_with('/') => home_dir().join(&rest[1..]),
        _ => PathBuf::from(path),
    }
}

/// Truncate a string to `max_len` characters, adding "..." if truncated.
/// Unicode-safe.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

/// Show only the first few characters of a credential.
pub fn mask_secret(secret: &str) -> String {
    const VISIBLE: usize = 4;
    if secret.is_empty() {
        return String::new();
    }
    let count = secret.chars().count();
    if count <= VISIBLE * 2 {
        return "*".repeat(count);
    }
    let head: String = secret.chars().take(VISIBLE).collect();
    format!("{}...", head)
}
