//! Path utilities

use std::path::PathBuf;

/// Data directory (~/.monitask); falls back to the working directory
/// when no home is known
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".monitask")
}

pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}

/// Optional extra system prompt instructions
pub fn prompt_path() -> PathBuf {
    data_dir().join("PROMPT.md")
}

/// Session snapshot storage
pub fn sessions_dir() -> PathBuf {
    data_dir().join("sessions")
}

/// Expand a leading `~`
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Sanitize a session key for use as a filename
pub fn safe_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            _ => c,
        })
        .collect()
}
