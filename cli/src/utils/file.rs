//! Path helpers for config file arguments

use std::path::PathBuf;

/// Resolve a user-supplied path to an absolute one.
///
/// A leading `~` or `~/` is replaced with the home directory and relative
/// paths are joined onto the current directory. Surrounding whitespace is
/// ignored; an empty string resolves to the current directory.
pub fn expand_path(path: &str) -> PathBuf {
    let path = path.trim();

    let expanded = match path {
        "" => PathBuf::from("."),
        "~" => dirs::home_dir().unwrap_or_else(|| PathBuf::from(path)),
        _ => match (path.strip_prefix("~/"), dirs::home_dir()) {
            (Some(rest), Some(home)) => home.join(rest),
            _ => PathBuf::from(path),
        },
    };

    if expanded.is_absolute() {
        return expanded;
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(&expanded))
        .unwrap_or(expanded)
}
