use std::path::{Path, PathBuf};
use crate::error::{CatalogError, CatalogResult};

/// Fallback when the terminal width cannot be detected.
pub const DEFAULT_WIDTH: usize = 80;

/// Ensures the given directory exists, creating parents as needed.
///
/// Returns the path to the directory.
pub fn ensure_dir<P: AsRef<Path>>(path: P) -> CatalogResult<PathBuf> {
    let path = path.as_ref();
    std::fs::create_dir_all(path).map_err(|e| CatalogError::io(path, e))?;
    Ok(path.to_path_buf())
}

/// Removes `path` if it is an empty directory.
///
/// Used to clean up after failed or partial installs. Every failure is
/// swallowed; a missing or non-empty directory is left alone.
pub fn delete_empty_directory<P: AsRef<Path>>(path: P) {
    let path = path.as_ref();
    if !path.is_dir() {
        return;
    }
    let empty = std::fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false);
    if !empty {
        log::debug!("Not removing non-empty directory {}", path.display());
        return;
    }
    match std::fs::remove_dir(path) {
        Ok(()) => log::debug!("Removed empty directory {}", path.display()),
        Err(e) => log::debug!("Could not remove {}: {}", path.display(), e),
    }
}

/// Pads `text` with spaces to exactly `length` characters.
///
/// Longer text is cut and terminated by `...`.
pub fn pad(text: &str, length: usize) -> String {
    let count = text.chars().count();
    if count <= length {
        return format!("{}{}", text, " ".repeat(length - count));
    }
    if length < 3 {
        return text.chars().take(length).collect();
    }
    let mut cut: String = text.chars().take(length - 3).collect();
    cut.push_str("...");
    cut
}

/// Returns the width of the attached terminal, or [`DEFAULT_WIDTH`].
pub fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(terminal_size::Width(width), _)| usize::from(width))
        .unwrap_or(DEFAULT_WIDTH)
}

/// Strips a `file://` prefix, returning the local path if `url` names one.
pub fn local_path(url: &str) -> Option<PathBuf> {
    if let Some(path) = url.strip_prefix("file://") {
        return Some(PathBuf::from(path));
    }
    if url.contains("://") {
        return None;
    }
    Some(PathBuf::from(url))
}
