//! Error kinds shared by the catalogs and the dispatcher.
//!
//! Catalog operations return [`CatalogError`] so callers can match on the
//! kind of failure (an unknown overlay is routine, a broken manifest is not).
//! [`Fatal`] covers the two conditions that stop a layman run outright.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a catalog read, lookup or mutation.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The requested name is not a key of the catalog.
    #[error("Overlay \"{0}\" does not exist.")]
    UnknownOverlay(String),

    /// `add` was called for an overlay that is already installed.
    #[error("Overlay \"{0}\" is already installed.")]
    AlreadyInstalled(String),

    /// The working copy location is already occupied.
    #[error("Target directory {} already exists and is not empty.", .0.display())]
    TargetExists(PathBuf),

    /// A catalog document violates the record invariants.
    #[error("Invalid overlay list {origin}: {message}")]
    Invalid { origin: String, message: String },

    /// A catalog document could not be parsed or rendered.
    #[error("Failed to parse overlay list {origin}: {message}")]
    Parse { origin: String, message: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Retrieving a remote document failed.
    #[error("Failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    /// An external tool could not be spawned or exited unsuccessfully.
    #[error("Command `{command}` failed: {message}")]
    Tool { command: String, message: String },
}

impl CatalogError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CatalogError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Conditions that terminate the run before the remaining actions execute.
#[derive(Error, Debug)]
pub enum Fatal {
    #[error("Failed to fetch overlay list!\nError was: {0}")]
    Fetch(#[source] CatalogError),

    #[error("Failed setting to umask \"{umask}\"!\nError was: {message}")]
    Umask { umask: String, message: String },
}
