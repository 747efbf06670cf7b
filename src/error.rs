//! Error kinds surfaced by a packaging run.
//!
//! Every failure is terminal for the run. Skipped sources (excluded,
//! directories, the run's own temp tree) are not errors and never show up
//! here; see [`crate::plan::SkipReason`].

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Invalid declarations: missing source/destination, bad glob, bad config file.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Directory creation, deletion, file copy or write failure.
    #[error("failed to {action} '{}': {source}", path.display())]
    Filesystem {
        action: &'static str,
        path: PathBuf,
        source: io::Error,
    },

    /// A staged file is missing, differs from its source, or was never planned.
    #[error("staged file '{}' does not match the staging manifest", path.display())]
    Verification { path: PathBuf },

    /// The packaging tool could not be found, spawned, or exited non-zero.
    #[error("{tool} failed: {message}")]
    PackagingTool { tool: String, message: String },

    /// The artifact reported by a successful tool run is missing or uncopyable.
    #[error("cannot relocate artifact '{}': {source}", path.display())]
    ArtifactRelocation { path: PathBuf, source: io::Error },
}

impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    pub(crate) fn fs(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Filesystem {
            action,
            path: path.into(),
            source,
        }
    }
}
