//! Error types for the disk check.
//!
//! Configuration problems are raised at setup. Everything else is a
//! pass-level failure: the pass aborts and nothing is emitted for it.

use std::path::PathBuf;

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Disk check only supports one configured instance (got {0})")]
    TooManyInstances(usize),

    #[error("Invalid excluded disk regex '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to spawn '{program}': {source}")]
    CommandSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("statvfs failed for {mountpoint}: {source}")]
    Stat {
        mountpoint: String,
        #[source]
        source: nix::Error,
    },

    #[error("{0} is not available on this platform")]
    Unsupported(&'static str),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
