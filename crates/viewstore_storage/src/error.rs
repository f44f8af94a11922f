//! Error types for storage operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The requested file does not exist.
    #[error("file not found: {}", path.display())]
    NotFound {
        /// The path that could not be opened.
        path: PathBuf,
    },

    /// A line was not valid UTF-8.
    #[error("line {line} is not valid UTF-8")]
    InvalidUtf8 {
        /// One-based line number within the file.
        line: u64,
    },
}

impl StorageError {
    /// Maps an I/O error to [`StorageError::NotFound`] when it reports a
    /// missing file, keeping every other error as [`StorageError::Io`].
    pub fn from_open(err: io::Error, path: impl Into<PathBuf>) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            Self::NotFound { path: path.into() }
        } else {
            Self::Io(err)
        }
    }

    /// Returns true if this error reports a missing file.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Io(err) => err.kind() == io::ErrorKind::NotFound,
            Self::InvalidUtf8 { .. } => false,
        }
    }
}
