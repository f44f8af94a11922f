//! Error types for ViewStore core.

use std::io;
use std::path::PathBuf;
use thiserror::Error;
use viewstore_storage::StorageError;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in ViewStore core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage layer error.
    #[error("storage error: {0}")]
    Storage(StorageError),

    /// Record encoding error.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An import file or the store file does not exist.
    #[error("cannot locate file at path {}", path.display())]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// A field value failed its type's validity check.
    #[error("'{value}' is an invalid value for the '{field}' field")]
    Validation {
        /// Name of the offending field.
        field: String,
        /// The rejected raw value.
        value: String,
    },

    /// A record lacks one of the fields its composite ID is built from.
    #[error("record is missing key field '{field}'")]
    MissingKeyField {
        /// Name of the missing field.
        field: String,
    },

    /// A field name is not part of the schema.
    #[error("cannot find field definition for '{name}'")]
    UnknownField {
        /// The name that was looked up.
        name: String,
    },

    /// A field type name is not registered.
    #[error("unknown field type '{name}'")]
    UnknownType {
        /// The type name that was looked up.
        name: String,
    },

    /// Too many order specs in one query.
    #[error("cannot order by more than {max} fields, got {requested}")]
    OrderLimit {
        /// Number of order specs requested.
        requested: usize,
        /// Maximum supported.
        max: usize,
    },

    /// A sort direction other than `asc` or `desc`.
    #[error("invalid sort direction '{value}', expected 'asc' or 'desc'")]
    InvalidDirection {
        /// The rejected direction.
        value: String,
    },

    /// A line of the store file could not be decoded.
    #[error("corrupt record on line {line}: {message}")]
    CorruptRecord {
        /// One-based line number in the store file.
        line: u64,
        /// Description of the problem.
        message: String,
    },

    /// A line of an import file does not fit its header row.
    #[error("malformed import line {line}: {message}")]
    MalformedImport {
        /// One-based line number in the import file.
        line: u64,
        /// Description of the problem.
        message: String,
    },

    /// A schema definition is inconsistent.
    #[error("invalid schema: {message}")]
    InvalidSchema {
        /// Description of the problem.
        message: String,
    },
}

impl From<StorageError> for CoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { path } => Self::NotFound { path },
            other => Self::Storage(other),
        }
    }
}

impl CoreError {
    /// Creates a validation error.
    pub fn validation(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Creates an unknown field error.
    pub fn unknown_field(name: impl Into<String>) -> Self {
        Self::UnknownField { name: name.into() }
    }

    /// Creates a corrupt record error.
    pub fn corrupt_record(line: u64, message: impl Into<String>) -> Self {
        Self::CorruptRecord {
            line,
            message: message.into(),
        }
    }

    /// Creates a malformed import error.
    pub fn malformed_import(line: u64, message: impl Into<String>) -> Self {
        Self::MalformedImport {
            line,
            message: message.into(),
        }
    }

    /// Creates an invalid schema error.
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Self::InvalidSchema {
            message: message.into(),
        }
    }

    /// Returns true for errors that reject an import batch because of its
    /// contents.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::MissingKeyField { .. })
    }

    /// Returns true for errors caused by a name missing from the schema.
    #[must_use]
    pub fn is_schema_lookup(&self) -> bool {
        matches!(self, Self::UnknownField { .. } | Self::UnknownType { .. })
    }

    /// Returns true for I/O-class errors, including missing files.
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Io(_) | Self::NotFound { .. })
    }

    /// Returns true if a file the operation needed does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Storage(err) => err.is_not_found(),
            Self::Io(err) => err.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_names_field_and_value() {
        let err = CoreError::validation("DATE", "2014-4-1");
        assert_eq!(
            err.to_string(),
            "'2014-4-1' is an invalid value for the 'DATE' field"
        );
        assert!(err.is_validation());
        assert!(!err.is_schema_lookup());
    }

    #[test]
    fn storage_not_found_is_lifted() {
        let err: CoreError = StorageError::NotFound {
            path: PathBuf::from("data/datastore.psv"),
        }
        .into();
        assert!(matches!(err, CoreError::NotFound { .. }));
        assert!(err.is_not_found());
        assert!(err.is_io());
    }

    #[test]
    fn categories() {
        assert!(CoreError::unknown_field("GENRE").is_schema_lookup());
        assert!(CoreError::MissingKeyField { field: "STB".into() }.is_validation());
        assert!(!CoreError::OrderLimit { requested: 3, max: 2 }.is_io());
        assert!(CoreError::Io(io::Error::from(io::ErrorKind::NotFound)).is_not_found());
    }
}
