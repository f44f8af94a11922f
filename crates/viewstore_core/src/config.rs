//! Datastore configuration.

use viewstore_storage::DEFAULT_CHUNK_SIZE;

/// What to do with a store line that cannot be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorruptLinePolicy {
    /// Abort the operation with [`crate::CoreError::CorruptRecord`].
    #[default]
    Fail,
    /// Log a warning and leave the line out of the result.
    ///
    /// During an import the skipped line is also dropped from the rewritten
    /// store.
    Skip,
}

/// Configuration for a [`crate::Datastore`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Size of each read issued against import and store files.
    pub chunk_size: usize,

    /// Column delimiter of import files.
    pub delimiter: char,

    /// Separator placed between projected values in query rows.
    pub result_separator: String,

    /// Handling of undecodable store lines.
    pub corrupt_lines: CorruptLinePolicy,

    /// Whether to sync the rewritten store to disk before it replaces the old
    /// one.
    pub sync_on_write: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            delimiter: '|',
            result_separator: ",".to_string(),
            corrupt_lines: CorruptLinePolicy::Fail,
            sync_on_write: true,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the read chunk size.
    #[must_use]
    pub const fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Sets the import delimiter.
    #[must_use]
    pub const fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Sets the query row separator.
    #[must_use]
    pub fn result_separator(mut self, separator: impl Into<String>) -> Self {
        self.result_separator = separator.into();
        self
    }

    /// Sets the corrupt line policy.
    #[must_use]
    pub const fn corrupt_lines(mut self, policy: CorruptLinePolicy) -> Self {
        self.corrupt_lines = policy;
        self
    }

    /// Sets whether to sync on every store rewrite.
    #[must_use]
    pub const fn sync_on_write(mut self, value: bool) -> Self {
        self.sync_on_write = value;
        self
    }
}
