//! Composite record identifier.

use std::fmt;

/// Name of the synthetic field holding a record's composite ID.
pub const ID_FIELD: &str = "id";

/// Composite identifier of a record.
///
/// Built by concatenating the record's key field values and dropping every
/// whitespace and `-` character, so `stb1` / `the matrix` / `2014-04-01`
/// becomes `stb1thematrix20140401`. Two records with the same ID are the
/// same logical entity.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(String);

impl RecordId {
    /// Builds an ID from key field values, in key order.
    pub fn from_parts<'a>(parts: impl IntoIterator<Item = &'a str>) -> Self {
        let id = parts
            .into_iter()
            .flat_map(|part| part.chars())
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect();
        Self(id)
    }

    /// Wraps an already computed ID string.
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}
