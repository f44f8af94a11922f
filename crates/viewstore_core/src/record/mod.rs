//! Records and their identifiers.

mod codec;
mod id;

pub use codec::{decode_line, encode_line};
pub use id::{RecordId, ID_FIELD};

/// An ordered mapping from field name to raw string value.
///
/// This is the shape produced by the import parser and accepted by
/// [`crate::Datastore::insert`]. Field order is preserved and is the order
/// fields are written to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty record with room for `capacity` fields.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Sets a field, keeping its position if it already exists.
    ///
    /// Returns the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.fields.push((name, value));
                None
            }
        }
    }

    /// Returns the value of a field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Iterates over `(name, value)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}

/// A record as held in the store: its fields plus the composite ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    /// Composite ID.
    pub id: RecordId,
    /// Field values.
    pub record: Record,
}

impl StoredRecord {
    /// Pairs a record with its ID.
    #[must_use]
    pub fn new(id: RecordId, record: Record) -> Self {
        Self { id, record }
    }

    /// Returns a field value, treating [`ID_FIELD`] as the composite ID.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&str> {
        if name == ID_FIELD {
            Some(self.id.as_str())
        } else {
            self.record.get(name)
        }
    }
}
