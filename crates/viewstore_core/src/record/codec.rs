//! Store line encoding.
//!
//! Each stored record is one JSON object on its own line. Keys appear in
//! record field order with `id` last, for example:
//!
//! ```text
//! {"STB":"stb1","TITLE":"the matrix","DATE":"2014-04-01","id":"stb1thematrix20140401"}
//! ```

use super::{Record, RecordId, StoredRecord, ID_FIELD};
use crate::error::{CoreError, CoreResult};
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

impl Serialize for StoredRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.record.len() + 1))?;
        for (name, value) in self.record.iter() {
            map.serialize_entry(name, value)?;
        }
        map.serialize_entry(ID_FIELD, self.id.as_str())?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for StoredRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(StoredRecordVisitor)
    }
}

struct StoredRecordVisitor;

impl<'de> Visitor<'de> for StoredRecordVisitor {
    type Value = StoredRecord;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object of string fields with an `id`")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut record = Record::with_capacity(access.size_hint().unwrap_or(0));
        let mut id = None;

        while let Some((name, value)) = access.next_entry::<String, String>()? {
            if name == ID_FIELD {
                id = Some(RecordId::from_raw(value));
            } else {
                record.insert(name, value);
            }
        }

        let id = id.ok_or_else(|| de::Error::missing_field(ID_FIELD))?;
        Ok(StoredRecord { id, record })
    }
}

/// Encodes a record as a single store line, without terminator.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode_line(record: &StoredRecord) -> CoreResult<String> {
    Ok(serde_json::to_string(record)?)
}

/// Decodes one store line.
///
/// # Errors
///
/// Returns [`CoreError::CorruptRecord`] if the line is not a JSON object of
/// string values with an `id`.
pub fn decode_line(line_no: u64, text: &str) -> CoreResult<StoredRecord> {
    serde_json::from_str(text).map_err(|e| CoreError::corrupt_record(line_no, e.to_string()))
}
