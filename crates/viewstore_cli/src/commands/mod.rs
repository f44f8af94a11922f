//! CLI command implementations.

pub mod dropdata;
pub mod import;
pub mod query;

use viewstore_core::Schema;

/// Maps a user-supplied field name onto the schema's spelling.
///
/// Names the schema does not know are upper-cased and passed on, so the
/// engine reports them.
pub fn canonical_field(schema: &Schema, name: &str) -> String {
    let name = name.trim();
    schema
        .canonical_name(name)
        .map_or_else(|| name.to_uppercase(), str::to_string)
}
