//! # ViewStore Core
//!
//! Record engine for ViewStore, a flat-file store of media-viewing events.
//!
//! This crate provides:
//! - A typed field [`Schema`] with pluggable [`FieldType`]s
//! - Parsing of delimited import files
//! - Upsert-merge writes keyed by a composite record ID
//! - Filtered, sorted and projected queries
//!
//! Storage framing (chunked line reading, atomic file replacement) lives in
//! `viewstore_storage`.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod datastore;
mod error;
mod import;
pub mod query;
mod record;
mod schema;

pub use config::{Config, CorruptLinePolicy};
pub use datastore::{Datastore, InsertStats};
pub use error::{CoreError, CoreResult};
pub use import::{parse_import, read_import_file};
pub use query::{FilterClause, OrderSpec, Query, MAX_ORDER_SPECS};
pub use record::{decode_line, encode_line, Record, RecordId, StoredRecord, ID_FIELD};
pub use schema::{
    BuiltinType, FieldDef, FieldType, OrderValue, Schema, SchemaBuilder, SortDirection,
    TypeRegistry,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
