//! Field types and the field schema.

mod definition;
mod registry;
mod types;

pub use definition::{FieldDef, Schema, SchemaBuilder};
pub use registry::TypeRegistry;
pub use types::{BuiltinType, FieldType, OrderValue, SortDirection};
