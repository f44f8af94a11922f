//! Field schema: names, types and the composite key.

use super::registry::TypeRegistry;
use super::types::{BuiltinType, FieldType, OrderValue, SortDirection};
use crate::error::{CoreError, CoreResult};
use crate::record::{Record, RecordId, ID_FIELD};
use std::cmp::Ordering;
use std::sync::Arc;

/// Definition of a single field.
#[derive(Debug, Clone)]
pub struct FieldDef {
    name: String,
    description: String,
    field_type: Arc<dyn FieldType>,
}

impl FieldDef {
    /// Creates a field definition.
    pub fn new(
        name: impl Into<String>,
        field_type: Arc<dyn FieldType>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            field_type,
        }
    }

    /// Canonical field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The field's type.
    #[must_use]
    pub fn field_type(&self) -> &dyn FieldType {
        self.field_type.as_ref()
    }
}

/// The closed set of fields a store accepts.
///
/// A schema is immutable once built and is shared by the import and query
/// paths of a [`crate::Datastore`]. Field names are case-sensitive here;
/// [`Schema::canonical_name`] maps user input onto them.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<FieldDef>,
    key_fields: Vec<String>,
}

impl Schema {
    /// Starts building a schema whose field types resolve through `registry`.
    #[must_use]
    pub fn builder(registry: TypeRegistry) -> SchemaBuilder {
        SchemaBuilder::new(registry)
    }

    /// The media-viewing event schema.
    ///
    /// | Field       | Type   |
    /// |-------------|--------|
    /// | `STB`       | TEXT64 |
    /// | `TITLE`     | TEXT64 |
    /// | `PROVIDER`  | TEXT64 |
    /// | `DATE`      | DATE   |
    /// | `REV`       | PRICE  |
    /// | `VIEW_TIME` | TIME   |
    ///
    /// Records are keyed by `STB`, `TITLE` and `DATE`.
    #[must_use]
    pub fn media_views() -> Self {
        let def = |name: &str, ty: BuiltinType, description: &str| {
            FieldDef::new(name, Arc::new(ty), description)
        };

        Self {
            fields: vec![
                def(
                    "STB",
                    BuiltinType::Text64,
                    "The set top box id on which the media asset was viewed.",
                ),
                def("TITLE", BuiltinType::Text64, "The title of the media asset."),
                def(
                    "PROVIDER",
                    BuiltinType::Text64,
                    "The distributor of the media asset.",
                ),
                def(
                    "DATE",
                    BuiltinType::Date,
                    "The local date on which the content was leased through the STB.",
                ),
                def(
                    "REV",
                    BuiltinType::Price,
                    "The price incurred by the STB to lease the asset.",
                ),
                def(
                    "VIEW_TIME",
                    BuiltinType::Time,
                    "The amount of time the STB played the asset.",
                ),
            ],
            key_fields: vec!["STB".into(), "TITLE".into(), "DATE".into()],
        }
    }

    /// Fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(FieldDef::name)
    }

    /// Fields the composite ID is built from, in order.
    #[must_use]
    pub fn key_fields(&self) -> &[String] {
        &self.key_fields
    }

    /// Looks up a field definition.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownField`] if the schema has no such field.
    pub fn field(&self, name: &str) -> CoreResult<&FieldDef> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| CoreError::unknown_field(name))
    }

    /// Returns true if the schema declares `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Resolves `name` case-insensitively to its canonical spelling.
    ///
    /// The synthetic [`ID_FIELD`] is recognised as well.
    #[must_use]
    pub fn canonical_name(&self, name: &str) -> Option<&str> {
        if name.eq_ignore_ascii_case(ID_FIELD) {
            return Some(ID_FIELD);
        }
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .map(FieldDef::name)
    }

    /// Validates one value against its field's type.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownField`] for undeclared fields and
    /// [`CoreError::Validation`] for rejected values.
    pub fn validate(&self, name: &str, raw: &str) -> CoreResult<()> {
        let field = self.field(name)?;
        if field.field_type.is_valid(raw) {
            Ok(())
        } else {
            Err(CoreError::validation(name, raw))
        }
    }

    /// Validates every field of a record and checks all key fields are set.
    ///
    /// # Errors
    ///
    /// Returns the first failure found.
    pub fn validate_record(&self, record: &Record) -> CoreResult<()> {
        for (name, value) in record.iter() {
            self.validate(name, value)?;
        }
        for key in &self.key_fields {
            if record.get(key).is_none() {
                return Err(CoreError::MissingKeyField { field: key.clone() });
            }
        }
        Ok(())
    }

    /// Computes a record's composite ID.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingKeyField`] if a key field is absent.
    pub fn record_id(&self, record: &Record) -> CoreResult<RecordId> {
        let parts = self
            .key_fields
            .iter()
            .map(|key| {
                record
                    .get(key)
                    .ok_or_else(|| CoreError::MissingKeyField { field: key.clone() })
            })
            .collect::<CoreResult<Vec<_>>>()?;
        Ok(RecordId::from_parts(parts))
    }

    /// Parses a raw value into its field's ordering value.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownField`] for undeclared fields.
    pub fn order_value(&self, name: &str, raw: &str) -> CoreResult<Option<OrderValue>> {
        Ok(self.field(name)?.field_type.order_value(raw))
    }

    /// Returns a comparator ordering records by one field.
    ///
    /// Records lacking the field sort before records that have it.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownField`] for undeclared fields.
    pub fn comparator<'a>(
        &'a self,
        name: &'a str,
        direction: SortDirection,
    ) -> CoreResult<impl Fn(&Record, &Record) -> Ordering + 'a> {
        let field_type = self.field(name)?.field_type();
        Ok(move |a: &Record, b: &Record| {
            let ordering = match (a.get(name), b.get(name)) {
                (Some(a), Some(b)) => field_type.compare(a, b),
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
            };
            direction.apply(ordering)
        })
    }
}

/// Builder for custom schemas.
///
/// ```rust
/// use viewstore_core::{Schema, TypeRegistry};
///
/// let schema = Schema::builder(TypeRegistry::default())
///     .field("DEVICE", "TEXT64", "Playback device")
///     .field("DAY", "DATE", "Day of playback")
///     .field("WATCHED", "TIME", "Time watched")
///     .key(["DEVICE", "DAY"])
///     .build()
///     .unwrap();
///
/// assert_eq!(schema.key_fields(), ["DEVICE", "DAY"]);
/// ```
#[derive(Debug)]
pub struct SchemaBuilder {
    registry: TypeRegistry,
    fields: Vec<(String, String, String)>,
    key_fields: Vec<String>,
}

impl SchemaBuilder {
    fn new(registry: TypeRegistry) -> Self {
        Self {
            registry,
            fields: Vec::new(),
            key_fields: Vec::new(),
        }
    }

    /// Declares a field of the named type.
    #[must_use]
    pub fn field(
        mut self,
        name: impl Into<String>,
        type_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.fields
            .push((name.into(), type_name.into(), description.into()));
        self
    }

    /// Sets the fields the composite ID is built from.
    #[must_use]
    pub fn key<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Resolves all types and checks the definition.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownType`] for unregistered types and
    /// [`CoreError::InvalidSchema`] for duplicate or reserved names, an empty
    /// key, or key fields that are not declared.
    pub fn build(self) -> CoreResult<Schema> {
        let mut fields: Vec<FieldDef> = Vec::with_capacity(self.fields.len());

        for (name, type_name, description) in self.fields {
            if name.eq_ignore_ascii_case(ID_FIELD) {
                return Err(CoreError::invalid_schema(format!(
                    "'{name}' is reserved for the composite ID"
                )));
            }
            if fields.iter().any(|f| f.name.eq_ignore_ascii_case(&name)) {
                return Err(CoreError::invalid_schema(format!(
                    "field '{name}' declared twice"
                )));
            }
            let field_type = self.registry.get(&type_name)?;
            fields.push(FieldDef::new(name, field_type, description));
        }

        if self.key_fields.is_empty() {
            return Err(CoreError::invalid_schema("composite key has no fields"));
        }
        for key in &self.key_fields {
            if !fields.iter().any(|f| &f.name == key) {
                return Err(CoreError::invalid_schema(format!(
                    "key field '{key}' is not declared"
                )));
            }
        }

        Ok(Schema {
            fields,
            key_fields: self.key_fields,
        })
    }
}
