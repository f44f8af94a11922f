//! Query description: filter, order and projection.
//!
//! A [`Query`] is evaluated by [`crate::Datastore::query`] in three steps:
//!
//! 1. **Filter**: every [`FilterClause`] must match on exact string equality
//! 2. **Sort**: by zero, one or two [`OrderSpec`]s (see [`sort`])
//! 3. **Project**: selected fields joined by the result separator
//!
//! Field names are expected in canonical schema casing; use
//! [`crate::Schema::canonical_name`] to normalise user input first.

pub mod sort;

use crate::error::{CoreError, CoreResult};
use crate::record::{StoredRecord, ID_FIELD};
use crate::schema::{Schema, SortDirection};
use std::fmt;
use std::str::FromStr;

/// Maximum number of order specs in one query.
pub const MAX_ORDER_SPECS: usize = 2;

/// Sort key: a field and a direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSpec {
    /// Field to sort by.
    pub field: String,
    /// Sort direction.
    pub direction: SortDirection,
}

impl OrderSpec {
    /// Creates an order spec.
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Ascending order by `field`.
    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Asc)
    }

    /// Descending order by `field`.
    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Desc)
    }
}

impl FromStr for OrderSpec {
    type Err = CoreError;

    /// Parses `field` or `field:direction`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, direction) = match s.split_once(':') {
            Some((field, direction)) => (field, direction.parse()?),
            None => (s, SortDirection::Asc),
        };
        if field.is_empty() {
            return Err(CoreError::unknown_field(field));
        }
        Ok(Self::new(field, direction))
    }
}

impl fmt::Display for OrderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.direction)
    }
}

/// Equality filter on one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterClause {
    /// Field to compare.
    pub field: String,
    /// Required value.
    pub value: String,
}

impl FilterClause {
    /// Creates a filter clause.
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Returns true if the record's value equals the clause value.
    #[must_use]
    pub fn matches(&self, record: &StoredRecord) -> bool {
        record.value(&self.field) == Some(self.value.as_str())
    }
}

/// A query against a datastore.
///
/// ```rust
/// use viewstore_core::{OrderSpec, Query};
///
/// let query = Query::new()
///     .select(["TITLE", "DATE"])
///     .order_by(OrderSpec::asc("DATE"))
///     .order_by(OrderSpec::desc("TITLE"))
///     .filter("PROVIDER", "warner bros");
/// assert_eq!(query.order.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    /// Fields to emit, in order. Empty means every schema field plus `id`.
    pub select: Vec<String>,
    /// Sort keys, outermost first.
    pub order: Vec<OrderSpec>,
    /// Conjunctive equality filters.
    pub filters: Vec<FilterClause>,
}

impl Query {
    /// Creates a query returning everything, unordered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the projected fields.
    #[must_use]
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Adds a sort key.
    #[must_use]
    pub fn order_by(mut self, spec: OrderSpec) -> Self {
        self.order.push(spec);
        self
    }

    /// Adds an equality filter.
    #[must_use]
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(FilterClause::new(field, value));
        self
    }

    /// Checks the query against a schema before any data is read.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::OrderLimit`] for more than
    /// [`MAX_ORDER_SPECS`] order specs and [`CoreError::UnknownField`] for
    /// order or filter fields missing from the schema.
    pub fn check(&self, schema: &Schema) -> CoreResult<()> {
        if self.order.len() > MAX_ORDER_SPECS {
            return Err(CoreError::OrderLimit {
                requested: self.order.len(),
                max: MAX_ORDER_SPECS,
            });
        }
        for spec in &self.order {
            schema.field(&spec.field)?;
        }
        for clause in &self.filters {
            if clause.field != ID_FIELD {
                schema.field(&clause.field)?;
            }
        }
        Ok(())
    }

    /// Returns true if the record passes every filter.
    #[must_use]
    pub fn matches(&self, record: &StoredRecord) -> bool {
        self.filters.iter().all(|clause| clause.matches(record))
    }

    /// Renders one result row.
    ///
    /// Selected fields the record lacks render as empty strings.
    #[must_use]
    pub fn project(&self, record: &StoredRecord, schema: &Schema, separator: &str) -> String {
        let values: Vec<&str> = if self.select.is_empty() {
            schema
                .field_names()
                .chain(std::iter::once(ID_FIELD))
                .map(|name| record.value(name).unwrap_or_default())
                .collect()
        } else {
            self.select
                .iter()
                .map(|name| record.value(name).unwrap_or_default())
                .collect()
        };
        values.join(separator)
    }
}
