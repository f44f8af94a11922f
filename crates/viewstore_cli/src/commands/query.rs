//! Query command implementation.

use super::canonical_field;
use thiserror::Error;
use viewstore_core::{Datastore, OrderSpec, Query, Schema};

/// A `-f` argument that could not be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    /// The word has no `=` separating field and value.
    #[error("expected field=value, found '{0}'")]
    MissingEquals(String),

    /// A quoted value was never closed.
    #[error("unterminated quote in filter '{0}'")]
    UnterminatedQuote(String),
}

/// Parses filter words into `(field, value)` pairs.
///
/// A value opening with `'` or `"` runs until a word ending in the same
/// quote, so `title='the matrix'` split by the shell into `title='the` and
/// `matrix'` reads as one filter.
pub fn parse_filters(words: &[String]) -> Result<Vec<(String, String)>, FilterError> {
    let mut filters = Vec::new();
    let mut words = words.iter();

    while let Some(word) = words.next() {
        let (field, rest) = word
            .split_once('=')
            .ok_or_else(|| FilterError::MissingEquals(word.clone()))?;

        let value = match rest.chars().next() {
            Some(quote @ ('\'' | '"')) => {
                let mut value = rest[1..].to_string();
                while !value.ends_with(quote) {
                    let next = words
                        .next()
                        .ok_or_else(|| FilterError::UnterminatedQuote(word.clone()))?;
                    if !value.is_empty() {
                        value.push(' ');
                    }
                    value.push_str(next);
                }
                value.pop();
                value
            }
            _ => rest.to_string(),
        };

        filters.push((field.to_string(), value));
    }

    Ok(filters)
}

/// Builds a query from raw command-line values.
pub fn build_query(
    schema: &Schema,
    select: &[String],
    order: &[String],
    filter: &[String],
) -> Result<Query, Box<dyn std::error::Error>> {
    let mut query = Query::new().select(
        select
            .iter()
            .filter(|name| !name.trim().is_empty())
            .map(|name| canonical_field(schema, name)),
    );

    for raw in order {
        let mut spec: OrderSpec = raw.trim().parse()?;
        spec.field = canonical_field(schema, &spec.field);
        query = query.order_by(spec);
    }

    for (field, value) in parse_filters(filter)? {
        query = query.filter(canonical_field(schema, &field), value);
    }

    Ok(query)
}

/// Runs the query command.
pub async fn run(
    store: &Datastore,
    select: &[String],
    order: &[String],
    filter: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let query = build_query(store.schema(), select, order, filter)?;
    for row in store.query(&query).await? {
        println!("{row}");
    }
    Ok(())
}
