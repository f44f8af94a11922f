//! Ordering of query results.
//!
//! One order spec is a plain stable sort. Two order specs use a two-layer
//! grouped sort: records are grouped on the outer field's raw value, the
//! groups are ordered by the outer field's parsed value, and each group is
//! ordered by the inner field. The result equals a multi-key sort with the
//! outer field as the primary key.

use super::{OrderSpec, MAX_ORDER_SPECS};
use crate::error::{CoreError, CoreResult};
use crate::record::StoredRecord;
use crate::schema::{OrderValue, Schema};
use std::collections::HashMap;

/// Sorts records by up to [`MAX_ORDER_SPECS`] order specs.
///
/// # Errors
///
/// Returns [`CoreError::OrderLimit`] for too many specs and
/// [`CoreError::UnknownField`] for fields missing from the schema.
pub fn sort_records(
    mut records: Vec<StoredRecord>,
    order: &[OrderSpec],
    schema: &Schema,
) -> CoreResult<Vec<StoredRecord>> {
    match order {
        [] => Ok(records),
        [spec] => {
            let compare = schema.comparator(&spec.field, spec.direction)?;
            records.sort_by(|a, b| compare(&a.record, &b.record));
            Ok(records)
        }
        [outer, inner] => two_layer_sort(records, outer, inner, schema),
        _ => Err(CoreError::OrderLimit {
            requested: order.len(),
            max: MAX_ORDER_SPECS,
        }),
    }
}

/// Groups on `outer`, orders groups by its parsed value, then orders each
/// group by `inner`.
///
/// Records lacking the outer field form a group of their own keyed by the
/// empty string.
///
/// # Errors
///
/// Returns [`CoreError::UnknownField`] if either field is not in the schema.
pub fn two_layer_sort(
    records: Vec<StoredRecord>,
    outer: &OrderSpec,
    inner: &OrderSpec,
    schema: &Schema,
) -> CoreResult<Vec<StoredRecord>> {
    let outer_type = schema.field(&outer.field)?.field_type();
    let inner_compare = schema.comparator(&inner.field, inner.direction)?;

    // Groups in first-seen order, so equal outer values keep input order.
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<StoredRecord>)> = Vec::new();
    for record in records {
        let key = record.record.get(&outer.field).unwrap_or_default();
        match positions.get(key) {
            Some(&i) => groups[i].1.push(record),
            None => {
                positions.insert(key.to_string(), groups.len());
                groups.push((key.to_string(), vec![record]));
            }
        }
    }

    let mut keyed: Vec<(Option<OrderValue>, Vec<StoredRecord>)> = groups
        .into_iter()
        .map(|(key, members)| (outer_type.order_value(&key), members))
        .collect();
    keyed.sort_by(|a, b| outer.direction.apply(a.0.cmp(&b.0)));

    let mut sorted = Vec::with_capacity(keyed.iter().map(|(_, m)| m.len()).sum());
    for (_, mut members) in keyed {
        members.sort_by(|a, b| inner_compare(&a.record, &b.record));
        sorted.extend(members);
    }
    Ok(sorted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use crate::schema::SortDirection;

    fn stored(title: &str, date: &str, rev: &str) -> StoredRecord {
        let record: Record = [
            ("STB", "stb1"),
            ("TITLE", title),
            ("DATE", date),
            ("REV", rev),
        ]
        .into_iter()
        .collect();
        let id = Schema::media_views().record_id(&record).unwrap();
        StoredRecord::new(id, record)
    }

    fn sample() -> Vec<StoredRecord> {
        vec![
            stored("the matrix", "2014-04-01", "4.00"),
            stored("the hobbit", "2014-04-02", "8.00"),
            stored("the matrix", "2014-04-02", "4.00"),
            stored("unbreakable", "2014-04-03", "6.00"),
        ]
    }

    fn rows(records: &[StoredRecord]) -> Vec<String> {
        records
            .iter()
            .map(|r| {
                format!(
                    "{},{}",
                    r.record.get("TITLE").unwrap(),
                    r.record.get("DATE").unwrap()
                )
            })
            .collect()
    }

    #[test]
    fn no_order_keeps_input() {
        let schema = Schema::media_views();
        let sorted = sort_records(sample(), &[], &schema).unwrap();
        assert_eq!(rows(&sorted), rows(&sample()));
    }

    #[test]
    fn single_key_is_stable() {
        let schema = Schema::media_views();
        let sorted = sort_records(sample(), &[OrderSpec::asc("TITLE")], &schema).unwrap();
        assert_eq!(
            rows(&sorted),
            vec![
                "the hobbit,2014-04-02",
                "the matrix,2014-04-01",
                "the matrix,2014-04-02",
                "unbreakable,2014-04-03",
            ]
        );
    }

    #[test]
    fn single_key_descending() {
        let schema = Schema::media_views();
        let sorted = sort_records(sample(), &[OrderSpec::desc("REV")], &schema).unwrap();
        let revs: Vec<_> = sorted.iter().map(|r| r.record.get("REV").unwrap()).collect();
        assert_eq!(revs, vec!["8.00", "6.00", "4.00", "4.00"]);
    }

    #[test]
    fn two_keys_date_then_title() {
        let schema = Schema::media_views();
        let order = [OrderSpec::asc("DATE"), OrderSpec::asc("TITLE")];
        let sorted = sort_records(sample(), &order, &schema).unwrap();
        assert_eq!(
            rows(&sorted),
            vec![
                "the matrix,2014-04-01",
                "the hobbit,2014-04-02",
                "the matrix,2014-04-02",
                "unbreakable,2014-04-03",
            ]
        );
    }

    #[test]
    fn two_keys_with_inner_descending() {
        let schema = Schema::media_views();
        let order = [OrderSpec::asc("DATE"), OrderSpec::desc("TITLE")];
        let sorted = sort_records(sample(), &order, &schema).unwrap();
        assert_eq!(
            rows(&sorted),
            vec![
                "the matrix,2014-04-01",
                "the matrix,2014-04-02",
                "the hobbit,2014-04-02",
                "unbreakable,2014-04-03",
            ]
        );
    }

    #[test]
    fn outer_groups_use_parsed_order() {
        let schema = Schema::media_views();
        // Lexicographically "10.00" < "4.00"; numerically it is not.
        let records = vec![
            stored("a", "2014-04-01", "10.00"),
            stored("b", "2014-04-01", "4.00"),
            stored("c", "2014-04-02", "10.00"),
        ];
        let order = [
            OrderSpec::new("REV", SortDirection::Desc),
            OrderSpec::asc("TITLE"),
        ];
        let sorted = sort_records(records, &order, &schema).unwrap();
        let titles: Vec<_> = sorted.iter().map(|r| r.record.get("TITLE").unwrap()).collect();
        assert_eq!(titles, vec!["a", "c", "b"]);
    }

    #[test]
    fn missing_outer_value_forms_first_group() {
        let schema = Schema::media_views();
        let mut records = sample();
        let bare: Record = [("STB", "stb9"), ("TITLE", "zardoz"), ("DATE", "2014-04-02")]
            .into_iter()
            .collect();
        records.push(StoredRecord::new(
            schema.record_id(&bare).unwrap(),
            bare,
        ));

        let order = [OrderSpec::asc("REV"), OrderSpec::asc("TITLE")];
        let sorted = sort_records(records, &order, &schema).unwrap();
        assert_eq!(sorted.len(), 5);
        assert_eq!(sorted[0].record.get("TITLE"), Some("zardoz"));
    }

    #[test]
    fn rejects_three_keys() {
        let schema = Schema::media_views();
        let order = [
            OrderSpec::asc("DATE"),
            OrderSpec::asc("TITLE"),
            OrderSpec::asc("REV"),
        ];
        assert!(matches!(
            sort_records(sample(), &order, &schema),
            Err(CoreError::OrderLimit { .. })
        ));
    }

    #[test]
    fn rejects_unknown_inner_field() {
        let schema = Schema::media_views();
        let order = [OrderSpec::asc("DATE"), OrderSpec::asc("GENRE")];
        assert!(sort_records(sample(), &order, &schema)
            .unwrap_err()
            .is_schema_lookup());
    }
}
