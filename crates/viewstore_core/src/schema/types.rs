//! Field types: validation and ordering of raw string values.

use crate::error::CoreError;
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static DATE_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid date pattern"));
static TIME_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+:[0-9]{2}$").expect("valid time pattern"));
static PRICE_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+\.[0-9]{2}$").expect("valid price pattern"));

/// Maximum text length is one less than this.
const TEXT_LIMIT: usize = 63;

/// Sort direction of an order spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    /// Smallest first.
    #[default]
    Asc,
    /// Largest first.
    Desc,
}

impl SortDirection {
    /// Applies the direction to an ascending comparison result.
    #[must_use]
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

impl FromStr for SortDirection {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(Self::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(Self::Desc)
        } else {
            Err(CoreError::InvalidDirection { value: s.into() })
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        })
    }
}

/// A parsed, comparable form of a raw field value.
///
/// Values of different variants never meet in practice since a field has a
/// single type; they order by variant to keep the ordering total.
#[derive(Debug, Clone)]
pub enum OrderValue {
    /// Text compared lexicographically.
    Text(String),
    /// A number.
    Number(f64),
    /// Seconds since 0001-01-01.
    Timestamp(i64),
}

impl OrderValue {
    fn rank(&self) -> u8 {
        match self {
            Self::Text(_) => 0,
            Self::Number(_) => 1,
            Self::Timestamp(_) => 2,
        }
    }
}

impl Ord for OrderValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Timestamp(a), Self::Timestamp(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for OrderValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for OrderValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OrderValue {}

/// Behaviour of one class of field values.
///
/// Implement this to add a field type; register it with
/// [`super::TypeRegistry::register`] and reference it by name when building a
/// [`super::Schema`].
pub trait FieldType: fmt::Debug + Send + Sync {
    /// Registry name of the type.
    fn name(&self) -> &str;

    /// Returns true if `raw` is an acceptable value.
    fn is_valid(&self, raw: &str) -> bool;

    /// Parses `raw` into its ordering value, `None` if it cannot be parsed.
    fn order_value(&self, raw: &str) -> Option<OrderValue>;

    /// Compares two raw values in ascending order.
    ///
    /// Unparsable values sort before parsable ones.
    fn compare(&self, a: &str, b: &str) -> Ordering {
        self.order_value(a).cmp(&self.order_value(b))
    }
}

/// The built-in field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinType {
    /// Non-empty text shorter than 63 characters.
    Text64,
    /// Calendar date in `YYYY-MM-DD` form.
    ///
    /// The date must also exist: `2014-02-30` is rejected rather than rolled
    /// over into March.
    Date,
    /// Clock duration in `H:MM` form.
    Time,
    /// Currency amount with exactly two decimals.
    Price,
}

impl BuiltinType {
    /// All built-in types.
    pub const ALL: [Self; 4] = [Self::Text64, Self::Date, Self::Time, Self::Price];

    fn parse_date(raw: &str) -> Option<NaiveDate> {
        if !DATE_FORMAT.is_match(raw) {
            return None;
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
    }
}

impl FieldType for BuiltinType {
    fn name(&self) -> &str {
        match self {
            Self::Text64 => "TEXT64",
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::Price => "PRICE",
        }
    }

    fn is_valid(&self, raw: &str) -> bool {
        match self {
            Self::Text64 => !raw.is_empty() && raw.chars().count() < TEXT_LIMIT,
            Self::Date => Self::parse_date(raw).is_some(),
            Self::Time => TIME_FORMAT.is_match(raw),
            Self::Price => PRICE_FORMAT.is_match(raw),
        }
    }

    fn order_value(&self, raw: &str) -> Option<OrderValue> {
        match self {
            Self::Text64 => Some(OrderValue::Text(raw.to_string())),
            Self::Date => Self::parse_date(raw)
                .map(|d| OrderValue::Timestamp(i64::from(d.num_days_from_ce()) * 86_400)),
            // "2:05" orders as 2.05
            Self::Time => raw
                .replacen(':', ".", 1)
                .parse::<f64>()
                .ok()
                .map(OrderValue::Number),
            Self::Price => raw.parse::<f64>().ok().map(OrderValue::Number),
        }
    }

    fn compare(&self, a: &str, b: &str) -> Ordering {
        match self {
            Self::Text64 => a.cmp(b),
            _ => self.order_value(a).cmp(&self.order_value(b)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text64_validity() {
        let t = BuiltinType::Text64;
        assert!(t.is_valid("the matrix"));
        assert!(!t.is_valid(""));
        assert!(t.is_valid(&"x".repeat(62)));
        assert!(!t.is_valid(&"x".repeat(63)));
    }

    #[test]
    fn date_validity() {
        let t = BuiltinType::Date;
        assert!(t.is_valid("2014-04-01"));
        assert!(!t.is_valid("2014-4-1"));
        assert!(!t.is_valid("2014-02-30"));
        assert!(!t.is_valid("x2014-04-01"));
        assert!(!t.is_valid(""));
    }

    #[test]
    fn time_validity() {
        let t = BuiltinType::Time;
        assert!(t.is_valid("1:30"));
        assert!(t.is_valid("12:05"));
        assert!(!t.is_valid("1:5"));
        assert!(!t.is_valid("130"));
        assert!(!t.is_valid(":30"));
    }

    #[test]
    fn price_validity() {
        let t = BuiltinType::Price;
        assert!(t.is_valid("4.00"));
        assert!(t.is_valid("999.00"));
        assert!(!t.is_valid("4"));
        assert!(!t.is_valid("4.0"));
        assert!(!t.is_valid("4.000"));
        assert!(!t.is_valid("-4.00"));
    }

    #[test]
    fn date_orders_chronologically() {
        let t = BuiltinType::Date;
        assert_eq!(t.compare("2014-04-01", "2014-04-02"), Ordering::Less);
        assert_eq!(t.compare("2015-01-01", "2014-12-31"), Ordering::Greater);
        assert_eq!(t.compare("2014-04-01", "2014-04-01"), Ordering::Equal);
    }

    #[test]
    fn time_orders_numerically() {
        let t = BuiltinType::Time;
        assert_eq!(t.compare("2:05", "10:00"), Ordering::Less);
        assert_eq!(t.compare("1:45", "1:30"), Ordering::Greater);
    }

    #[test]
    fn price_orders_numerically() {
        let t = BuiltinType::Price;
        assert_eq!(t.compare("9.99", "10.00"), Ordering::Less);
        assert_eq!(t.compare("4.00", "4.00"), Ordering::Equal);
    }

    #[test]
    fn unparsable_sorts_first() {
        let t = BuiltinType::Price;
        assert_eq!(t.compare("n/a", "0.00"), Ordering::Less);
    }

    #[test]
    fn direction_parse_and_apply() {
        assert_eq!("ASC".parse::<SortDirection>().unwrap(), SortDirection::Asc);
        assert_eq!("desc".parse::<SortDirection>().unwrap(), SortDirection::Desc);
        assert!(matches!(
            "sideways".parse::<SortDirection>(),
            Err(CoreError::InvalidDirection { .. })
        ));
        assert_eq!(SortDirection::Desc.apply(Ordering::Less), Ordering::Greater);
        assert_eq!(SortDirection::default(), SortDirection::Asc);
    }

    #[test]
    fn builtin_names() {
        let names: Vec<_> = BuiltinType::ALL.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["TEXT64", "DATE", "TIME", "PRICE"]);
    }
}
