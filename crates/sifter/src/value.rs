//! Runtime value types for field comparison.
//!
//! [`Value`] is what an accessor reads out of an item, borrowed from it.
//! [`ClauseValue`] is the owned, already-converted operand a compiled clause
//! compares against. [`ValueType`] is the static type of a property, used to
//! validate operators and to convert raw client tokens.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Runtime value of a property, borrowed from the source item.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    /// String value (borrowed).
    String(&'a str),
    /// Numeric value.
    Number(Number),
    /// Point in time (milliseconds since Unix epoch, UTC).
    Timestamp(Timestamp),
    /// Calendar date.
    Date(NaiveDate),
    /// Enum discriminant value.
    Enum(u32),
    /// Boolean value.
    Bool(bool),
    /// Identifier value.
    Uuid(Uuid),
    /// Null, or a missing optional link along the path.
    Null,
}

impl<'a> Value<'a> {
    /// Returns `true` if this is a `Null` value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Extracts the string value, if present.
    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extracts the number value, if present.
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// Numeric value supporting all common numeric types.
///
/// Numbers are stored in one of three variants to preserve precision.
/// Comparisons between different variants are handled without going
/// through `f64` unless one side is already a float.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Number {
    /// Signed 64-bit integer.
    I64(i64),
    /// Unsigned 64-bit integer.
    U64(u64),
    /// 64-bit floating point.
    F64(f64),
}

impl Number {
    /// Converts the number to f64 for comparison.
    pub fn to_f64(self) -> f64 {
        match self {
            Number::I64(n) => n as f64,
            Number::U64(n) => n as f64,
            Number::F64(n) => n,
        }
    }

    /// Compares two numbers, handling mixed types.
    ///
    /// Returns `None` when either side is NaN.
    pub fn compare(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::I64(a), Number::I64(b)) => Some(a.cmp(&b)),
            (Number::U64(a), Number::U64(b)) => Some(a.cmp(&b)),
            (Number::I64(a), Number::U64(b)) => Some(if a < 0 {
                Ordering::Less
            } else {
                (a as u64).cmp(&b)
            }),
            (Number::U64(a), Number::I64(b)) => Some(if b < 0 {
                Ordering::Greater
            } else {
                a.cmp(&(b as u64))
            }),
            _ => self.to_f64().partial_cmp(&other.to_f64()),
        }
    }

    /// Returns `true` for a float NaN.
    pub fn is_nan(self) -> bool {
        matches!(self, Number::F64(n) if n.is_nan())
    }

    /// Total order for sorting: NaN sorts before every other number.
    pub fn sort_cmp(self, other: Number) -> Ordering {
        match (self.is_nan(), other.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self.compare(other).unwrap_or(Ordering::Equal),
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(*other)
    }
}

macro_rules! number_from {
    ($variant:ident as $target:ty: $($source:ty),*) => {
        $(
            impl From<$source> for Number {
                fn from(n: $source) -> Self {
                    Number::$variant(n as $target)
                }
            }
        )*
    };
}

number_from!(I64 as i64: i8, i16, i32, i64, isize);
number_from!(U64 as u64: u8, u16, u32, u64, usize);
number_from!(F64 as f64: f32, f64);

/// Timestamp value represented as milliseconds since Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Creates a new timestamp from milliseconds since Unix epoch.
    pub fn from_millis(millis: i64) -> Self {
        Timestamp(millis)
    }

    /// Returns the timestamp as milliseconds since Unix epoch.
    pub fn as_millis(self) -> i64 {
        self.0
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Timestamp(dt.timestamp_millis())
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(dt: NaiveDateTime) -> Self {
        Timestamp(dt.and_utc().timestamp_millis())
    }
}

/// Static description of an enum usable in queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumType {
    /// Rust type name, for diagnostics.
    pub name: &'static str,
    /// Variant names and their discriminants.
    pub variants: &'static [(&'static str, u32)],
}

impl EnumType {
    /// Looks up a variant by name, ignoring ASCII case.
    pub fn discriminant_of(&self, name: &str) -> Option<u32> {
        self.variants
            .iter()
            .find(|(variant, _)| variant.eq_ignore_ascii_case(name))
            .map(|(_, d)| *d)
    }

    /// Returns `true` if `d` is the discriminant of some variant.
    pub fn has_discriminant(&self, d: u32) -> bool {
        self.variants.iter().any(|(_, v)| *v == d)
    }
}

/// Static type of a resolved property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Text,
    Integer,
    Unsigned,
    Float,
    Bool,
    Timestamp,
    Date,
    Uuid,
    Enum(EnumType),
}

/// Operator-applicability family of a [`ValueType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeFamily {
    /// Strings: equality, membership, substring and pattern operators.
    Text,
    /// Numbers and points in time: equality, membership, ordering, ranges.
    Ordered,
    /// Booleans, enums, identifiers: equality and membership only.
    Equatable,
}

impl ValueType {
    pub fn family(self) -> TypeFamily {
        match self {
            ValueType::Text => TypeFamily::Text,
            ValueType::Integer
            | ValueType::Unsigned
            | ValueType::Float
            | ValueType::Timestamp
            | ValueType::Date => TypeFamily::Ordered,
            ValueType::Bool | ValueType::Uuid | ValueType::Enum(_) => TypeFamily::Equatable,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::Text => "Text",
            ValueType::Integer => "Integer",
            ValueType::Unsigned => "Unsigned",
            ValueType::Float => "Float",
            ValueType::Bool => "Bool",
            ValueType::Timestamp => "Timestamp",
            ValueType::Date => "Date",
            ValueType::Uuid => "Uuid",
            ValueType::Enum(e) => e.name,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TypeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeFamily::Text => "text",
            TypeFamily::Ordered => "ordered",
            TypeFamily::Equatable => "equatable",
        };
        f.write_str(name)
    }
}

/// Owned, converted operand stored in a compiled clause.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ClauseValue {
    String(String),
    Number(Number),
    Timestamp(Timestamp),
    Date(NaiveDate),
    Enum(u32),
    Bool(bool),
    Uuid(Uuid),
    Null,
}

impl ClauseValue {
    /// Orders a field value relative to this operand.
    ///
    /// Returns `None` if either side is null, the types differ, or a
    /// float comparison involves NaN.
    pub fn compare(&self, field: &Value<'_>) -> Option<Ordering> {
        match (field, self) {
            (Value::String(a), ClauseValue::String(b)) => Some((*a).cmp(b.as_str())),
            (Value::Number(a), ClauseValue::Number(b)) => a.compare(*b),
            (Value::Timestamp(a), ClauseValue::Timestamp(b)) => Some(a.cmp(b)),
            (Value::Date(a), ClauseValue::Date(b)) => Some(a.cmp(b)),
            (Value::Enum(a), ClauseValue::Enum(b)) => Some(a.cmp(b)),
            (Value::Bool(a), ClauseValue::Bool(b)) => Some(a.cmp(b)),
            (Value::Uuid(a), ClauseValue::Uuid(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Null-aware equality: null equals null, and nothing else.
    pub fn equals(&self, field: &Value<'_>) -> bool {
        match (field, self) {
            (Value::Null, ClauseValue::Null) => true,
            (Value::Null, _) | (_, ClauseValue::Null) => false,
            _ => self.compare(field) == Some(Ordering::Equal),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ClauseValue::Null)
    }
}

impl From<&str> for ClauseValue {
    fn from(s: &str) -> Self {
        ClauseValue::String(s.to_string())
    }
}

impl From<Number> for ClauseValue {
    fn from(n: Number) -> Self {
        ClauseValue::Number(n)
    }
}
