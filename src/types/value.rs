//! The tagged runtime value used at the interop boundary.
//!
//! Builders accept `Value`s, boxed accessors return them, and scalar operation
//! arguments are passed as them. The coercion helpers here decide which numeric
//! representation a value can be read as.

use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::types::storage_type::NumericKind;

/// A single, possibly missing, cell value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Long(i64),
    Double(f64),
    Boolean(bool),
    Text(String),
    BigInteger(BigInt),
    BigDecimal(BigDecimal),
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
    TimeOfDay(NaiveTime),
    /// An opaque host object, carried by its display form.
    Other(String),
}

impl Value {
    pub fn is_nothing(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Nothing",
            Value::Long(_) => "Integer",
            Value::Double(_) => "Float",
            Value::Boolean(_) => "Boolean",
            Value::Text(_) => "Text",
            Value::BigInteger(_) => "Big_Integer",
            Value::BigDecimal(_) => "Decimal",
            Value::Date(_) => "Date",
            Value::DateTime(_) => "Date_Time",
            Value::TimeOfDay(_) => "Time_Of_Day",
            Value::Other(_) => "Object",
        }
    }

    //==============================================================================
    // Numeric coercions
    //==============================================================================

    /// The value as a 64-bit integer, only for values that already are one.
    pub fn coerce_to_long(&self) -> Option<i64> {
        match self {
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn coerce_to_double(&self) -> Option<f64> {
        match self {
            Value::Long(v) => Some(*v as f64),
            Value::Double(v) => Some(*v),
            Value::BigInteger(v) => v.to_f64(),
            Value::BigDecimal(v) => v.to_f64(),
            _ => None,
        }
    }

    pub fn coerce_to_big_integer(&self) -> Option<BigInt> {
        match self {
            Value::Long(v) => Some(BigInt::from(*v)),
            Value::BigInteger(v) => Some(v.clone()),
            _ => None,
        }
    }

    pub fn coerce_to_big_decimal(&self) -> Option<BigDecimal> {
        match self {
            Value::Long(v) => Some(BigDecimal::from(*v)),
            Value::BigInteger(v) => Some(BigDecimal::new(v.clone(), 0)),
            Value::BigDecimal(v) => Some(v.clone()),
            Value::Double(v) => big_decimal_from_f64(*v),
            _ => None,
        }
    }

    //==============================================================================
    // Comparisons
    //==============================================================================

    /// Orders two non-null values of comparable kinds. Numbers are compared
    /// after promotion; other kinds only compare with themselves.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        if let (Some(l), Some(r)) = (NumericKind::of_value(self), NumericKind::of_value(other)) {
            return match l.promote(r) {
                NumericKind::Long => Some(self.coerce_to_long()?.cmp(&other.coerce_to_long()?)),
                NumericKind::BigInteger => Some(
                    self.coerce_to_big_integer()?
                        .cmp(&other.coerce_to_big_integer()?),
                ),
                NumericKind::BigDecimal => Some(
                    self.coerce_to_big_decimal()?
                        .cmp(&other.coerce_to_big_decimal()?),
                ),
                NumericKind::Double => self
                    .coerce_to_double()?
                    .partial_cmp(&other.coerce_to_double()?),
            };
        }
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.as_str().cmp(b.as_str())),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            (Value::TimeOfDay(a), Value::TimeOfDay(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Equality with numeric promotion; values of unrelated kinds are unequal.
    pub fn equals(&self, other: &Value) -> bool {
        match self.compare(other) {
            Some(ordering) => ordering == Ordering::Equal,
            None => self == other,
        }
    }
}

//==================================================================================
// Formatting helpers
//==================================================================================

/// Parses the shortest round-trip decimal form of `value`.
pub(crate) fn big_decimal_from_f64(value: f64) -> Option<BigDecimal> {
    if !value.is_finite() {
        return None;
    }
    BigDecimal::from_str(&value.to_string()).ok()
}

/// Renders a float the way users see it in a table: whole numbers keep one
/// decimal digit.
pub(crate) fn format_double(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        let sign = if value > 0.0 { "" } else { "-" };
        format!("{sign}Infinity")
    } else if value.fract().is_zero() && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Nothing"),
            Value::Long(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{}", format_double(*v)),
            Value::Boolean(true) => write!(f, "True"),
            Value::Boolean(false) => write!(f, "False"),
            Value::Text(s) => write!(f, "{s}"),
            Value::BigInteger(v) => write!(f, "{v}"),
            Value::BigDecimal(v) => write!(f, "{v}"),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::DateTime(d) => write!(f, "{}", d.format("%Y-%m-%d %H:%M:%S%.f%:z")),
            Value::TimeOfDay(t) => write!(f, "{}", t.format("%H:%M:%S%.f")),
            Value::Other(s) => write!(f, "{s}"),
        }
    }
}

//==================================================================================
// Conversions into Value
//==================================================================================

macro_rules! impl_from_for_value {
    ($($source:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$source> for Value {
                fn from(v: $source) -> Self {
                    Value::$variant(v)
                }
            }
        )+
    };
}

impl_from_for_value!(
    i64 => Long,
    f64 => Double,
    bool => Boolean,
    String => Text,
    BigInt => BigInteger,
    BigDecimal => BigDecimal,
    NaiveDate => Date,
    NaiveTime => TimeOfDay,
    DateTime<FixedOffset> => DateTime,
);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
