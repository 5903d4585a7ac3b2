//! The canonical, type-safe descriptor of a storage's value domain.
//!
//! `StorageType` is a closed sum type. Refinement data (integer bit-width,
//! float bit-width, text length constraints) lives in small `Copy` structs so
//! that types compare by structural equality and can be passed around freely.

use arrow_schema::{DataType as ArrowDataType, TimeUnit};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::StoreError;
use crate::types::value::Value;

//==================================================================================
// 1. Refinements
//==================================================================================

/// A signed integer type of 8, 16, 32 or 64 bits. Values are always held as `i64`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IntegerType {
    bits: u8,
}

impl IntegerType {
    pub const INT_8: IntegerType = IntegerType { bits: 8 };
    pub const INT_16: IntegerType = IntegerType { bits: 16 };
    pub const INT_32: IntegerType = IntegerType { bits: 32 };
    pub const INT_64: IntegerType = IntegerType { bits: 64 };

    pub fn with_bits(bits: u8) -> Result<Self, StoreError> {
        match bits {
            8 | 16 | 32 | 64 => Ok(Self { bits }),
            other => Err(StoreError::UnsupportedType(format!(
                "integer width of {other} bits"
            ))),
        }
    }

    pub const fn bits(&self) -> u8 {
        self.bits
    }

    pub const fn min_value(&self) -> i64 {
        match self.bits {
            8 => i8::MIN as i64,
            16 => i16::MIN as i64,
            32 => i32::MIN as i64,
            _ => i64::MIN,
        }
    }

    pub const fn max_value(&self) -> i64 {
        match self.bits {
            8 => i8::MAX as i64,
            16 => i16::MAX as i64,
            32 => i32::MAX as i64,
            _ => i64::MAX,
        }
    }

    pub fn fits(&self, value: i64) -> bool {
        value >= self.min_value() && value <= self.max_value()
    }

    /// Whether `value` truncated toward zero is representable.
    pub fn fits_double(&self, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        let truncated = value.trunc();
        if self.bits == 64 {
            // i64::MAX is not representable as f64; the nearest double is 2^63.
            truncated >= i64::MIN as f64 && truncated < -(i64::MIN as f64)
        } else {
            truncated >= self.min_value() as f64 && truncated <= self.max_value() as f64
        }
    }

    /// Whether every value of `other` is also a value of `self`.
    pub fn fits_type(&self, other: &IntegerType) -> bool {
        other.bits <= self.bits
    }
}

/// A floating point type. Only the 64-bit width is materialized.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FloatType {
    bits: u8,
}

impl FloatType {
    pub const FLOAT_64: FloatType = FloatType { bits: 64 };

    pub const fn bits(&self) -> u8 {
        self.bits
    }
}

/// Text with an optional length constraint.
///
/// A fixed-length type of length `n` holds strings of exactly `n` characters
/// (shorter values are padded with spaces on adaptation). A variable-length
/// type holds strings of at most `max_length` characters, or any string when
/// `max_length` is `None`. Lengths count Unicode scalar values.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextType {
    fixed_length: bool,
    max_length: Option<usize>,
}

impl TextType {
    pub const VARIABLE_LENGTH: TextType = TextType {
        fixed_length: false,
        max_length: None,
    };

    pub const fn fixed_length(length: usize) -> Self {
        Self {
            fixed_length: true,
            max_length: Some(length),
        }
    }

    pub const fn variable_length_with_limit(limit: usize) -> Self {
        Self {
            fixed_length: false,
            max_length: Some(limit),
        }
    }

    pub const fn is_fixed_length(&self) -> bool {
        self.fixed_length
    }

    pub const fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    pub const fn is_unbounded(&self) -> bool {
        self.max_length.is_none()
    }

    /// Truncates (and for fixed types pads) `value` so that it satisfies this type.
    pub fn adapt(&self, value: &str) -> String {
        let Some(limit) = self.max_length else {
            return value.to_string();
        };
        let mut adapted: String = value.chars().take(limit).collect();
        if self.fixed_length {
            let length = adapted.chars().count();
            adapted.extend(std::iter::repeat(' ').take(limit.saturating_sub(length)));
        }
        adapted
    }

    /// Whether every value of `source` is already a valid value of `self`, so
    /// no adaptation is needed.
    pub fn fits_exactly(&self, source: &TextType) -> bool {
        match (self.fixed_length, self.max_length) {
            (false, None) => true,
            (true, Some(n)) => source.fixed_length && source.max_length == Some(n),
            (false, Some(n)) => source.max_length.map_or(false, |m| m <= n),
            (true, None) => false,
        }
    }

    /// The type of `a + b` (concatenation).
    pub fn concat_types(a: &TextType, b: &TextType) -> TextType {
        match (a.max_length, b.max_length) {
            (Some(x), Some(y)) if a.fixed_length && b.fixed_length => {
                TextType::fixed_length(x + y)
            }
            (Some(x), Some(y)) => TextType::variable_length_with_limit(x + y),
            _ => TextType::VARIABLE_LENGTH,
        }
    }

    /// The smallest type able to hold values of both `a` and `b`.
    pub fn max_type(a: &TextType, b: &TextType) -> TextType {
        if a == b {
            return *a;
        }
        match (a.max_length, b.max_length) {
            (Some(x), Some(y)) => TextType::variable_length_with_limit(x.max(y)),
            _ => TextType::VARIABLE_LENGTH,
        }
    }
}

//==================================================================================
// 2. StorageType
//==================================================================================

/// The closed set of value domains a storage can have.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageType {
    Integer(IntegerType),
    Float(FloatType),
    Boolean,
    Text(TextType),
    Date,
    DateTime,
    TimeOfDay,
    BigInteger,
    BigDecimal,
    Null,
    AnyObject,
}

impl StorageType {
    pub const INT_64: StorageType = StorageType::Integer(IntegerType::INT_64);
    pub const FLOAT_64: StorageType = StorageType::Float(FloatType::FLOAT_64);
    pub const TEXT: StorageType = StorageType::Text(TextType::VARIABLE_LENGTH);

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Integer(_) | Self::Float(_) | Self::BigInteger | Self::BigDecimal
        )
    }

    pub fn is_integral(&self) -> bool {
        matches!(self, Self::Integer(_) | Self::BigInteger)
    }

    pub fn has_date(&self) -> bool {
        matches!(self, Self::Date | Self::DateTime)
    }

    pub fn has_time(&self) -> bool {
        matches!(self, Self::DateTime | Self::TimeOfDay)
    }

    /// The type that holds `value` exactly as given.
    pub fn of_value(value: &Value) -> StorageType {
        match value {
            Value::Null => StorageType::Null,
            Value::Long(_) => StorageType::INT_64,
            Value::Double(_) => StorageType::FLOAT_64,
            Value::Boolean(_) => StorageType::Boolean,
            Value::Text(_) => StorageType::TEXT,
            Value::BigInteger(_) => StorageType::BigInteger,
            Value::BigDecimal(_) => StorageType::BigDecimal,
            Value::Date(_) => StorageType::Date,
            Value::DateTime(_) => StorageType::DateTime,
            Value::TimeOfDay(_) => StorageType::TimeOfDay,
            Value::Other(_) => StorageType::AnyObject,
        }
    }

    /// The type a single boxed value needs. Whole-number floats that fit a
    /// 64-bit integer report as `INT_64`.
    pub fn for_boxed_item(value: &Value) -> StorageType {
        match value {
            Value::Double(d) if d.fract() == 0.0 && IntegerType::INT_64.fits_double(*d) => {
                StorageType::INT_64
            }
            other => Self::of_value(other),
        }
    }

    /// The narrowest type able to represent values of both `a` and `b`.
    pub fn common_type(a: &StorageType, b: &StorageType) -> StorageType {
        use StorageType::*;
        match (a, b) {
            (x, y) if x == y => *x,
            (Null, other) | (other, Null) => *other,
            (Integer(x), Integer(y)) => Integer((*x).max(*y)),
            (Text(x), Text(y)) => Text(TextType::max_type(x, y)),
            (x, y) if x.is_numeric() && y.is_numeric() => {
                match (NumericKind::of_type(x), NumericKind::of_type(y)) {
                    (Some(l), Some(r)) => l.promote(r).storage_type(),
                    _ => AnyObject,
                }
            }
            _ => AnyObject,
        }
    }

    /// Converts an Arrow `DataType` into a `StorageType`.
    pub fn from_arrow_type(arrow_type: &ArrowDataType) -> Result<Self, StoreError> {
        match arrow_type {
            ArrowDataType::Int8 => Ok(Self::Integer(IntegerType::INT_8)),
            ArrowDataType::Int16 => Ok(Self::Integer(IntegerType::INT_16)),
            ArrowDataType::Int32 => Ok(Self::Integer(IntegerType::INT_32)),
            ArrowDataType::Int64 => Ok(Self::INT_64),
            ArrowDataType::Float64 => Ok(Self::FLOAT_64),
            ArrowDataType::Boolean => Ok(Self::Boolean),
            ArrowDataType::Utf8 => Ok(Self::TEXT),
            ArrowDataType::Date32 => Ok(Self::Date),
            ArrowDataType::Timestamp(TimeUnit::Millisecond, _) => Ok(Self::DateTime),
            ArrowDataType::Time64(TimeUnit::Microsecond) => Ok(Self::TimeOfDay),
            ArrowDataType::Null => Ok(Self::Null),
            dt => Err(StoreError::UnsupportedType(format!(
                "Cannot convert Arrow type {:?} to StorageType",
                dt
            ))),
        }
    }

    /// Converts a `StorageType` back into an Arrow `DataType`.
    pub fn to_arrow_type(&self) -> Result<ArrowDataType, StoreError> {
        match self {
            Self::Integer(t) => Ok(match t.bits() {
                8 => ArrowDataType::Int8,
                16 => ArrowDataType::Int16,
                32 => ArrowDataType::Int32,
                _ => ArrowDataType::Int64,
            }),
            Self::Float(_) => Ok(ArrowDataType::Float64),
            Self::Boolean => Ok(ArrowDataType::Boolean),
            Self::Text(_) => Ok(ArrowDataType::Utf8),
            Self::Date => Ok(ArrowDataType::Date32),
            Self::DateTime => Ok(ArrowDataType::Timestamp(
                TimeUnit::Millisecond,
                Some("+00:00".into()),
            )),
            Self::TimeOfDay => Ok(ArrowDataType::Time64(TimeUnit::Microsecond)),
            Self::Null => Ok(ArrowDataType::Null),
            other => Err(StoreError::UnsupportedType(format!(
                "{other} has no Arrow counterpart"
            ))),
        }
    }
}

/// Provides the canonical, user-facing name of a storage type.
impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(t) => write!(f, "Integer ({} bits)", t.bits()),
            Self::Float(t) => write!(f, "Float ({} bits)", t.bits()),
            Self::Boolean => write!(f, "Boolean"),
            Self::Text(t) => match (t.is_fixed_length(), t.max_length()) {
                (_, None) => write!(f, "Char (variable length)"),
                (true, Some(n)) => write!(f, "Char (fixed length {n})"),
                (false, Some(n)) => write!(f, "Char (max length {n})"),
            },
            Self::Date => write!(f, "Date"),
            Self::DateTime => write!(f, "Date_Time"),
            Self::TimeOfDay => write!(f, "Time_Of_Day"),
            Self::BigInteger => write!(f, "Big_Integer"),
            Self::BigDecimal => write!(f, "Decimal"),
            Self::Null => write!(f, "Null"),
            Self::AnyObject => write!(f, "Mixed"),
        }
    }
}

//==================================================================================
// 3. Numeric Promotion Lattice
//==================================================================================

/// The execution kind of a numeric binary operation.
///
/// `Long < BigInteger < BigDecimal` is the exact track; `Double` is the inexact
/// track that any integral kind joins when paired with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericKind {
    Long,
    BigInteger,
    BigDecimal,
    Double,
}

impl NumericKind {
    pub fn of_type(storage_type: &StorageType) -> Option<NumericKind> {
        match storage_type {
            StorageType::Integer(_) => Some(Self::Long),
            StorageType::Float(_) => Some(Self::Double),
            StorageType::BigInteger => Some(Self::BigInteger),
            StorageType::BigDecimal => Some(Self::BigDecimal),
            _ => None,
        }
    }

    pub fn of_value(value: &Value) -> Option<NumericKind> {
        match value {
            Value::Long(_) => Some(Self::Long),
            Value::Double(_) => Some(Self::Double),
            Value::BigInteger(_) => Some(Self::BigInteger),
            Value::BigDecimal(_) => Some(Self::BigDecimal),
            _ => None,
        }
    }

    pub fn is_integral(&self) -> bool {
        matches!(self, Self::Long | Self::BigInteger)
    }

    /// The kind a binary operation over `self` and `other` executes at.
    pub fn promote(self, other: NumericKind) -> NumericKind {
        use NumericKind::*;
        match (self, other) {
            (BigDecimal, _) | (_, BigDecimal) => BigDecimal,
            (Double, _) | (_, Double) => Double,
            (BigInteger, _) | (_, BigInteger) => BigInteger,
            (Long, Long) => Long,
        }
    }

    pub fn storage_type(&self) -> StorageType {
        match self {
            Self::Long => StorageType::INT_64,
            Self::BigInteger => StorageType::BigInteger,
            Self::BigDecimal => StorageType::BigDecimal,
            Self::Double => StorageType::FLOAT_64,
        }
    }
}

//==================================================================================
// 4. Unit Tests
//==================================================================================
