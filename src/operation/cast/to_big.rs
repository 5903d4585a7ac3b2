//! Conversions to the arbitrary-precision number types.

use bigdecimal::{BigDecimal, RoundingMode};
use num_bigint::BigInt;

use crate::builder::ObjectBuilder;
use crate::context::Context;
use crate::error::StoreError;
use crate::operation::cast::{convert_boxed, StorageConverter};
use crate::problems::CastProblemAggregator;
use crate::storage::Storage;
use crate::types::value::big_decimal_from_f64;
use crate::types::{StorageType, Value};

fn can_apply_numeric(source: &StorageType) -> bool {
    source.is_numeric() || matches!(source, StorageType::Boolean | StorageType::AnyObject | StorageType::Null)
}

fn truncate(value: &BigDecimal) -> BigInt {
    value.with_scale_round(0, RoundingMode::Down).as_bigint_and_exponent().0
}

//==================================================================================
// BigInteger
//==================================================================================

/// Fractions are truncated toward zero. NaN and infinities cannot convert.
pub struct ToBigIntegerConverter;

fn big_integer_of(value: &Value) -> Option<BigInt> {
    match value {
        Value::Long(v) => Some(BigInt::from(*v)),
        Value::BigInteger(v) => Some(v.clone()),
        Value::Boolean(b) => Some(BigInt::from(i64::from(*b))),
        Value::Double(d) => big_decimal_from_f64(*d).map(|dec| truncate(&dec)),
        Value::BigDecimal(d) => Some(truncate(d)),
        _ => None,
    }
}

impl StorageConverter for ToBigIntegerConverter {
    fn target(&self) -> StorageType {
        StorageType::BigInteger
    }

    fn can_apply(&self, source: &StorageType) -> bool {
        can_apply_numeric(source)
    }

    fn convert(
        &self,
        storage: &Storage,
        ctx: &Context,
        problems: &CastProblemAggregator,
    ) -> Result<Storage, StoreError> {
        let builder = ObjectBuilder::<BigInt>::new(storage.size());
        convert_boxed(storage, builder, ctx, problems, |b, v| {
            b.append_item(big_integer_of(v)?);
            Some(())
        })
    }
}

//==================================================================================
// BigDecimal
//==================================================================================

/// Floats convert through their shortest round-trip decimal form.
pub struct ToBigDecimalConverter;

fn big_decimal_of(value: &Value) -> Option<BigDecimal> {
    match value {
        Value::Boolean(b) => Some(BigDecimal::from(i64::from(*b))),
        other => other.coerce_to_big_decimal(),
    }
}

impl StorageConverter for ToBigDecimalConverter {
    fn target(&self) -> StorageType {
        StorageType::BigDecimal
    }

    fn can_apply(&self, source: &StorageType) -> bool {
        can_apply_numeric(source)
    }

    fn convert(
        &self,
        storage: &Storage,
        ctx: &Context,
        problems: &CastProblemAggregator,
    ) -> Result<Storage, StoreError> {
        let builder = ObjectBuilder::<BigDecimal>::new(storage.size());
        convert_boxed(storage, builder, ctx, problems, |b, v| {
            b.append_item(big_decimal_of(v)?);
            Some(())
        })
    }
}
