//! Arithmetic, comparison and coalescing over the four numeric storages.
//!
//! Operands execute at the promoted [`NumericKind`] of the pair. Each row's
//! result is a [`Computed`] value which a [`NumericSink`] appends to the
//! builder of the operation's result kind.

pub mod arithmetic;
pub mod comparisons;
pub mod round;

use std::sync::OnceLock;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::builder::{Builder, DoubleBuilder, InferredIntegerBuilder, ObjectBuilder};
use crate::error::StoreError;
use crate::operation::map::{Comparison, OperationRegistry};
use crate::storage::Storage;
use crate::types::value::big_decimal_from_f64;
use crate::types::{NumericKind, Value};

use arithmetic::{Add, Divide, Max, Min, Modulo, Multiply, NumericArithmetic, Power, Subtract};
use comparisons::NumericComparison;

pub(crate) fn registry() -> &'static OperationRegistry {
    static REGISTRY: OnceLock<OperationRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut registry = OperationRegistry::new("numeric")
            .add(NumericArithmetic(Add))
            .add(NumericArithmetic(Subtract))
            .add(NumericArithmetic(Multiply))
            .add(NumericArithmetic(Divide))
            .add(NumericArithmetic(Modulo))
            .add(NumericArithmetic(Power))
            .add(NumericArithmetic(Min))
            .add(NumericArithmetic(Max));
        for comparison in Comparison::ALL {
            registry = registry.add(NumericComparison(comparison));
        }
        registry.built()
    })
}

/// One row's result, in whichever representation the operation produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Computed {
    Long(i64),
    BigInteger(BigInt),
    Double(f64),
    BigDecimal(BigDecimal),
    Nothing,
}

impl Computed {
    pub fn into_value(self) -> Value {
        match self {
            Computed::Long(v) => Value::Long(v),
            Computed::BigInteger(v) => Value::BigInteger(v),
            Computed::Double(v) => Value::Double(v),
            Computed::BigDecimal(v) => Value::BigDecimal(v),
            Computed::Nothing => Value::Null,
        }
    }
}

/// The output builder of a numeric operation, chosen by result kind.
pub(crate) enum NumericSink {
    Integer(InferredIntegerBuilder),
    Double(DoubleBuilder),
    BigInteger(ObjectBuilder<BigInt>),
    BigDecimal(ObjectBuilder<BigDecimal>),
}

impl NumericSink {
    pub(crate) fn for_kind(kind: NumericKind, capacity: usize) -> Self {
        match kind {
            NumericKind::Long => NumericSink::Integer(InferredIntegerBuilder::new(capacity)),
            NumericKind::Double => NumericSink::Double(DoubleBuilder::new(capacity)),
            NumericKind::BigInteger => NumericSink::BigInteger(ObjectBuilder::new(capacity)),
            NumericKind::BigDecimal => NumericSink::BigDecimal(ObjectBuilder::new(capacity)),
        }
    }

    pub(crate) fn push(&mut self, computed: Computed) -> Result<(), StoreError> {
        match (self, computed) {
            (NumericSink::Integer(b), Computed::Nothing) => b.append_nulls(1),
            (NumericSink::Integer(b), Computed::Long(v)) => b.append_long(v),
            (NumericSink::Integer(b), Computed::BigInteger(v)) => b.append_big_integer(v),

            (NumericSink::Double(b), Computed::Double(v)) => b.append_double(v),
            (NumericSink::Double(b), Computed::Long(v)) => b.append_double(v as f64),
            (NumericSink::Double(b), Computed::BigInteger(v)) => b.append_option(v.to_f64()),
            (NumericSink::Double(b), Computed::BigDecimal(v)) => b.append_option(v.to_f64()),
            (NumericSink::Double(b), Computed::Nothing) => b.append_option(None),

            (NumericSink::BigInteger(b), Computed::BigInteger(v)) => b.append_item(v),
            (NumericSink::BigInteger(b), Computed::Long(v)) => b.append_item(BigInt::from(v)),
            (NumericSink::BigInteger(b), Computed::Nothing) => b.append_option(None),

            (NumericSink::BigDecimal(b), Computed::BigDecimal(v)) => b.append_item(v),
            (NumericSink::BigDecimal(b), Computed::Long(v)) => b.append_item(BigDecimal::from(v)),
            (NumericSink::BigDecimal(b), Computed::BigInteger(v)) => {
                b.append_item(BigDecimal::new(v, 0))
            }
            (NumericSink::BigDecimal(b), Computed::Double(v)) => {
                b.append_option(big_decimal_from_f64(v))
            }
            (NumericSink::BigDecimal(b), Computed::Nothing) => b.append_option(None),

            (_, computed) => {
                return Err(StoreError::InternalError(format!(
                    "numeric result {computed:?} does not fit the operation's result kind"
                )))
            }
        }
        Ok(())
    }

    pub(crate) fn finish(self) -> Storage {
        match self {
            NumericSink::Integer(b) => b.finish(),
            NumericSink::Double(b) => Storage::Double(b.finish()),
            NumericSink::BigInteger(b) => Storage::BigInteger(b.finish()),
            NumericSink::BigDecimal(b) => Storage::BigDecimal(b.finish()),
        }
    }
}
