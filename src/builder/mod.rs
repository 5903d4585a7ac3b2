//! Mutable, growable, single-owner accumulators that seal into storages.
//!
//! Every builder shares the [`GrowableBuffer`] growth policy and implements the
//! [`Builder`] trait, so operations can drive any of them through a
//! `Box<dyn Builder>`. Concrete builders also expose unboxed appends
//! (`append_long`, `append_double`, `append_boolean`) and a typed `finish`.

pub mod boolean;
pub mod buffer;
pub mod double;
pub mod inferred;
pub mod long;
pub mod null;
pub mod object;
pub mod text;

pub use boolean::BoolBuilder;
pub use buffer::GrowableBuffer;
pub use double::DoubleBuilder;
pub use inferred::InferredBuilder;
pub use long::{InferredIntegerBuilder, LongBuilder};
pub use null::NullBuilder;
pub use object::{ObjectBuilder, TypedItem};
pub use text::TextBuilder;

use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use num_bigint::BigInt;

use crate::error::StoreError;
use crate::problems::ProblemAggregator;
use crate::storage::Storage;
use crate::types::{IntegerType, StorageType, Value};

//==================================================================================
// 1. The Builder Contract
//==================================================================================

pub trait Builder {
    /// The type of the storage `seal` will produce.
    fn storage_type(&self) -> StorageType;

    /// Appends one boxed value. A value this builder cannot hold is a
    /// `ValueTypeMismatch` error.
    fn append(&mut self, value: &Value) -> Result<(), StoreError>;

    fn append_nulls(&mut self, count: usize);

    /// Appends every row of `storage`: a direct copy for a matching
    /// representation, per-element otherwise.
    fn append_bulk_storage(&mut self, storage: &Storage) -> Result<(), StoreError>;

    fn current_size(&self) -> usize;

    /// Consumes the builder; the storage has exactly `current_size` rows.
    fn seal(self: Box<Self>) -> Storage;
}

/// A builder able to hold values of `storage_type`.
///
/// Narrow integer types get a bound-checked builder that reports
/// out-of-range values to `problems` and stores null instead.
pub fn for_type(
    storage_type: StorageType,
    capacity: usize,
    problems: &ProblemAggregator,
) -> Box<dyn Builder> {
    match storage_type {
        StorageType::Integer(t) if t == IntegerType::INT_64 => {
            Box::new(LongBuilder::new(t, capacity))
        }
        StorageType::Integer(t) => Box::new(LongBuilder::bound_checked(t, capacity, problems)),
        StorageType::Float(_) => Box::new(DoubleBuilder::new(capacity)),
        StorageType::Boolean => Box::new(BoolBuilder::new(capacity)),
        StorageType::Text(t) => Box::new(TextBuilder::new(t, capacity)),
        StorageType::Date => Box::new(ObjectBuilder::<NaiveDate>::new(capacity)),
        StorageType::DateTime => Box::new(ObjectBuilder::<DateTime<FixedOffset>>::new(capacity)),
        StorageType::TimeOfDay => Box::new(ObjectBuilder::<NaiveTime>::new(capacity)),
        StorageType::BigInteger => Box::new(ObjectBuilder::<BigInt>::new(capacity)),
        StorageType::BigDecimal => Box::new(ObjectBuilder::<BigDecimal>::new(capacity)),
        StorageType::AnyObject => Box::new(ObjectBuilder::<Value>::new(capacity)),
        StorageType::Null => Box::new(NullBuilder::new()),
    }
}

//==================================================================================
// 2. Shared Helpers
//==================================================================================

pub(crate) fn value_mismatch(expected: StorageType, value: &Value) -> StoreError {
    StoreError::ValueTypeMismatch {
        expected: expected.to_string(),
        value: format!("{value} ({})", value.type_name()),
    }
}

/// Whether rows of `source` can be appended one by one into `target`.
pub(crate) fn accepts_boxed(target: &StorageType, source: &StorageType) -> bool {
    matches!(source, StorageType::AnyObject | StorageType::Null)
        || StorageType::common_type(target, source) == *target
}

/// The per-element fallback of `append_bulk_storage`.
pub(crate) fn append_boxed<B: Builder + ?Sized>(
    builder: &mut B,
    storage: &Storage,
) -> Result<(), StoreError> {
    let target = builder.storage_type();
    if !accepts_boxed(&target, &storage.storage_type()) {
        return Err(StoreError::type_mismatch(target, storage.storage_type()));
    }
    for i in 0..storage.size() {
        builder.append(&storage.item_at(i))?;
    }
    Ok(())
}

//==================================================================================
// 3. Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TextType;

    fn sample(storage_type: StorageType) -> Vec<Value> {
        match storage_type {
            StorageType::Integer(_) => vec![Value::Long(7)],
            StorageType::Float(_) => vec![Value::Double(1.5)],
            StorageType::Boolean => vec![Value::Boolean(true)],
            StorageType::Text(_) => vec![Value::from("abc")],
            StorageType::BigInteger => vec![Value::BigInteger(BigInt::from(9))],
            StorageType::Date => vec![Value::Date(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap())],
            StorageType::AnyObject => vec![Value::Other("obj".into())],
            _ => vec![],
        }
    }

    #[test]
    fn test_seal_size_and_null_pattern_for_every_builder() {
        let problems = ProblemAggregator::new();
        let types = [
            StorageType::INT_64,
            StorageType::Integer(IntegerType::INT_16),
            StorageType::FLOAT_64,
            StorageType::Boolean,
            StorageType::Text(TextType::VARIABLE_LENGTH),
            StorageType::BigInteger,
            StorageType::Date,
            StorageType::AnyObject,
            StorageType::Null,
        ];
        for storage_type in types {
            let mut builder = for_type(storage_type, 1, &problems);
            let values = sample(storage_type);
            for v in &values {
                builder.append(v).unwrap();
            }
            builder.append_nulls(3);
            let expected = builder.current_size();
            let storage = builder.seal();

            assert_eq!(storage.size(), expected, "{storage_type}");
            assert_eq!(storage.storage_type(), storage_type);
            for i in 0..values.len() {
                assert!(!storage.is_nothing(i).unwrap());
            }
            for i in values.len()..expected {
                assert!(storage.is_nothing(i).unwrap());
            }
        }
        assert!(problems.is_empty());
    }

    #[test]
    fn test_value_mismatch_is_an_error() {
        let problems = ProblemAggregator::new();
        let mut builder = for_type(StorageType::Boolean, 4, &problems);
        let err = builder.append(&Value::from("x")).unwrap_err();
        assert!(matches!(err, StoreError::ValueTypeMismatch { .. }));
    }

    #[test]
    fn test_bulk_append_rejects_foreign_type() {
        let problems = ProblemAggregator::new();
        let mut builder = for_type(StorageType::Boolean, 4, &problems);
        let text = Storage::make_empty(StorageType::TEXT, 2);
        let err = builder.append_bulk_storage(&text).unwrap_err();
        assert!(matches!(err, StoreError::StorageTypeMismatch { .. }));
    }

    #[test]
    fn test_bulk_append_of_null_storage_appends_nulls() {
        let problems = ProblemAggregator::new();
        let mut builder = for_type(StorageType::FLOAT_64, 0, &problems);
        builder.append(&Value::Double(1.0)).unwrap();
        builder
            .append_bulk_storage(&Storage::make_empty(StorageType::Null, 2))
            .unwrap();
        let storage = builder.seal();
        assert_eq!(storage.count_missing(), 2);
        assert_eq!(storage.size(), 3);
    }
}
