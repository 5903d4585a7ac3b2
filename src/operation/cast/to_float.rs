use num_traits::ToPrimitive;

use crate::builder::{Builder, DoubleBuilder};
use crate::context::Context;
use crate::error::StoreError;
use crate::operation::cast::{convert_boxed, StorageConverter};
use crate::operation::iterators::{build_over_booleans, build_over_items, build_over_longs};
use crate::problems::CastProblemAggregator;
use crate::storage::Storage;
use crate::types::{StorageType, Value};

pub struct ToFloatConverter;

fn double_of(value: &Value) -> Option<f64> {
    match value {
        Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
        other => other.coerce_to_double(),
    }
}

impl StorageConverter for ToFloatConverter {
    fn target(&self) -> StorageType {
        StorageType::FLOAT_64
    }

    fn can_apply(&self, source: &StorageType) -> bool {
        source.is_numeric() || matches!(source, StorageType::Boolean | StorageType::AnyObject | StorageType::Null)
    }

    fn convert(
        &self,
        storage: &Storage,
        ctx: &Context,
        problems: &CastProblemAggregator,
    ) -> Result<Storage, StoreError> {
        let len = storage.size();
        match storage {
            Storage::Long(s) => build_over_longs(s, DoubleBuilder::new(len), ctx, |b, _, v| {
                b.append_double(v as f64);
                Ok(())
            }),
            Storage::Bool(s) => build_over_booleans(s, DoubleBuilder::new(len), ctx, |b, _, v| {
                b.append_double(if v { 1.0 } else { 0.0 });
                Ok(())
            }),
            Storage::BigInteger(s) => build_over_items(s, DoubleBuilder::new(len), ctx, |b, _, v| {
                match v.to_f64() {
                    Some(d) => b.append_double(d),
                    None => {
                        problems.report_conversion_failure(&Value::BigInteger(v.clone()));
                        b.append_nulls(1);
                    }
                }
                Ok(())
            }),
            _ => convert_boxed(storage, DoubleBuilder::new(len), ctx, problems, |b, v| {
                b.append_double(double_of(v)?);
                Some(())
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::cast::cast_storage;
    use crate::problems::ProblemAggregator;
    use crate::storage::{BoolStorage, LongStorage, ObjectStorage};
    use crate::types::IntegerType;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    #[test]
    fn test_integers_and_booleans_become_floats() {
        let ctx = Context::default();
        let parent = ProblemAggregator::new();
        let problems = CastProblemAggregator::new(&parent, "f", StorageType::FLOAT_64);
        let longs = Storage::Long(LongStorage::from_options(vec![Some(3), None], IntegerType::INT_32));
        let out = cast_storage(&longs, StorageType::FLOAT_64, &ctx, &problems).unwrap();
        assert_eq!(out.to_values(), vec![Value::Double(3.0), Value::Null]);

        let bools = Storage::Bool(BoolStorage::from_options(vec![Some(true), Some(false)]));
        let out = cast_storage(&bools, StorageType::FLOAT_64, &ctx, &problems).unwrap();
        assert_eq!(out.to_values(), vec![Value::Double(1.0), Value::Double(0.0)]);
        assert!(parent.is_empty());
    }

    #[test]
    fn test_mixed_text_is_a_conversion_failure() {
        let ctx = Context::default();
        let parent = ProblemAggregator::new();
        let problems = CastProblemAggregator::new(&parent, "f", StorageType::FLOAT_64);
        let mixed = Storage::Mixed(ObjectStorage::new(vec![
            Some(Value::BigDecimal(BigDecimal::from_str("2.5").unwrap())),
            Some(Value::from("2.5")),
        ]));
        let out = cast_storage(&mixed, StorageType::FLOAT_64, &ctx, &problems).unwrap();
        assert_eq!(out.to_values(), vec![Value::Double(2.5), Value::Null]);
        assert_eq!(parent.count("conversion_failure"), 1);
    }
}
