//! A builder that discovers its type from the values it receives.

use crate::builder::{for_type, Builder};
use crate::error::StoreError;
use crate::problems::ProblemAggregator;
use crate::storage::{NullStorage, Storage};
use crate::types::{StorageType, Value};

/// Starts untyped; the first non-null value picks a typed builder. A later
/// value that builder rejects widens it to the common type of both, falling
/// back to mixed.
pub struct InferredBuilder {
    capacity: usize,
    leading_nulls: usize,
    current: Option<Box<dyn Builder>>,
    problems: ProblemAggregator,
}

impl InferredBuilder {
    pub fn new(capacity: usize, problems: &ProblemAggregator) -> Self {
        Self {
            capacity,
            leading_nulls: 0,
            current: None,
            problems: problems.clone(),
        }
    }

    fn start(&mut self, storage_type: StorageType) {
        let mut builder = for_type(storage_type, self.capacity, &self.problems);
        builder.append_nulls(self.leading_nulls);
        self.current = Some(builder);
    }

    fn append_to_current(&mut self, value: &Value) -> Result<(), StoreError> {
        match self.current.as_mut() {
            Some(builder) => builder.append(value),
            None => Err(StoreError::InternalError(
                "inferred builder has no delegate".into(),
            )),
        }
    }

    fn retype_for(&mut self, value: &Value) -> Result<(), StoreError> {
        let Some(old) = self.current.take() else {
            return Ok(());
        };
        let old_type = old.storage_type();
        let mut target = StorageType::common_type(&old_type, &StorageType::of_value(value));
        if target == old_type {
            target = StorageType::AnyObject;
        }
        log_metric!("event" = "builder_retype", "from" = old_type, "to" = target);

        let sealed = old.seal();
        let capacity = self.capacity.max(sealed.size() + 1);
        let mut builder = for_type(target, capacity, &self.problems);
        builder.append_bulk_storage(&sealed)?;
        self.current = Some(builder);
        Ok(())
    }

    pub fn finish(self) -> Storage {
        match self.current {
            Some(builder) => builder.seal(),
            None => Storage::Null(NullStorage::new(self.leading_nulls)),
        }
    }
}

impl Builder for InferredBuilder {
    fn storage_type(&self) -> StorageType {
        self.current
            .as_ref()
            .map_or(StorageType::Null, |b| b.storage_type())
    }

    fn append(&mut self, value: &Value) -> Result<(), StoreError> {
        if value.is_nothing() {
            self.append_nulls(1);
            return Ok(());
        }
        if self.current.is_none() {
            self.start(StorageType::of_value(value));
        }
        match self.append_to_current(value) {
            Err(StoreError::ValueTypeMismatch { .. }) => {
                self.retype_for(value)?;
                self.append_to_current(value)
            }
            other => other,
        }
    }

    fn append_nulls(&mut self, count: usize) {
        match self.current.as_mut() {
            Some(builder) => builder.append_nulls(count),
            None => self.leading_nulls += count,
        }
    }

    fn append_bulk_storage(&mut self, storage: &Storage) -> Result<(), StoreError> {
        for i in 0..storage.size() {
            self.append(&storage.item_at(i))?;
        }
        Ok(())
    }

    fn current_size(&self) -> usize {
        self.current
            .as_ref()
            .map_or(self.leading_nulls, |b| b.current_size())
    }

    fn seal(self: Box<Self>) -> Storage {
        (*self).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    fn infer(values: &[Value]) -> Storage {
        let problems = ProblemAggregator::new();
        let mut builder = InferredBuilder::new(values.len(), &problems);
        for v in values {
            builder.append(v).unwrap();
        }
        assert!(problems.is_empty());
        builder.finish()
    }

    #[test]
    fn test_all_nulls_give_null_storage() {
        let storage = infer(&[Value::Null, Value::Null]);
        assert_eq!(storage.storage_type(), StorageType::Null);
        assert_eq!(storage.size(), 2);
    }

    #[test]
    fn test_integers_then_float_widen_to_float() {
        let storage = infer(&[Value::Null, Value::Long(1), Value::Double(2.5)]);
        assert_eq!(storage.storage_type(), StorageType::FLOAT_64);
        assert_eq!(
            storage.to_values(),
            vec![Value::Null, Value::Double(1.0), Value::Double(2.5)]
        );
    }

    #[test]
    fn test_huge_integer_promotes_to_big_integer() {
        let huge: BigInt = BigInt::from(i64::MAX) + 1;
        let storage = infer(&[Value::Long(3), Value::BigInteger(huge.clone())]);
        assert_eq!(storage.storage_type(), StorageType::BigInteger);
        assert_eq!(storage.get_item_boxed(1).unwrap(), Value::BigInteger(huge));
    }

    #[test]
    fn test_unrelated_values_fall_back_to_mixed() {
        let storage = infer(&[Value::Long(1), Value::from("a"), Value::Boolean(true)]);
        assert_eq!(storage.storage_type(), StorageType::AnyObject);
        assert_eq!(storage.get_item_boxed(1).unwrap(), Value::from("a"));
        assert_eq!(storage.size(), 3);
    }
}
