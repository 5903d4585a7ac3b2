//! The builder behind every boxed storage: big numbers, temporals and mixed.

use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use num_bigint::BigInt;

use crate::builder::buffer::GrowableBuffer;
use crate::builder::{append_boxed, value_mismatch, Builder};
use crate::error::StoreError;
use crate::storage::{ObjectStorage, Storage};
use crate::types::{StorageType, Value};

/// An element type that has its own boxed storage variant.
pub trait TypedItem: Clone + Into<Value> + Sized + 'static {
    const STORAGE_TYPE: StorageType;

    /// Extracts an item from a non-null value, if the value is of this kind
    /// or converts losslessly into it.
    fn from_value(value: &Value) -> Option<Self>;

    fn wrap(storage: ObjectStorage<Self>) -> Storage;

    fn unwrap(storage: &Storage) -> Option<&ObjectStorage<Self>>;
}

macro_rules! impl_typed_item {
    ($item:ty, $variant:ident, $storage_type:expr, |$v:ident| $extract:expr) => {
        impl TypedItem for $item {
            const STORAGE_TYPE: StorageType = $storage_type;

            fn from_value($v: &Value) -> Option<Self> {
                $extract
            }

            fn wrap(storage: ObjectStorage<Self>) -> Storage {
                Storage::$variant(storage)
            }

            fn unwrap(storage: &Storage) -> Option<&ObjectStorage<Self>> {
                match storage {
                    Storage::$variant(s) => Some(s),
                    _ => None,
                }
            }
        }
    };
}

impl_typed_item!(BigInt, BigInteger, StorageType::BigInteger, |v| v.coerce_to_big_integer());
impl_typed_item!(BigDecimal, BigDecimal, StorageType::BigDecimal, |v| v.coerce_to_big_decimal());
impl_typed_item!(NaiveDate, Date, StorageType::Date, |v| match v {
    Value::Date(d) => Some(*d),
    _ => None,
});
impl_typed_item!(DateTime<FixedOffset>, DateTime, StorageType::DateTime, |v| match v {
    Value::DateTime(d) => Some(*d),
    _ => None,
});
impl_typed_item!(NaiveTime, TimeOfDay, StorageType::TimeOfDay, |v| match v {
    Value::TimeOfDay(t) => Some(*t),
    _ => None,
});
// A mixed slot never holds `Some(Value::Null)`; nulls are `None`.
impl_typed_item!(Value, Mixed, StorageType::AnyObject, |v| (!v.is_nothing()).then(|| v.clone()));

#[derive(Debug, Clone)]
pub struct ObjectBuilder<T> {
    data: GrowableBuffer<Option<T>>,
}

impl<T: TypedItem> ObjectBuilder<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: GrowableBuffer::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn append_item(&mut self, item: T) {
        self.data.push(Some(item));
    }

    pub fn append_option(&mut self, item: Option<T>) {
        self.data.push(item);
    }

    pub fn finish(self) -> ObjectStorage<T> {
        ObjectStorage::new(self.data.into_vec())
    }
}

impl<T: TypedItem> Builder for ObjectBuilder<T> {
    fn storage_type(&self) -> StorageType {
        T::STORAGE_TYPE
    }

    fn append(&mut self, value: &Value) -> Result<(), StoreError> {
        if value.is_nothing() {
            self.data.push(None);
            return Ok(());
        }
        match T::from_value(value) {
            Some(item) => {
                self.append_item(item);
                Ok(())
            }
            None => Err(value_mismatch(self.storage_type(), value)),
        }
    }

    fn append_nulls(&mut self, count: usize) {
        self.data.push_repeated(None, count);
    }

    fn append_bulk_storage(&mut self, storage: &Storage) -> Result<(), StoreError> {
        if let Some(same) = T::unwrap(storage) {
            self.data.extend_from_slice(same.values());
            return Ok(());
        }
        match storage {
            Storage::Null(_) => {
                self.append_nulls(storage.size());
                Ok(())
            }
            other => append_boxed(self, other),
        }
    }

    fn current_size(&self) -> usize {
        self.data.len()
    }

    fn seal(self: Box<Self>) -> Storage {
        T::wrap(self.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LongStorage;
    use crate::types::IntegerType;

    #[test]
    fn test_mixed_builder_keeps_heterogeneous_values() {
        let mut builder = ObjectBuilder::<Value>::new(2);
        builder.append(&Value::Long(1)).unwrap();
        builder.append(&Value::from("a")).unwrap();
        builder.append(&Value::Null).unwrap();
        let storage = Box::new(builder).seal();

        assert_eq!(storage.storage_type(), StorageType::AnyObject);
        assert_eq!(
            storage.to_values(),
            vec![Value::Long(1), Value::from("a"), Value::Null]
        );
    }

    #[test]
    fn test_big_integer_builder_widens_longs() {
        let longs = LongStorage::from_options(vec![Some(4), None], IntegerType::INT_32);
        let mut builder = ObjectBuilder::<BigInt>::new(0);
        builder.append_bulk_storage(&Storage::Long(longs)).unwrap();
        let storage = builder.finish();
        assert_eq!(storage.get(0), Some(&BigInt::from(4)));
        assert_eq!(storage.get(1), None);
    }

    #[test]
    fn test_date_builder_rejects_text() {
        let mut builder = ObjectBuilder::<NaiveDate>::new(1);
        assert!(builder.append(&Value::from("2020-01-01")).is_err());
    }
}
