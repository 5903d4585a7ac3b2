use crate::builder::buffer::GrowableBuffer;
use crate::builder::{append_boxed, value_mismatch, Builder};
use crate::error::StoreError;
use crate::null_handling::BitmapBuilder;
use crate::storage::{DoubleStorage, Storage};
use crate::types::{StorageType, Value};

#[derive(Debug, Clone)]
pub struct DoubleBuilder {
    data: GrowableBuffer<f64>,
    nulls: BitmapBuilder,
}

impl DoubleBuilder {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: GrowableBuffer::with_capacity(capacity),
            nulls: BitmapBuilder::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn append_double(&mut self, value: f64) {
        self.data.push(value);
    }

    pub fn append_option(&mut self, value: Option<f64>) {
        match value {
            Some(v) => self.append_double(v),
            None => self.append_nulls(1),
        }
    }

    pub fn finish(self) -> DoubleStorage {
        let len = self.data.len();
        DoubleStorage::new(self.data.into_vec(), self.nulls.finish(len))
    }
}

impl Builder for DoubleBuilder {
    fn storage_type(&self) -> StorageType {
        StorageType::FLOAT_64
    }

    fn append(&mut self, value: &Value) -> Result<(), StoreError> {
        if value.is_nothing() {
            self.append_nulls(1);
            return Ok(());
        }
        match value.coerce_to_double() {
            Some(d) => {
                self.append_double(d);
                Ok(())
            }
            None => Err(value_mismatch(self.storage_type(), value)),
        }
    }

    fn append_nulls(&mut self, count: usize) {
        self.nulls.set_range(self.data.len(), count);
        self.data.push_repeated(0.0, count);
    }

    fn append_bulk_storage(&mut self, storage: &Storage) -> Result<(), StoreError> {
        match storage {
            Storage::Null(_) => self.append_nulls(storage.size()),
            Storage::Double(s) => {
                let start = self.data.len();
                self.data.extend_from_slice(s.raw_values());
                self.nulls.copy_from(start, s.null_bitmap());
            }
            Storage::Long(s) => {
                for i in 0..s.raw_values().len() {
                    self.append_option(s.get(i).map(|v| v as f64));
                }
            }
            other => append_boxed(self, other)?,
        }
        Ok(())
    }

    fn current_size(&self) -> usize {
        self.data.len()
    }

    fn seal(self: Box<Self>) -> Storage {
        Storage::Double(self.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LongStorage;
    use crate::types::IntegerType;

    #[test]
    fn test_accepts_every_numeric_kind() {
        let mut builder = DoubleBuilder::new(0);
        builder.append(&Value::Long(2)).unwrap();
        builder.append(&Value::Double(0.5)).unwrap();
        builder.append(&Value::BigInteger(num_bigint::BigInt::from(3))).unwrap();
        builder.append(&Value::Null).unwrap();
        assert!(builder.append(&Value::Boolean(true)).is_err());

        let storage = builder.finish();
        assert_eq!(storage.get(0), Some(2.0));
        assert_eq!(storage.get(2), Some(3.0));
        assert_eq!(storage.get(3), None);
    }

    #[test]
    fn test_bulk_append_converts_integers() {
        let longs = LongStorage::from_options(vec![Some(1), None], IntegerType::INT_64);
        let mut builder = DoubleBuilder::new(2);
        builder.append_bulk_storage(&Storage::Long(longs)).unwrap();
        let storage = builder.finish();
        assert_eq!(storage.get(0), Some(1.0));
        assert_eq!(storage.get(1), None);
    }
}
