use crate::builder::{value_mismatch, Builder};
use crate::error::StoreError;
use crate::null_handling::BitmapBuilder;
use crate::storage::{BoolStorage, Storage};
use crate::types::{StorageType, Value};

/// Accumulates booleans as two bit vectors: values and nulls.
#[derive(Debug, Clone)]
pub struct BoolBuilder {
    values: BitmapBuilder,
    nulls: BitmapBuilder,
    size: usize,
}

impl BoolBuilder {
    pub fn new(capacity: usize) -> Self {
        Self {
            values: BitmapBuilder::with_capacity(capacity),
            nulls: BitmapBuilder::with_capacity(capacity),
            size: 0,
        }
    }

    #[inline]
    pub fn append_boolean(&mut self, value: bool) {
        if value {
            self.values.set(self.size);
        }
        self.size += 1;
    }

    pub fn append_option(&mut self, value: Option<bool>) {
        match value {
            Some(v) => self.append_boolean(v),
            None => self.append_nulls(1),
        }
    }

    pub fn finish(self) -> BoolStorage {
        BoolStorage::new(
            self.values.finish(self.size),
            self.nulls.finish(self.size),
            false,
        )
    }
}

impl Builder for BoolBuilder {
    fn storage_type(&self) -> StorageType {
        StorageType::Boolean
    }

    fn append(&mut self, value: &Value) -> Result<(), StoreError> {
        match value {
            Value::Null => self.append_nulls(1),
            Value::Boolean(b) => self.append_boolean(*b),
            other => return Err(value_mismatch(self.storage_type(), other)),
        }
        Ok(())
    }

    fn append_nulls(&mut self, count: usize) {
        self.nulls.set_range(self.size, count);
        self.size += count;
    }

    fn append_bulk_storage(&mut self, storage: &Storage) -> Result<(), StoreError> {
        match storage {
            Storage::Bool(s) => {
                let count = storage.size();
                self.values.copy_from(self.size, &s.effective_values());
                self.nulls.copy_from(self.size, s.null_bitmap());
                self.size += count;
            }
            Storage::Null(_) => self.append_nulls(storage.size()),
            Storage::Mixed(_) | Storage::Facade(_) => {
                for i in 0..storage.size() {
                    self.append(&storage.item_at(i))?;
                }
            }
            other => {
                return Err(StoreError::type_mismatch(
                    self.storage_type(),
                    other.storage_type(),
                ))
            }
        }
        Ok(())
    }

    fn current_size(&self) -> usize {
        self.size
    }

    fn seal(self: Box<Self>) -> Storage {
        Storage::Bool(self.finish())
    }
}
