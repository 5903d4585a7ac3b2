use crate::builder::{value_mismatch, Builder};
use crate::error::StoreError;
use crate::storage::{NullStorage, Storage};
use crate::types::{StorageType, Value};

/// Counts rows; only accepts nulls.
#[derive(Debug, Clone, Default)]
pub struct NullBuilder {
    size: usize,
}

impl NullBuilder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Builder for NullBuilder {
    fn storage_type(&self) -> StorageType {
        StorageType::Null
    }

    fn append(&mut self, value: &Value) -> Result<(), StoreError> {
        if !value.is_nothing() {
            return Err(value_mismatch(StorageType::Null, value));
        }
        self.size += 1;
        Ok(())
    }

    fn append_nulls(&mut self, count: usize) {
        self.size += count;
    }

    fn append_bulk_storage(&mut self, storage: &Storage) -> Result<(), StoreError> {
        if let Some(i) = (0..storage.size()).find(|&i| !storage.is_null_at(i)) {
            return Err(value_mismatch(StorageType::Null, &storage.item_at(i)));
        }
        self.size += storage.size();
        Ok(())
    }

    fn current_size(&self) -> usize {
        self.size
    }

    fn seal(self: Box<Self>) -> Storage {
        Storage::Null(NullStorage::new(self.size))
    }
}
