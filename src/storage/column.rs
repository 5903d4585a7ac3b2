//! A named storage: the unit the embedding table abstraction manipulates.

use crate::storage::Storage;
use crate::types::StorageType;

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    storage: Storage,
}

impl Column {
    pub fn new(name: impl Into<String>, storage: Storage) -> Self {
        Self {
            name: name.into(),
            storage,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn into_storage(self) -> Storage {
        self.storage
    }

    pub fn size(&self) -> usize {
        self.storage.size()
    }

    pub fn storage_type(&self) -> StorageType {
        self.storage.storage_type()
    }

    pub fn with_storage(&self, storage: Storage) -> Column {
        Column::new(self.name.clone(), storage)
    }
}
