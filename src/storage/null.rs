//! A storage whose every row is null.

use crate::storage::StorageVariant;
use crate::types::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NullStorage {
    size: usize,
}

impl NullStorage {
    pub fn new(size: usize) -> Self {
        Self { size }
    }
}

impl StorageVariant for NullStorage {
    fn size(&self) -> usize {
        self.size
    }

    fn is_null_at(&self, _index: usize) -> bool {
        true
    }

    fn item_at(&self, _index: usize) -> Value {
        Value::Null
    }

    fn gather(&self, indices: &[Option<usize>]) -> Self {
        Self::new(indices.len())
    }

    fn slice(&self, _offset: usize, len: usize) -> Self {
        Self::new(len)
    }

    fn append_nulls(&self, count: usize) -> Self {
        Self::new(self.size + count)
    }
}
