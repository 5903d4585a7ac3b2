//! Boxed storage: a slot holding no value is null.
//!
//! One generic container backs the big-number, temporal and mixed variants.

use std::sync::Arc;

use crate::storage::StorageVariant;
use crate::types::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectStorage<T> {
    data: Arc<[Option<T>]>,
}

impl<T: Clone + Into<Value>> ObjectStorage<T> {
    pub fn new(data: Vec<Option<T>>) -> Self {
        Self { data: data.into() }
    }

    pub fn make_empty(size: usize) -> Self {
        Self::new(vec![None; size])
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.data.get(index).and_then(Option::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&T>> + '_ {
        self.data.iter().map(Option::as_ref)
    }

    pub fn values(&self) -> &[Option<T>] {
        &self.data
    }
}

impl<T: Clone + Into<Value>> StorageVariant for ObjectStorage<T> {
    fn size(&self) -> usize {
        self.data.len()
    }

    fn is_null_at(&self, index: usize) -> bool {
        self.get(index).is_none()
    }

    fn item_at(&self, index: usize) -> Value {
        self.get(index).cloned().map_or(Value::Null, Into::into)
    }

    fn gather(&self, indices: &[Option<usize>]) -> Self {
        Self::new(
            indices
                .iter()
                .map(|ix| ix.and_then(|i| self.data[i].clone()))
                .collect(),
        )
    }

    fn slice(&self, offset: usize, len: usize) -> Self {
        Self::new(self.data[offset..offset + len].to_vec())
    }

    fn append_nulls(&self, count: usize) -> Self {
        let mut data = self.data.to_vec();
        data.resize(data.len() + count, None);
        Self::new(data)
    }
}
