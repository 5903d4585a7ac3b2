//! 64-bit float storage.

use std::sync::Arc;

use crate::null_handling::Bitmap;
use crate::storage::StorageVariant;
use crate::types::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct DoubleStorage {
    data: Arc<[f64]>,
    nulls: Bitmap,
}

impl DoubleStorage {
    pub fn new(data: Vec<f64>, nulls: Bitmap) -> Self {
        debug_assert_eq!(data.len(), nulls.len());
        Self {
            data: data.into(),
            nulls,
        }
    }

    pub fn from_options(values: Vec<Option<f64>>) -> Self {
        let nulls: Bitmap = values.iter().map(Option::is_none).collect();
        let data = values.into_iter().map(|v| v.unwrap_or(0.0)).collect();
        Self::new(data, nulls)
    }

    pub fn make_empty(size: usize) -> Self {
        Self::new(vec![0.0; size], Bitmap::filled(size))
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<f64> {
        if self.nulls.get(index) {
            None
        } else {
            self.data.get(index).copied()
        }
    }

    pub fn raw_values(&self) -> &[f64] {
        &self.data
    }

    pub fn null_bitmap(&self) -> &Bitmap {
        &self.nulls
    }
}

impl StorageVariant for DoubleStorage {
    fn size(&self) -> usize {
        self.data.len()
    }

    fn is_null_at(&self, index: usize) -> bool {
        self.nulls.get(index)
    }

    fn item_at(&self, index: usize) -> Value {
        self.get(index).map_or(Value::Null, Value::Double)
    }

    fn gather(&self, indices: &[Option<usize>]) -> Self {
        let data = indices
            .iter()
            .map(|ix| ix.map_or(0.0, |i| self.data[i]))
            .collect::<Vec<_>>();
        Self::new(data, self.nulls.gather(indices.iter().copied(), true))
    }

    fn slice(&self, offset: usize, len: usize) -> Self {
        Self::new(
            self.data[offset..offset + len].to_vec(),
            self.nulls.slice(offset, len),
        )
    }

    fn append_nulls(&self, count: usize) -> Self {
        let mut data = self.data.to_vec();
        data.resize(data.len() + count, 0.0);
        Self::new(data, self.nulls.extended(count, true))
    }
}
