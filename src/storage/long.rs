//! 64-bit integer storage with an integer-width label.

use std::sync::Arc;

use crate::null_handling::Bitmap;
use crate::storage::StorageVariant;
use crate::types::{IntegerType, Value};

/// Values are held as `i64` regardless of the declared width; the width is a
/// promise that every non-null value fits it. Null slots hold `0`.
#[derive(Debug, Clone, PartialEq)]
pub struct LongStorage {
    data: Arc<[i64]>,
    nulls: Bitmap,
    ty: IntegerType,
}

impl LongStorage {
    pub fn new(data: Vec<i64>, nulls: Bitmap, ty: IntegerType) -> Self {
        debug_assert_eq!(data.len(), nulls.len());
        Self {
            data: data.into(),
            nulls,
            ty,
        }
    }

    pub fn from_options(values: Vec<Option<i64>>, ty: IntegerType) -> Self {
        let nulls: Bitmap = values.iter().map(Option::is_none).collect();
        let data = values.into_iter().map(|v| v.unwrap_or(0)).collect();
        Self::new(data, nulls, ty)
    }

    pub fn make_empty(size: usize, ty: IntegerType) -> Self {
        Self::new(vec![0; size], Bitmap::filled(size), ty)
    }

    pub fn integer_type(&self) -> IntegerType {
        self.ty
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<i64> {
        if self.nulls.get(index) {
            None
        } else {
            self.data.get(index).copied()
        }
    }

    pub fn raw_values(&self) -> &[i64] {
        &self.data
    }

    pub fn null_bitmap(&self) -> &Bitmap {
        &self.nulls
    }

    /// Re-labels as a wider type without copying. Returns `None` if `target`
    /// is narrower than the current type.
    pub fn widen(&self, target: IntegerType) -> Option<LongStorage> {
        if !target.fits_type(&self.ty) {
            return None;
        }
        Some(Self {
            data: Arc::clone(&self.data),
            nulls: self.nulls.clone(),
            ty: target,
        })
    }

    /// Smallest and largest non-null values, if any.
    pub fn min_max(&self) -> Option<(i64, i64)> {
        (0..self.data.len())
            .filter_map(|i| self.get(i))
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// The narrowest of 16, 32 and 64 bits holding every value. Types of 16
    /// bits or fewer are already as small as this inference goes.
    pub fn infer_precise_type_shrunk(&self) -> IntegerType {
        if self.ty.bits() <= 16 {
            return self.ty;
        }
        let Some((min, max)) = self.min_max() else {
            return IntegerType::INT_64;
        };
        shrink_range(min, max)
    }
}

pub(crate) fn shrink_range(min: i64, max: i64) -> IntegerType {
    [IntegerType::INT_16, IntegerType::INT_32]
        .into_iter()
        .find(|t| t.fits(min) && t.fits(max))
        .unwrap_or(IntegerType::INT_64)
}

impl StorageVariant for LongStorage {
    fn size(&self) -> usize {
        self.data.len()
    }

    fn is_null_at(&self, index: usize) -> bool {
        self.nulls.get(index)
    }

    fn item_at(&self, index: usize) -> Value {
        self.get(index).map_or(Value::Null, Value::Long)
    }

    fn gather(&self, indices: &[Option<usize>]) -> Self {
        let data = indices
            .iter()
            .map(|ix| ix.map_or(0, |i| self.data[i]))
            .collect::<Vec<_>>();
        let nulls = self.nulls.gather(indices.iter().copied(), true);
        Self::new(data, nulls, self.ty)
    }

    fn slice(&self, offset: usize, len: usize) -> Self {
        let data = self.data[offset..offset + len].to_vec();
        Self::new(data, self.nulls.slice(offset, len), self.ty)
    }

    fn append_nulls(&self, count: usize) -> Self {
        let mut data = self.data.to_vec();
        data.resize(data.len() + count, 0);
        Self::new(data, self.nulls.extended(count, true), self.ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shrunk_type_picks_smallest_fit() {
        let s = LongStorage::from_options(vec![Some(1), None, Some(40_000)], IntegerType::INT_64);
        assert_eq!(s.infer_precise_type_shrunk(), IntegerType::INT_32);

        let s = LongStorage::from_options(vec![Some(-5), Some(7)], IntegerType::INT_64);
        assert_eq!(s.infer_precise_type_shrunk(), IntegerType::INT_16);

        let s = LongStorage::from_options(vec![Some(1)], IntegerType::INT_8);
        assert_eq!(s.infer_precise_type_shrunk(), IntegerType::INT_8);
    }

    #[test]
    fn test_widen_shares_buffer() {
        let s = LongStorage::from_options(vec![Some(1), Some(2)], IntegerType::INT_16);
        let wide = s.widen(IntegerType::INT_64).unwrap();
        assert_eq!(wide.integer_type(), IntegerType::INT_64);
        assert!(std::ptr::eq(wide.raw_values().as_ptr(), s.raw_values().as_ptr()));
        assert!(wide.widen(IntegerType::INT_8).is_none());
    }
}
