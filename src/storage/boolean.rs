//! Bit-packed boolean storage.
//!
//! Logical NOT is a flag flip: the `negated` flag inverts every stored value
//! bit on read, so `not` never rewrites the value bitmap.

use crate::null_handling::Bitmap;
use crate::storage::StorageVariant;
use crate::types::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct BoolStorage {
    values: Bitmap,
    nulls: Bitmap,
    negated: bool,
}

impl BoolStorage {
    pub fn new(values: Bitmap, nulls: Bitmap, negated: bool) -> Self {
        debug_assert_eq!(values.len(), nulls.len());
        Self {
            values,
            nulls,
            negated,
        }
    }

    pub fn from_options(values: Vec<Option<bool>>) -> Self {
        let nulls: Bitmap = values.iter().map(Option::is_none).collect();
        let bits: Bitmap = values.into_iter().map(|v| v.unwrap_or(false)).collect();
        Self::new(bits, nulls, false)
    }

    pub fn make_empty(size: usize) -> Self {
        Self::new(Bitmap::zeroed(size), Bitmap::filled(size), false)
    }

    /// A storage of `size` copies of `value`.
    pub fn repeated(value: bool, size: usize) -> Self {
        Self::new(Bitmap::zeroed(size), Bitmap::zeroed(size), value)
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<bool> {
        if self.nulls.get(index) || index >= self.values.len() {
            None
        } else {
            Some(self.values.get(index) != self.negated)
        }
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    pub fn null_bitmap(&self) -> &Bitmap {
        &self.nulls
    }

    /// Value bits with the negation applied.
    pub fn effective_values(&self) -> Bitmap {
        if self.negated {
            self.values.negated()
        } else {
            self.values.clone()
        }
    }

    /// Logical NOT; nulls stay null.
    pub fn not(&self) -> Self {
        Self {
            values: self.values.clone(),
            nulls: self.nulls.clone(),
            negated: !self.negated,
        }
    }

    /// Replaces every null with `fill`.
    pub fn fill_missing(&self, fill: bool) -> Self {
        let values: Bitmap = (0..self.size())
            .map(|i| self.get(i).unwrap_or(fill))
            .collect();
        Self::new(values, Bitmap::zeroed(self.size()), false)
    }
}

impl StorageVariant for BoolStorage {
    fn size(&self) -> usize {
        self.values.len()
    }

    fn is_null_at(&self, index: usize) -> bool {
        self.nulls.get(index)
    }

    fn item_at(&self, index: usize) -> Value {
        self.get(index).map_or(Value::Null, Value::Boolean)
    }

    fn gather(&self, indices: &[Option<usize>]) -> Self {
        Self::new(
            self.values.gather(indices.iter().copied(), false),
            self.nulls.gather(indices.iter().copied(), true),
            self.negated,
        )
    }

    fn slice(&self, offset: usize, len: usize) -> Self {
        Self::new(
            self.values.slice(offset, len),
            self.nulls.slice(offset, len),
            self.negated,
        )
    }

    fn append_nulls(&self, count: usize) -> Self {
        Self::new(
            self.values.extended(count, false),
            self.nulls.extended(count, true),
            self.negated,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_is_involutive_and_keeps_nulls() {
        let s = BoolStorage::from_options(vec![Some(true), None, Some(false)]);
        let once = s.not();
        assert_eq!(once.get(0), Some(false));
        assert_eq!(once.get(1), None);
        assert_eq!(once.get(2), Some(true));
        assert_eq!(once.not(), s);
    }

    #[test]
    fn test_fill_missing_clears_negation() {
        let s = BoolStorage::from_options(vec![Some(true), None]).not();
        let filled = s.fill_missing(true);
        assert!(!filled.is_negated());
        assert_eq!(filled.get(0), Some(false));
        assert_eq!(filled.get(1), Some(true));
    }
}
