//! Text storage, labelled with its length constraint.

use crate::storage::object::ObjectStorage;
use crate::storage::StorageVariant;
use crate::types::{TextType, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct TextStorage {
    data: ObjectStorage<String>,
    ty: TextType,
}

impl TextStorage {
    pub fn new(data: Vec<Option<String>>, ty: TextType) -> Self {
        Self {
            data: ObjectStorage::new(data),
            ty,
        }
    }

    pub fn from_strs(values: &[Option<&str>], ty: TextType) -> Self {
        Self::new(
            values.iter().map(|v| v.map(str::to_string)).collect(),
            ty,
        )
    }

    pub fn make_empty(size: usize, ty: TextType) -> Self {
        Self {
            data: ObjectStorage::make_empty(size),
            ty,
        }
    }

    pub fn text_type(&self) -> TextType {
        self.ty
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.data.get(index).map(String::as_str)
    }

    /// The same values under another label, without copying.
    pub fn retype(&self, ty: TextType) -> Self {
        Self {
            data: self.data.clone(),
            ty,
        }
    }

    /// Shortest and longest non-null value lengths, in characters.
    pub fn length_range(&self) -> Option<(usize, usize)> {
        self.data
            .iter()
            .flatten()
            .map(|s| s.chars().count())
            .fold(None, |acc, len| match acc {
                None => Some((len, len)),
                Some((lo, hi)) => Some((lo.min(len), hi.max(len))),
            })
    }

    /// Fixed length when all values share one positive length; a bounded
    /// `short_limit` type when every value is short; the current type otherwise.
    pub fn infer_precise_type_shrunk(&self, short_limit: usize) -> TextType {
        if self.ty.is_fixed_length() {
            return self.ty;
        }
        let (min, max) = self.length_range().unwrap_or((0, 0));
        if min == max && max > 0 {
            return TextType::fixed_length(max);
        }
        let loosely_bounded = self.ty.max_length().map_or(true, |limit| limit > short_limit);
        if max <= short_limit && loosely_bounded {
            return TextType::variable_length_with_limit(short_limit);
        }
        self.ty
    }
}

impl StorageVariant for TextStorage {
    fn size(&self) -> usize {
        self.data.size()
    }

    fn is_null_at(&self, index: usize) -> bool {
        self.data.is_null_at(index)
    }

    fn item_at(&self, index: usize) -> Value {
        self.data.item_at(index)
    }

    fn gather(&self, indices: &[Option<usize>]) -> Self {
        Self {
            data: self.data.gather(indices),
            ty: self.ty,
        }
    }

    fn slice(&self, offset: usize, len: usize) -> Self {
        Self {
            data: self.data.slice(offset, len),
            ty: self.ty,
        }
    }

    fn append_nulls(&self, count: usize) -> Self {
        Self {
            data: self.data.append_nulls(count),
            ty: self.ty,
        }
    }
}
