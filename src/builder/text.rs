use crate::builder::buffer::GrowableBuffer;
use crate::builder::{value_mismatch, Builder};
use crate::error::StoreError;
use crate::storage::{Storage, TextStorage};
use crate::types::{StorageType, TextType, Value};

/// Accumulates text under a length constraint. Values must already satisfy
/// the constraint; converters adapt them before appending.
#[derive(Debug, Clone)]
pub struct TextBuilder {
    data: GrowableBuffer<Option<String>>,
    ty: TextType,
}

impl TextBuilder {
    pub fn new(ty: TextType, capacity: usize) -> Self {
        Self {
            data: GrowableBuffer::with_capacity(capacity),
            ty,
        }
    }

    pub fn text_type(&self) -> TextType {
        self.ty
    }

    /// Whether `value` is a valid member of this builder's type.
    pub fn accepts_text(&self, value: &str) -> bool {
        match self.ty.max_length() {
            None => true,
            Some(n) if self.ty.is_fixed_length() => value.chars().count() == n,
            Some(n) => value.chars().count() <= n,
        }
    }

    /// Appends without checking the length constraint.
    #[inline]
    pub fn append_string(&mut self, value: String) {
        self.data.push(Some(value));
    }

    pub fn finish(self) -> TextStorage {
        TextStorage::new(self.data.into_vec(), self.ty)
    }
}

impl Builder for TextBuilder {
    fn storage_type(&self) -> StorageType {
        StorageType::Text(self.ty)
    }

    fn append(&mut self, value: &Value) -> Result<(), StoreError> {
        match value {
            Value::Null => self.append_nulls(1),
            Value::Text(s) if self.accepts_text(s) => self.append_string(s.clone()),
            other => return Err(value_mismatch(self.storage_type(), other)),
        }
        Ok(())
    }

    fn append_nulls(&mut self, count: usize) {
        self.data.push_repeated(None, count);
    }

    fn append_bulk_storage(&mut self, storage: &Storage) -> Result<(), StoreError> {
        match storage {
            Storage::Text(s) if self.ty.fits_exactly(&s.text_type()) => {
                for i in 0..storage.size() {
                    self.data.push(s.get(i).map(str::to_string));
                }
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
        self.data.len()
    }

    fn seal(self: Box<Self>) -> Storage {
        Storage::Text(self.finish())
    }
}
