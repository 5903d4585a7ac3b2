//! Index-remapping descriptors used by masking and slicing.

use crate::error::StoreError;

/// Maps every output position to a source position, or to nothing.
///
/// A `None` position produces a null row in the remapped storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderMask {
    positions: Vec<Option<usize>>,
}

impl OrderMask {
    pub fn new(positions: Vec<Option<usize>>) -> Self {
        Self { positions }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Option<usize>] {
        &self.positions
    }

    /// Fails if any position points past `size`.
    pub(crate) fn check_bounds(&self, size: usize) -> Result<(), StoreError> {
        match self.positions.iter().flatten().find(|&&p| p >= size) {
            Some(&index) => Err(StoreError::IndexOutOfBounds { index, size }),
            None => Ok(()),
        }
    }
}

/// A half-open `[start, end)` interval of rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceRange {
    pub start: usize,
    pub end: usize,
}

impl SliceRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn total_length(ranges: &[SliceRange]) -> usize {
        ranges.iter().map(SliceRange::len).sum()
    }
}
