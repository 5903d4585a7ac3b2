//! A shared, immutable bit vector with copy-on-write mutation.
//!
//! Storages hand the same `Bitmap` to every slice or derived storage that keeps
//! the bits unchanged; the underlying `BitVec` is only copied when a holder
//! mutates it through [`Bitmap::set`]. This keeps a storage and a builder
//! seeded from it from aliasing each other's writes.

use bitvec::prelude::*;
use std::sync::Arc;

pub type Bits = BitVec<u64, Lsb0>;

//==================================================================================
// 1. Immutable Bitmap
//==================================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bitmap {
    bits: Arc<Bits>,
}

impl Bitmap {
    /// A bitmap of `len` cleared bits.
    pub fn zeroed(len: usize) -> Self {
        Self {
            bits: Arc::new(BitVec::repeat(false, len)),
        }
    }

    /// A bitmap of `len` set bits.
    pub fn filled(len: usize) -> Self {
        Self {
            bits: Arc::new(BitVec::repeat(true, len)),
        }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Bits past the end read as cleared.
    #[inline]
    pub fn get(&self, index: usize) -> bool {
        self.bits.get(index).map_or(false, |b| *b)
    }

    pub fn count_ones(&self) -> usize {
        self.bits.count_ones()
    }

    pub fn any(&self) -> bool {
        self.bits.any()
    }

    /// Sets one bit, copying the shared buffer first if another holder exists.
    pub fn set(&mut self, index: usize, value: bool) {
        Arc::make_mut(&mut self.bits).set(index, value);
    }

    pub fn slice(&self, offset: usize, len: usize) -> Self {
        let end = (offset + len).min(self.len());
        let start = offset.min(end);
        let mut bits = self.bits[start..end].to_bitvec();
        bits.resize(len, false);
        Self {
            bits: Arc::new(bits),
        }
    }

    /// A bitmap extended by `count` bits of `value`.
    pub fn extended(&self, count: usize, value: bool) -> Self {
        let mut bits = Bits::clone(&self.bits);
        bits.resize(self.len() + count, value);
        Self {
            bits: Arc::new(bits),
        }
    }

    /// The bitwise complement.
    pub fn negated(&self) -> Self {
        Self {
            bits: Arc::new(!Bits::clone(&self.bits)),
        }
    }

    /// Gathers bits by index; `None` entries produce `fill`.
    pub fn gather<I>(&self, indices: I, fill: bool) -> Self
    where
        I: IntoIterator<Item = Option<usize>>,
    {
        let bits: Bits = indices
            .into_iter()
            .map(|ix| ix.map_or(fill, |i| self.get(i)))
            .collect();
        Self {
            bits: Arc::new(bits),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.bits.iter().by_vals()
    }

    pub fn as_bitslice(&self) -> &BitSlice<u64, Lsb0> {
        &self.bits
    }
}

impl From<Bits> for Bitmap {
    fn from(bits: Bits) -> Self {
        Self {
            bits: Arc::new(bits),
        }
    }
}

impl FromIterator<bool> for Bitmap {
    fn from_iter<T: IntoIterator<Item = bool>>(iter: T) -> Self {
        Self::from(iter.into_iter().collect::<Bits>())
    }
}

//==================================================================================
// 2. Growable Builder
//==================================================================================

/// A growable bit vector owned by a single builder.
///
/// Bits that were never explicitly set read as cleared, so a null-flag builder
/// only needs to touch the null positions.
#[derive(Debug, Clone, Default)]
pub struct BitmapBuilder {
    bits: Bits,
}

impl BitmapBuilder {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bits: BitVec::with_capacity(capacity),
        }
    }

    /// Sets the bit at `index`, growing with cleared bits as needed.
    pub fn set(&mut self, index: usize) {
        if index >= self.bits.len() {
            self.bits.resize(index + 1, false);
        }
        self.bits.set(index, true);
    }

    /// Sets `count` bits starting at `start`.
    pub fn set_range(&mut self, start: usize, count: usize) {
        if count == 0 {
            return;
        }
        let end = start + count;
        if end > self.bits.len() {
            self.bits.resize(end, false);
        }
        self.bits[start..end].fill(true);
    }

    pub fn get(&self, index: usize) -> bool {
        self.bits.get(index).map_or(false, |b| *b)
    }

    pub fn any(&self) -> bool {
        self.bits.any()
    }

    /// Copies the bits of `source` into position `start..start + source.len()`.
    pub fn copy_from(&mut self, start: usize, source: &Bitmap) {
        let end = start + source.len();
        if end > self.bits.len() {
            self.bits.resize(end, false);
        }
        self.bits[start..end].copy_from_bitslice(source.as_bitslice());
    }

    /// Seals into a `Bitmap` of exactly `len` bits.
    pub fn finish(mut self, len: usize) -> Bitmap {
        self.bits.resize(len, false);
        self.bits.shrink_to_fit();
        Bitmap::from(self.bits)
    }
}
