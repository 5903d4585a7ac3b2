//! This module serves as the public API for all null-tracking logic within the
//! storage engine.
//!
//! Every storage keeps its values and its null indicator apart. Primitive
//! storages pair a contiguous value buffer with a [`Bitmap`] of null flags;
//! boxed storages treat an absent slot as null. Boolean storages use a second
//! `Bitmap` for their values.

//==================================================================================
// 1. Module Declarations
//==================================================================================

/// Copy-on-write bit vectors for null flags and boolean values.
pub mod bitmap;

//==================================================================================
// 2. Public API Re-exports
//==================================================================================

pub use bitmap::{Bitmap, BitmapBuilder};

//==================================================================================
// 3. Unit Tests (Module-level integration tests)
//==================================================================================
