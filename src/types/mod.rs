//! This module defines the core, strongly-typed value descriptors used
//! throughout the storage engine.
//!
//! It includes the closed `StorageType` enum (with its integer, float and text
//! refinements), the numeric promotion lattice, and the tagged runtime `Value`
//! exchanged with the embedding host.

pub mod storage_type;
pub mod value;

// Re-export the main type(s) for easier access.
pub use storage_type::{FloatType, IntegerType, NumericKind, StorageType, TextType};
pub use value::Value;
