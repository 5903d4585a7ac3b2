//! This module defines the single, unified error type for the entire tablestore library.
//!
//! Only structural failures live here: a usage bug or an interrupted computation.
//! Per-row data-quality findings are never errors; they are routed to a
//! [`ProblemAggregator`](crate::problems::ProblemAggregator) instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    // =========================================================================
    // === Structural Errors (usage bugs, never absorbed)
    // =========================================================================
    #[error("Unsupported data type for this operation: {0}")]
    UnsupportedType(String),

    #[error("Operation `{op}` is not supported for storage of type {storage_type}")]
    UnsupportedOperation { op: String, storage_type: String },

    #[error("Cannot bulk-append a storage of type {found} into a builder of type {expected}")]
    StorageTypeMismatch { expected: String, found: String },

    #[error("Cannot append value {value} into a builder of type {expected}")]
    ValueTypeMismatch { expected: String, value: String },

    #[error("Index {index} is out of bounds for storage of size {size}")]
    IndexOutOfBounds { index: usize, size: usize },

    #[error("Value at index {0} is nothing; check `is_nothing` before unboxed access")]
    ValueIsNothing(usize),

    #[error("Expected {0}")]
    UnexpectedType(String),

    #[error("Cannot compare {left} with {right}")]
    Incomparable { left: String, right: String },

    #[error("Length mismatch: expected {expected}, got {found}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("The operation was cancelled")]
    Cancelled,

    #[error("Internal logic error (this is a bug): {0}")]
    InternalError(String),

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error originating from the Arrow library.
    #[error("Arrow operation failed: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// An error from the Serde JSON library, typically while loading configuration.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// An invalid LIKE pattern or other regular expression failure.
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),
}

impl StoreError {
    pub(crate) fn unsupported_op(op: &str, storage_type: impl std::fmt::Display) -> Self {
        StoreError::UnsupportedOperation {
            op: op.to_string(),
            storage_type: storage_type.to_string(),
        }
    }

    pub(crate) fn type_mismatch(
        expected: impl std::fmt::Display,
        found: impl std::fmt::Display,
    ) -> Self {
        StoreError::StorageTypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}
