//! This file is the root of the `tablestore` Rust crate.
//!
//! `tablestore` is the column layer of a table engine: typed, immutable,
//! nullable storages, the builders that produce them, vectorized operations
//! dispatched by name, and casts between storage types. Its responsibilities
//! here are strictly limited to:
//! 1.  Declaring all the top-level modules of the library.
//! 2.  Re-exporting the types an embedder needs for everyday use.

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//==================================================================================
// 1. Module Declarations
//==================================================================================
#[macro_use]
mod observability; // Make macros available throughout the crate

#[doc(hidden)]
pub use log as __log;

pub mod bridge;
pub mod builder;
pub mod config;
pub mod context;
pub mod error;
pub mod null_handling;
pub mod operation;
pub mod problems;
pub mod storage;
pub mod types;

//==================================================================================
// 2. Public API Re-exports
//==================================================================================
pub use builder::Builder;
pub use config::StoreConfig;
pub use context::{CancellationToken, Context};
pub use error::StoreError;
pub use observability::enable_verbose_logging;
pub use operation::cast::{can_cast, cast};
pub use operation::map::{run_binary_map, run_zip};
pub use problems::{CastProblemAggregator, Problem, ProblemAggregator};
pub use storage::{Column, Storage};
pub use types::{IntegerType, StorageType, TextType, Value};
