//! Everything that reads one storage and produces another: row traversal
//! helpers, binary and ternary operations dispatched by name, unary
//! operations and casts. `sample` profiles text cells without producing a
//! storage.

pub mod cast;
pub mod iterators;
pub mod map;
pub mod sample;
pub mod unary;

#[cfg(test)]
mod tests;
