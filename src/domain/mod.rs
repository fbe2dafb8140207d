//! Domain layer types and invariants.

pub mod error;
pub mod paths;
pub mod types;
