//! Application services: stylesheet rendering and the batch build.

pub mod build;
pub mod error;
pub mod render;
