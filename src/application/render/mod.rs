//! Stylesheet rendering.
//!
//! A render reads one source file and threads its text through an ordered chain of
//! stages. Transform failures are returned as values so callers decide how to
//! surface them; the batch build logs and skips, the HTTP middleware replies 500.

mod service;
mod types;

pub use service::{PipelineConfig, PipelineError, StylesheetRenderer};
pub use types::{RenderError, StageError, StageOutput, StageSource, StyleStage};
