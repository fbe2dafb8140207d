use std::{io, path::Path};

use thiserror::Error;

/// Text handed to a stage: the current stylesheet plus the file it was read from.
#[derive(Debug, Clone, Copy)]
pub struct StageSource<'a> {
    pub path: &'a Path,
    pub css: &'a str,
}

/// Text produced by a stage together with any non-fatal diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StageOutput {
    pub css: String,
    pub warnings: Vec<String>,
}

impl StageOutput {
    pub fn new(css: String) -> Self {
        Self {
            css,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(css: String, warnings: Vec<String>) -> Self {
        Self { css, warnings }
    }
}

/// A transform failure raised by one stage. Positions are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{name}: {reason}")]
pub struct StageError {
    pub name: &'static str,
    pub reason: String,
    pub line: Option<u32>,
    pub column: Option<u32>,
}

/// One step of the stylesheet transform chain.
///
/// Implementations must be deterministic: the same input text and path yield the
/// same output or the same error.
pub trait StyleStage: Send + Sync {
    /// Short label used in warning logs, e.g. `imports` or `minify`.
    fn name(&self) -> &'static str;

    fn apply(&self, source: &StageSource<'_>) -> Result<StageOutput, StageError>;
}

/// Faults that stop a render before the transform chain can report a failure.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to read stylesheet source `{path}`: {source}")]
    Read { path: String, source: io::Error },
    #[error("stylesheet render worker failed: {0}")]
    Worker(String),
}

impl RenderError {
    pub fn read(path: &Path, source: io::Error) -> Self {
        Self::Read {
            path: path.display().to_string(),
            source,
        }
    }
}
