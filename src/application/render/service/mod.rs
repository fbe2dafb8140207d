mod calc;
mod imports;
mod lint;
mod minify;
mod options;
mod transpile;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};

use metrics::{counter, histogram};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::application::render::types::{RenderError, StageError, StageSource, StyleStage};
use crate::config::{PresetSettings, Settings};
use crate::domain::types::{BuildMode, RenderOutcome, StyleFailure};

use self::{
    calc::CalcStage, imports::ImportStage, lint::LintStage, minify::MinifyStage,
    options::StageOptions, transpile::TranspileStage,
};

const METRIC_RENDER_TOTAL: &str = "stylesmith_render_total";
const METRIC_RENDER_FAILED_TOTAL: &str = "stylesmith_render_failed_total";
const METRIC_RENDER_MS: &str = "stylesmith_render_ms";

/// Inputs needed to assemble the stage chain.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root that `@import` specifiers of rendered files resolve against.
    pub source_root: PathBuf,
    pub preset: PresetSettings,
    pub mode: BuildMode,
}

impl From<&Settings> for PipelineConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            source_root: settings.paths.src.clone(),
            preset: settings.style.preset.clone(),
            mode: settings.style.mode,
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid browserslist queries `{queries}`: {reason}")]
    InvalidBrowsers { queries: String, reason: String },
}

impl PipelineError {
    pub(crate) fn browsers(queries: &[String], reason: impl Into<String>) -> Self {
        Self::InvalidBrowsers {
            queries: queries.join(", "),
            reason: reason.into(),
        }
    }
}

/// Renders stylesheet sources through an ordered chain of [`StyleStage`]s.
///
/// Cloning is cheap; clones share the same stages.
#[derive(Clone)]
pub struct StylesheetRenderer {
    stages: Arc<[Box<dyn StyleStage>]>,
    mode: BuildMode,
}

impl StylesheetRenderer {
    pub fn new(config: &PipelineConfig) -> Result<Self, PipelineError> {
        let options = StageOptions::from_preset(&config.preset)?;

        // Development keeps the rule structure intact until the lint pass has seen it.
        let transpile = match config.mode {
            BuildMode::Development => TranspileStage::lowering_only(options.clone()),
            BuildMode::Production => TranspileStage::compacting(options.clone()),
        };
        let mut stages: Vec<Box<dyn StyleStage>> = vec![
            Box::new(ImportStage::new(config.source_root.clone(), options.clone())),
            Box::new(transpile),
            Box::new(CalcStage::new(options.clone())),
        ];
        match config.mode {
            BuildMode::Development => stages.push(Box::new(LintStage::new(options))),
            BuildMode::Production => stages.push(Box::new(MinifyStage::new(options))),
        }

        Ok(Self {
            stages: stages.into(),
            mode: config.mode,
        })
    }

    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Read `path` and run it through every stage.
    ///
    /// Transform failures come back as [`RenderOutcome::Failed`]; only a failed read
    /// (or a crashed worker) is an `Err`.
    pub async fn render(&self, path: &Path) -> Result<RenderOutcome, RenderError> {
        let started_at = Instant::now();
        let css = tokio::fs::read_to_string(path)
            .await
            .map_err(|err| RenderError::read(path, err))?;

        let stages = Arc::clone(&self.stages);
        let owned_path = path.to_path_buf();
        let chain = tokio::task::spawn_blocking(move || run_chain(&stages, &owned_path, css))
            .await
            .map_err(|err| RenderError::Worker(err.to_string()))?;

        for (stage, text) in &chain.warnings {
            warn!(
                target = "stylesmith::render",
                path = %path.display(),
                "[warning:{stage}] {text}"
            );
        }

        let outcome = match chain.result {
            Ok(css) => {
                info!(
                    target = "stylesmith::render",
                    path = %path.display(),
                    mode = %self.mode,
                    bytes = css.len(),
                    "rendered {}",
                    path.display()
                );
                RenderOutcome::Rendered(css)
            }
            Err(err) => {
                let failure = StyleFailure {
                    name: err.name.to_string(),
                    reason: err.reason,
                    line: err.line,
                    column: err.column,
                    path: path.to_path_buf(),
                };
                error!(target = "stylesmith::render", "{}", failure.subject());
                error!(target = "stylesmith::render", "{}", failure.locator());
                counter!(METRIC_RENDER_FAILED_TOTAL).increment(1);
                RenderOutcome::Failed(failure)
            }
        };

        counter!(METRIC_RENDER_TOTAL, "mode" => self.mode.as_str()).increment(1);
        histogram!(METRIC_RENDER_MS).record(started_at.elapsed().as_secs_f64() * 1000.0);

        Ok(outcome)
    }
}

struct ChainOutput {
    warnings: Vec<(&'static str, String)>,
    result: Result<String, StageError>,
}

fn run_chain(stages: &[Box<dyn StyleStage>], path: &Path, css: String) -> ChainOutput {
    let mut warnings = Vec::new();
    let mut current = css;

    for stage in stages {
        let source = StageSource {
            path,
            css: &current,
        };
        match stage.apply(&source) {
            Ok(output) => {
                warnings.extend(output.warnings.into_iter().map(|text| (stage.name(), text)));
                current = output.css;
            }
            Err(err) => {
                return ChainOutput {
                    warnings,
                    result: Err(err),
                };
            }
        }
    }

    ChainOutput {
        warnings,
        result: Ok(current),
    }
}
