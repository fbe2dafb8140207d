use lightningcss::stylesheet::{MinifyOptions, PrinterOptions, StyleSheet};

use crate::application::render::types::{StageError, StageOutput, StageSource, StyleStage};

use super::options::{MINIFY_ERROR, PRINTER_ERROR, SYNTAX_ERROR, StageOptions, stage_error};

/// Lowers modern syntax for the configured browser targets.
///
/// A compacting stage runs the lightningcss minifier with the targets, which adds
/// vendor prefixes and color fallbacks and resolves custom media queries. A
/// lowering-only stage keeps the rule structure as written and leaves those
/// declaration rewrites to the lint pass that follows it in development.
pub(crate) struct TranspileStage {
    options: StageOptions,
    compact: bool,
}

impl TranspileStage {
    pub(crate) fn compacting(options: StageOptions) -> Self {
        Self {
            options,
            compact: true,
        }
    }

    /// Nesting is still flattened, since the printer lowers it for the targets.
    pub(crate) fn lowering_only(options: StageOptions) -> Self {
        Self {
            options,
            compact: false,
        }
    }
}

impl StyleStage for TranspileStage {
    fn name(&self) -> &'static str {
        "transpile"
    }

    fn apply(&self, source: &StageSource<'_>) -> Result<StageOutput, StageError> {
        let mut stylesheet =
            StyleSheet::parse(source.css, self.options.parser_options(source.path))
                .map_err(|err| stage_error(SYNTAX_ERROR, &err))?;

        if self.compact {
            stylesheet
                .minify(MinifyOptions {
                    targets: self.options.targets.clone(),
                    ..MinifyOptions::default()
                })
                .map_err(|err| stage_error(MINIFY_ERROR, &err))?;
        }

        let printed = stylesheet
            .to_css(PrinterOptions {
                targets: self.options.targets.clone(),
                ..PrinterOptions::default()
            })
            .map_err(|err| stage_error(PRINTER_ERROR, &err))?;

        Ok(StageOutput::new(printed.code))
    }
}
