use lightningcss::stylesheet::{MinifyOptions, PrinterOptions, StyleSheet};

use crate::application::render::types::{StageError, StageOutput, StageSource, StyleStage};

use super::options::{MINIFY_ERROR, PRINTER_ERROR, SYNTAX_ERROR, StageOptions, stage_error};

/// Production final stage: merges rules and strips whitespace.
pub(crate) struct MinifyStage {
    options: StageOptions,
}

impl MinifyStage {
    pub(crate) fn new(options: StageOptions) -> Self {
        Self { options }
    }
}

impl StyleStage for MinifyStage {
    fn name(&self) -> &'static str {
        "minify"
    }

    fn apply(&self, source: &StageSource<'_>) -> Result<StageOutput, StageError> {
        let mut stylesheet =
            StyleSheet::parse(source.css, self.options.parser_options(source.path))
                .map_err(|err| stage_error(SYNTAX_ERROR, &err))?;

        stylesheet
            .minify(MinifyOptions {
                targets: self.options.targets.clone(),
                ..MinifyOptions::default()
            })
            .map_err(|err| stage_error(MINIFY_ERROR, &err))?;

        let printed = stylesheet
            .to_css(PrinterOptions {
                minify: true,
                targets: self.options.targets.clone(),
                ..PrinterOptions::default()
            })
            .map_err(|err| stage_error(PRINTER_ERROR, &err))?;

        Ok(StageOutput::new(printed.code))
    }
}
