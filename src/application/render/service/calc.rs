use lightningcss::stylesheet::{PrinterOptions, StyleSheet};

use crate::application::render::types::{StageError, StageOutput, StageSource, StyleStage};

use super::options::{PRINTER_ERROR, SYNTAX_ERROR, StageOptions, stage_error};

/// Folds arithmetic `calc()` expressions; lightningcss reduces them while parsing.
pub(crate) struct CalcStage {
    options: StageOptions,
}

impl CalcStage {
    pub(crate) fn new(options: StageOptions) -> Self {
        Self { options }
    }
}

impl StyleStage for CalcStage {
    fn name(&self) -> &'static str {
        "calc"
    }

    fn apply(&self, source: &StageSource<'_>) -> Result<StageOutput, StageError> {
        let stylesheet = StyleSheet::parse(source.css, self.options.parser_options(source.path))
            .map_err(|err| stage_error(SYNTAX_ERROR, &err))?;

        let printed = stylesheet
            .to_css(PrinterOptions::default())
            .map_err(|err| stage_error(PRINTER_ERROR, &err))?;

        Ok(StageOutput::new(printed.code))
    }
}
