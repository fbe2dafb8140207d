use std::{fmt::Display, path::Path};

use lightningcss::{
    error::Error as CssError,
    stylesheet::{ParserFlags, ParserOptions},
    targets::{Browsers, Features, Targets},
};

use crate::application::render::types::StageError;
use crate::config::PresetSettings;

use super::PipelineError;

pub(crate) const SYNTAX_ERROR: &str = "CssSyntaxError";
pub(crate) const IMPORT_ERROR: &str = "CssImportError";
pub(crate) const MINIFY_ERROR: &str = "CssMinifyError";
pub(crate) const PRINTER_ERROR: &str = "CssPrinterError";

/// Highest preset stage that still enables `@custom-media`.
const CUSTOM_MEDIA_STAGE: u8 = 2;

/// Parser flags and browser targets shared by every lightningcss-backed stage.
#[derive(Debug, Clone)]
pub(crate) struct StageOptions {
    pub flags: ParserFlags,
    pub targets: Targets,
}

impl StageOptions {
    pub(crate) fn from_preset(preset: &PresetSettings) -> Result<Self, PipelineError> {
        let browsers = Browsers::from_browserslist(preset.browsers.iter().map(String::as_str))
            .map_err(|err| PipelineError::browsers(&preset.browsers, err.to_string()))?;

        let mut flags = ParserFlags::empty();
        let mut include = Features::empty();
        let mut exclude = Features::empty();

        if preset.nesting_rules {
            flags |= ParserFlags::NESTING;
            include |= Features::Nesting;
        } else {
            exclude |= Features::Nesting;
        }
        if preset.stage <= CUSTOM_MEDIA_STAGE {
            flags |= ParserFlags::CUSTOM_MEDIA;
        }
        if !preset.autoprefixer {
            exclude |= Features::VendorPrefixes;
        }

        Ok(Self {
            flags,
            targets: Targets {
                browsers,
                include,
                exclude,
            },
        })
    }

    pub(crate) fn parser_options<'i>(&self, path: &Path) -> ParserOptions<'i> {
        ParserOptions {
            filename: path.display().to_string(),
            flags: self.flags.clone(),
            ..ParserOptions::default()
        }
    }
}

/// Convert a lightningcss error into a stage failure with 1-based positions.
pub(crate) fn stage_error<T: Display>(name: &'static str, err: &CssError<T>) -> StageError {
    let (line, column) = match err.loc.as_ref() {
        Some(loc) => (Some(loc.line + 1), Some(loc.column)),
        None => (None, None),
    };

    StageError {
        name,
        reason: err.kind.to_string(),
        line,
        column,
    }
}
