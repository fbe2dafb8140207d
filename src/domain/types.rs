//! Shared domain enumerations and value types for the stylesheet pipeline.

use std::{fmt, path::PathBuf};

use serde::Serialize;

/// Selects the final stage of the transform chain.
///
/// Only the literal `development` selects [`BuildMode::Development`]; every other
/// value, including an empty one, falls back to [`BuildMode::Production`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    Development,
    #[default]
    Production,
}

impl BuildMode {
    pub fn as_str(self) -> &'static str {
        match self {
            BuildMode::Development => "development",
            BuildMode::Production => "production",
        }
    }

    pub fn from_switch(value: &str) -> Self {
        if value.trim() == "development" {
            BuildMode::Development
        } else {
            BuildMode::Production
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transform failure surfaced by the render pipeline.
///
/// `line` and `column` are 1-based and `None` when the underlying library could
/// not attribute the failure to a location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleFailure {
    pub name: String,
    pub reason: String,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub path: PathBuf,
}

impl StyleFailure {
    /// `"<name>: <reason>"`
    pub fn subject(&self) -> String {
        format!("{}: {}", self.name, self.reason)
    }

    /// `"[<line>,<column>] <path>"`
    pub fn locator(&self) -> String {
        format!(
            "[{},{}] {}",
            display_position(self.line),
            display_position(self.column),
            self.path.display()
        )
    }

    /// Subject and locator joined by a newline; this is the text sent to HTTP clients.
    pub fn summary(&self) -> String {
        format!("{}\n{}", self.subject(), self.locator())
    }
}

fn display_position(value: Option<u32>) -> String {
    value.map_or_else(|| "?".to_string(), |value| value.to_string())
}

impl fmt::Display for StyleFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// Result of rendering one stylesheet source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Rendered(String),
    Failed(StyleFailure),
}

impl RenderOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, RenderOutcome::Rendered(_))
    }

    pub fn css(&self) -> Option<&str> {
        match self {
            RenderOutcome::Rendered(css) => Some(css.as_str()),
            RenderOutcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&StyleFailure> {
        match self {
            RenderOutcome::Rendered(_) => None,
            RenderOutcome::Failed(failure) => Some(failure),
        }
    }
}

/// Counts reported by a batch build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BuildSummary {
    pub discovered: usize,
    pub rendered: usize,
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_failure() -> StyleFailure {
        StyleFailure {
            name: "CssSyntaxError".to_string(),
            reason: "Unexpected end of input".to_string(),
            line: Some(3),
            column: Some(7),
            path: PathBuf::from("src/docroot/css/site.pcss"),
        }
    }

    #[test]
    fn only_the_development_literal_selects_development() {
        assert_eq!(BuildMode::from_switch("development"), BuildMode::Development);
        assert_eq!(BuildMode::from_switch(" development\n"), BuildMode::Development);
        assert_eq!(BuildMode::from_switch("production"), BuildMode::Production);
        assert_eq!(BuildMode::from_switch("Development"), BuildMode::Production);
        assert_eq!(BuildMode::from_switch("test"), BuildMode::Production);
        assert_eq!(BuildMode::from_switch(""), BuildMode::Production);
    }

    #[test]
    fn summary_joins_subject_and_locator() {
        let failure = sample_failure();
        assert_eq!(
            failure.summary(),
            "CssSyntaxError: Unexpected end of input\n[3,7] src/docroot/css/site.pcss"
        );
    }

    #[test]
    fn unknown_positions_render_as_question_marks() {
        let failure = StyleFailure {
            line: None,
            column: None,
            ..sample_failure()
        };
        assert_eq!(failure.locator(), "[?,?] src/docroot/css/site.pcss");
    }

    #[test]
    fn outcome_accessors_are_exclusive() {
        let rendered = RenderOutcome::Rendered(".a{color:red}".to_string());
        assert!(rendered.is_rendered());
        assert_eq!(rendered.css(), Some(".a{color:red}"));
        assert!(rendered.failure().is_none());

        let failed = RenderOutcome::Failed(sample_failure());
        assert!(!failed.is_rendered());
        assert!(failed.css().is_none());
        assert_eq!(failed.failure().map(|f| f.line), Some(Some(3)));
    }
}
