//! Development-mode lint pass.
//!
//! Applies the fixable rules in place and reports everything it touched as warnings.
//! Warnings never fail a render. The fixed sheet is then lowered for the browser
//! targets (prefixes, color fallbacks, custom media) and pretty-printed, so the
//! declarations generated for the targets are never linted.

use lightningcss::{
    declaration::DeclarationBlock,
    properties::{Property, custom::CustomPropertyName},
    rules::{CssRule, Location},
    stylesheet::{MinifyOptions, PrinterOptions, StyleSheet},
    traits::ToCss,
};

use crate::application::render::types::{StageError, StageOutput, StageSource, StyleStage};

use super::options::{MINIFY_ERROR, PRINTER_ERROR, SYNTAX_ERROR, StageOptions, stage_error};

const RULE_EMPTY_BLOCK: &str = "block-no-empty";
const RULE_DUPLICATE_PROPERTY: &str = "declaration-block-no-duplicate-properties";
const RULE_IMPORTANT: &str = "declaration-no-important";
const RULE_UNKNOWN_PROPERTY: &str = "property-no-unknown";

pub(crate) struct LintStage {
    options: StageOptions,
}

impl LintStage {
    pub(crate) fn new(options: StageOptions) -> Self {
        Self { options }
    }
}

impl StyleStage for LintStage {
    fn name(&self) -> &'static str {
        "lint"
    }

    fn apply(&self, source: &StageSource<'_>) -> Result<StageOutput, StageError> {
        let mut stylesheet =
            StyleSheet::parse(source.css, self.options.parser_options(source.path))
                .map_err(|err| stage_error(SYNTAX_ERROR, &err))?;

        let mut warnings = Vec::new();
        lint_rules(&mut stylesheet.rules.0, &mut warnings);

        stylesheet
            .minify(MinifyOptions {
                targets: self.options.targets.clone(),
                ..MinifyOptions::default()
            })
            .map_err(|err| stage_error(MINIFY_ERROR, &err))?;

        let printed = stylesheet
            .to_css(PrinterOptions {
                targets: self.options.targets.clone(),
                ..PrinterOptions::default()
            })
            .map_err(|err| stage_error(PRINTER_ERROR, &err))?;

        Ok(StageOutput::with_warnings(printed.code, warnings))
    }
}

fn lint_rules(rules: &mut Vec<CssRule<'_>>, warnings: &mut Vec<String>) {
    rules.retain_mut(|rule| match rule {
        CssRule::Style(style) => {
            lint_rules(&mut style.rules.0, warnings);
            lint_declarations(&mut style.declarations, style.loc, warnings);

            let empty = style.declarations.declarations.is_empty()
                && style.declarations.important_declarations.is_empty()
                && style.rules.0.is_empty();
            if empty {
                warnings.push(warning("removed empty rule", RULE_EMPTY_BLOCK, style.loc));
            }
            !empty
        }
        CssRule::Media(media) => {
            lint_rules(&mut media.rules.0, warnings);
            true
        }
        CssRule::Supports(supports) => {
            lint_rules(&mut supports.rules.0, warnings);
            true
        }
        CssRule::LayerBlock(layer) => {
            lint_rules(&mut layer.rules.0, warnings);
            true
        }
        _ => true,
    });
}

fn lint_declarations(block: &mut DeclarationBlock<'_>, loc: Location, warnings: &mut Vec<String>) {
    for removed in remove_duplicates(&mut block.declarations) {
        warnings.push(warning(
            &format!("removed duplicate `{removed}`"),
            RULE_DUPLICATE_PROPERTY,
            loc,
        ));
    }
    for removed in remove_duplicates(&mut block.important_declarations) {
        warnings.push(warning(
            &format!("removed duplicate `{removed}`"),
            RULE_DUPLICATE_PROPERTY,
            loc,
        ));
    }

    for property in &block.important_declarations {
        warnings.push(warning(
            &format!("unexpected !important on `{}`", property_key(property)),
            RULE_IMPORTANT,
            loc,
        ));
    }

    for property in block
        .declarations
        .iter()
        .chain(block.important_declarations.iter())
    {
        let Property::Custom(custom) = property else {
            continue;
        };
        if let CustomPropertyName::Unknown(ident) = &custom.name {
            warnings.push(warning(
                &format!("unknown property `{}`", &*ident.0),
                RULE_UNKNOWN_PROPERTY,
                loc,
            ));
        }
    }
}

/// Drop an earlier declaration of a property that is declared again later in the
/// same block, keeping the last one. Consecutive declarations of one property with
/// different values are a fallback list and stay. Returns the removed property
/// names in source order.
fn remove_duplicates(properties: &mut Vec<Property<'_>>) -> Vec<String> {
    let keys: Vec<String> = properties.iter().map(property_key).collect();
    let values: Vec<Option<String>> = properties
        .iter()
        .map(|property| property.to_css_string(false, PrinterOptions::default()).ok())
        .collect();
    let mut keep = vec![true; properties.len()];
    let mut removed = Vec::new();

    for index in 0..properties.len() {
        let mut later = (index + 1..properties.len()).filter(|&other| keys[other] == keys[index]);
        let Some(next) = later.next() else {
            continue;
        };
        let repeated = values[index].is_some()
            && std::iter::once(next)
                .chain(later)
                .any(|other| values[other] == values[index]);
        if repeated || next != index + 1 {
            keep[index] = false;
            removed.push(keys[index].clone());
        }
    }

    let mut flags = keep.into_iter();
    properties.retain(|_| flags.next().unwrap_or(true));
    removed
}

fn property_key(property: &Property<'_>) -> String {
    let id = property.property_id();
    id.to_css_string(PrinterOptions::default())
        .unwrap_or_else(|_| id.name().to_string())
}

fn warning(message: &str, rule: &str, loc: Location) -> String {
    format!("{message} ({rule}) at [{},{}]", loc.line + 1, loc.column)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::config::PresetSettings;

    fn lint(css: &str) -> StageOutput {
        lint_with(PresetSettings::default(), css)
    }

    fn lint_with(preset: PresetSettings, css: &str) -> StageOutput {
        let options = StageOptions::from_preset(&preset).expect("preset is valid");
        LintStage::new(options)
            .apply(&StageSource {
                path: Path::new("lint.pcss"),
                css,
            })
            .expect("lint never fails on valid css")
    }

    #[test]
    fn clean_stylesheets_produce_no_warnings() {
        let output = lint(".a { color: red }\n");
        assert!(output.warnings.is_empty(), "{:?}", output.warnings);
        assert!(output.css.contains("color: red"), "{}", output.css);
    }

    #[test]
    fn empty_rules_are_removed() {
        let output = lint(".a { color: red }\n.empty {}\n");

        assert!(!output.css.contains(".empty"), "{}", output.css);
        assert_eq!(output.warnings.len(), 1);
        assert!(
            output.warnings[0].contains(RULE_EMPTY_BLOCK),
            "{:?}",
            output.warnings
        );
        assert!(output.warnings[0].ends_with("at [2,1]"), "{:?}", output.warnings);
    }

    #[test]
    fn duplicate_declarations_keep_the_last_value() {
        let output = lint(".a { color: red; margin: 0; color: blue }");

        assert!(output.css.contains("color: #00f") || output.css.contains("color: blue"));
        assert!(!output.css.contains("red"), "{}", output.css);
        assert!(
            output
                .warnings
                .iter()
                .any(|warning| warning.contains(RULE_DUPLICATE_PROPERTY)),
            "{:?}",
            output.warnings
        );
    }

    #[test]
    fn repeated_identical_declarations_are_removed() {
        let output = lint(".a { color: red; color: red }");

        assert_eq!(output.css.matches("color:").count(), 1, "{}", output.css);
        assert_eq!(output.warnings.len(), 1, "{:?}", output.warnings);
        assert!(output.warnings[0].contains(RULE_DUPLICATE_PROPERTY));
    }

    #[test]
    fn consecutive_fallback_declarations_are_kept() {
        let output = lint(".a { color: #b36a5e; color: lab(50% 20 30) }");

        assert!(
            !output
                .warnings
                .iter()
                .any(|warning| warning.contains(RULE_DUPLICATE_PROPERTY)),
            "{:?}",
            output.warnings
        );
    }

    #[test]
    fn declarations_generated_for_old_targets_are_not_flagged() {
        let output = lint_with(
            PresetSettings {
                browsers: vec!["safari 12".to_string()],
                ..PresetSettings::default()
            },
            ".a { color: lab(50% 20 30); user-select: none }",
        );

        assert!(output.warnings.is_empty(), "{:?}", output.warnings);
        assert!(output.css.matches("color:").count() >= 2, "{}", output.css);
        assert!(output.css.contains("-webkit-user-select"), "{}", output.css);
    }

    #[test]
    fn important_and_unknown_properties_are_reported() {
        let output = lint(".a { colr: red; margin: 0 !important }");

        assert!(
            output
                .warnings
                .iter()
                .any(|warning| warning.contains(RULE_UNKNOWN_PROPERTY) && warning.contains("colr")),
            "{:?}",
            output.warnings
        );
        assert!(
            output
                .warnings
                .iter()
                .any(|warning| warning.contains(RULE_IMPORTANT)),
            "{:?}",
            output.warnings
        );
    }

    #[test]
    fn nested_media_rules_are_linted() {
        let output = lint("@media (min-width: 600px) {\n  .wide {}\n  .b { color: red }\n}\n");

        assert!(!output.css.contains(".wide"), "{}", output.css);
        assert!(output.css.contains(".b"), "{}", output.css);
        assert_eq!(output.warnings.len(), 1);
    }
}
