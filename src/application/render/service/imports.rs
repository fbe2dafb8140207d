//! `@import` inlining on top of the lightningcss bundler.
//!
//! Imports written in the rendered file resolve against the configured source root.
//! Imports written inside an imported file resolve next to that file. Remote
//! specifiers (`https://…`, `//host/…`, `data:`) are left in place as `@import` rules.

use std::{
    io,
    path::{Path, PathBuf},
};

use lightningcss::{
    bundler::{BundleErrorKind, Bundler, FileProvider, ResolveResult, SourceProvider},
    stylesheet::PrinterOptions,
};

use crate::application::render::types::{StageError, StageOutput, StageSource, StyleStage};

use super::options::{IMPORT_ERROR, PRINTER_ERROR, SYNTAX_ERROR, StageOptions, stage_error};

pub(crate) struct ImportStage {
    root: PathBuf,
    options: StageOptions,
}

impl ImportStage {
    pub(crate) fn new(root: PathBuf, options: StageOptions) -> Self {
        Self { root, options }
    }
}

impl StyleStage for ImportStage {
    fn name(&self) -> &'static str {
        "imports"
    }

    fn apply(&self, source: &StageSource<'_>) -> Result<StageOutput, StageError> {
        let provider = RootedProvider {
            entry: source.path,
            css: source.css,
            root: &self.root,
            files: FileProvider::new(),
        };

        let mut bundler = Bundler::new(&provider, None, self.options.parser_options(source.path));
        let stylesheet = bundler.bundle(source.path).map_err(|err| {
            let name = match err.kind {
                BundleErrorKind::ParserError(_) => SYNTAX_ERROR,
                _ => IMPORT_ERROR,
            };
            stage_error(name, &err)
        })?;

        let printed = stylesheet
            .to_css(PrinterOptions::default())
            .map_err(|err| stage_error(PRINTER_ERROR, &err))?;

        Ok(StageOutput::new(printed.code))
    }
}

/// Serves the entry stylesheet from memory and everything it imports from disk.
struct RootedProvider<'s> {
    entry: &'s Path,
    css: &'s str,
    root: &'s Path,
    files: FileProvider,
}

impl SourceProvider for RootedProvider<'_> {
    type Error = io::Error;

    fn read<'a>(&'a self, file: &Path) -> Result<&'a str, Self::Error> {
        if file == self.entry {
            return Ok(self.css);
        }
        self.files.read(file)
    }

    fn resolve(
        &self,
        specifier: &str,
        originating_file: &Path,
    ) -> Result<ResolveResult, Self::Error> {
        if is_remote(specifier) {
            return Ok(ResolveResult::External(specifier.to_string()));
        }
        if let Some(absolute) = specifier.strip_prefix('/') {
            return Ok(ResolveResult::File(self.root.join(absolute)));
        }
        if originating_file == self.entry {
            return Ok(ResolveResult::File(self.root.join(specifier)));
        }
        self.files.resolve(specifier, originating_file)
    }
}

/// Protocol-relative URLs and anything with a URL scheme. A single letter before
/// the colon is a drive letter, not a scheme.
fn is_remote(specifier: &str) -> bool {
    if specifier.starts_with("//") {
        return true;
    }
    let Some((scheme, _)) = specifier.split_once(':') else {
        return false;
    };
    scheme.len() > 1
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;
    use crate::config::PresetSettings;

    fn stage(root: &Path) -> ImportStage {
        let options =
            StageOptions::from_preset(&PresetSettings::default()).expect("default preset is valid");
        ImportStage::new(root.to_path_buf(), options)
    }

    #[test]
    fn entry_imports_resolve_against_the_source_root() {
        let temp = tempdir().expect("temp dir should be created");
        let src = temp.path().join("src");
        let docroot = src.join("docroot/css");
        fs::create_dir_all(src.join("partials")).expect("partials dir");
        fs::create_dir_all(&docroot).expect("docroot dir");
        fs::write(
            src.join("partials/base.css"),
            "@import \"./colors.css\";\n.base { margin: 0 }",
        )
        .expect("base partial");
        fs::write(src.join("partials/colors.css"), ".accent { color: teal }")
            .expect("colors partial");

        let entry = docroot.join("site.pcss");
        let css = "@import \"partials/base.css\";\n.site { padding: 0 }";
        fs::write(&entry, css).expect("entry");

        let output = stage(&src)
            .apply(&StageSource { path: &entry, css })
            .expect("imports resolve");

        assert!(output.css.contains(".accent"), "{}", output.css);
        assert!(output.css.contains(".base"), "{}", output.css);
        assert!(output.css.contains(".site"), "{}", output.css);
        assert!(!output.css.contains("@import"), "{}", output.css);
    }

    #[test]
    fn missing_imports_are_import_errors() {
        let temp = tempdir().expect("temp dir should be created");
        let entry = temp.path().join("site.pcss");
        let css = "@import \"nowhere.css\";\n.site { padding: 0 }";
        fs::write(&entry, css).expect("entry");

        let err = stage(temp.path())
            .apply(&StageSource { path: &entry, css })
            .expect_err("missing import fails");

        assert_eq!(err.name, IMPORT_ERROR);
    }

    #[test]
    fn syntax_errors_keep_their_position() {
        let temp = tempdir().expect("temp dir should be created");
        let entry = temp.path().join("broken.pcss");
        let css = ".ok { color: red }\n..broken { color: red }\n";
        fs::write(&entry, css).expect("entry");

        let err = stage(temp.path())
            .apply(&StageSource { path: &entry, css })
            .expect_err("invalid selector fails");

        assert_eq!(err.name, SYNTAX_ERROR);
        assert_eq!(err.line, Some(2));
    }

    #[test]
    fn remote_imports_are_kept_as_import_rules() {
        let temp = tempdir().expect("temp dir should be created");
        let entry = temp.path().join("site.pcss");
        let css = "@import url(\"https://fonts.googleapis.com/css2?family=Inter\");\n.site { margin: 0 }";
        fs::write(&entry, css).expect("entry");

        let output = stage(temp.path())
            .apply(&StageSource { path: &entry, css })
            .expect("remote import is left alone");

        assert!(output.css.contains("@import"), "{}", output.css);
        assert!(
            output.css.contains("https://fonts.googleapis.com/css2?family=Inter"),
            "{}",
            output.css
        );
        assert!(output.css.contains(".site"), "{}", output.css);
    }

    #[test]
    fn remote_specifiers_are_recognised() {
        assert!(is_remote("https://example.com/a.css"));
        assert!(is_remote("//cdn.example.com/a.css"));
        assert!(is_remote("data:text/css,.a{color:red}"));
        assert!(!is_remote("partials/base.css"));
        assert!(!is_remote("/partials/base.css"));
        assert!(!is_remote("C:/styles/base.css"));
    }
}
