use std::{
    fs,
    path::{Path, PathBuf},
};

use stylesmith::application::render::{PipelineConfig, RenderError, StylesheetRenderer};
use stylesmith::config::PresetSettings;
use stylesmith::domain::types::{BuildMode, RenderOutcome};
use tempfile::{TempDir, tempdir};

struct Fixture {
    _temp: TempDir,
    src: PathBuf,
    docroot: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let temp = tempdir().expect("temp dir should be created");
        let src = temp.path().join("src");
        let docroot = src.join("docroot");
        fs::create_dir_all(&docroot).expect("docroot should be created");
        Self {
            _temp: temp,
            src,
            docroot,
        }
    }

    fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.src.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("parent dirs should be created");
        }
        fs::write(&path, contents).expect("fixture file should be written");
        path
    }

    fn renderer(&self, mode: BuildMode) -> StylesheetRenderer {
        self.renderer_with(mode, PresetSettings::default())
    }

    fn renderer_with(&self, mode: BuildMode, preset: PresetSettings) -> StylesheetRenderer {
        StylesheetRenderer::new(&PipelineConfig {
            source_root: self.src.clone(),
            preset,
            mode,
        })
        .expect("renderer should build")
    }
}

async fn render_css(renderer: &StylesheetRenderer, path: &Path) -> String {
    match renderer.render(path).await.expect("source is readable") {
        RenderOutcome::Rendered(css) => css,
        RenderOutcome::Failed(failure) => panic!("unexpected failure: {failure}"),
    }
}

#[tokio::test]
async fn production_output_is_minified() {
    let fixture = Fixture::new();
    let source = fixture.write("docroot/a.pcss", ".a {\n  color: red;\n}\n");

    let css = render_css(&fixture.renderer(BuildMode::Production), &source).await;

    insta::assert_snapshot!(css, @".a{color:red}");
}

#[tokio::test]
async fn calc_expressions_are_folded() {
    let fixture = Fixture::new();
    let source = fixture.write("docroot/calc.pcss", ".a { width: calc(10px + 5px) }\n");

    let css = render_css(&fixture.renderer(BuildMode::Production), &source).await;

    insta::assert_snapshot!(css, @".a{width:15px}");
}

#[tokio::test]
async fn development_output_is_linted_and_readable() {
    let fixture = Fixture::new();
    let source = fixture.write(
        "docroot/dev.pcss",
        ".a { color: red }\n.unused {}\n.b { margin: 0 }\n",
    );

    let css = render_css(&fixture.renderer(BuildMode::Development), &source).await;

    assert!(css.contains(".a {\n  color: red;\n}"), "{css}");
    assert!(css.contains(".b {\n  margin: 0;\n}"), "{css}");
    assert!(!css.contains(".unused"), "{css}");
}

#[tokio::test]
async fn development_output_keeps_fallbacks_for_old_targets() {
    let fixture = Fixture::new();
    let source = fixture.write(
        "docroot/colors.pcss",
        ".a { color: lab(50% 20 30); user-select: none }\n",
    );
    let preset = PresetSettings {
        browsers: vec!["safari 12".to_string()],
        ..PresetSettings::default()
    };

    let css = render_css(&fixture.renderer_with(BuildMode::Development, preset), &source).await;

    assert!(css.matches("color:").count() >= 2, "{css}");
    assert!(css.contains("lab("), "{css}");
    assert!(css.contains("-webkit-user-select"), "{css}");
}

#[tokio::test]
async fn rendering_is_idempotent() {
    let fixture = Fixture::new();
    let source = fixture.write(
        "docroot/site.pcss",
        ".card { color: black; & .title { font-weight: bold } }\n.box { width: calc(2 * 4px) }\n",
    );
    let renderer = fixture.renderer(BuildMode::Production);

    let first = render_css(&renderer, &source).await;
    let second = render_css(&renderer, &source).await;

    assert_eq!(first, second);
    assert!(first.contains(".card .title"), "{first}");
    assert!(first.contains("8px"), "{first}");
}

#[tokio::test]
async fn imports_resolve_against_the_source_root() {
    let fixture = Fixture::new();
    fixture.write("partials/tokens.css", ".token { color: teal }\n");
    let source = fixture.write(
        "docroot/css/site.pcss",
        "@import \"partials/tokens.css\";\n.site { margin: 0 }\n",
    );

    let css = render_css(&fixture.renderer(BuildMode::Production), &source).await;

    insta::assert_snapshot!(css, @".token{color:teal}.site{margin:0}");
}

#[tokio::test]
async fn remote_imports_are_left_for_the_browser() {
    let fixture = Fixture::new();
    let source = fixture.write(
        "docroot/fonts.pcss",
        "@import url(\"https://fonts.googleapis.com/css2?family=Inter\");\n.site { margin: 0 }\n",
    );

    for mode in [BuildMode::Production, BuildMode::Development] {
        let css = render_css(&fixture.renderer(mode), &source).await;

        assert!(css.starts_with("@import"), "{css}");
        assert!(
            css.contains("https://fonts.googleapis.com/css2?family=Inter"),
            "{css}"
        );
        assert!(css.contains(".site"), "{css}");
    }
}

#[tokio::test]
async fn syntax_errors_become_failures_with_a_locator() {
    let fixture = Fixture::new();
    let source = fixture.write(
        "docroot/broken.pcss",
        ".ok { color: red }\n..broken { color: red }\n",
    );

    let outcome = fixture
        .renderer(BuildMode::Production)
        .render(&source)
        .await
        .expect("transform failures are not errors");

    let failure = outcome.failure().expect("render should fail");
    assert_eq!(failure.name, "CssSyntaxError");
    assert_eq!(failure.line, Some(2));
    assert_eq!(failure.path, source);

    let summary = failure.summary();
    let mut lines = summary.lines();
    assert!(
        lines
            .next()
            .is_some_and(|line| line.starts_with("CssSyntaxError: ")),
        "{summary}"
    );
    let locator = lines.next().expect("summary has a locator line");
    assert!(locator.starts_with("[2,"), "{locator}");
    assert!(locator.ends_with(&source.display().to_string()), "{locator}");
}

#[tokio::test]
async fn missing_imports_are_reported_as_import_errors() {
    let fixture = Fixture::new();
    let source = fixture.write("docroot/site.pcss", "@import \"missing.css\";\n");

    let outcome = fixture
        .renderer(BuildMode::Development)
        .render(&source)
        .await
        .expect("transform failures are not errors");

    let failure = outcome.failure().expect("render should fail");
    assert_eq!(failure.name, "CssImportError");
}

#[tokio::test]
async fn unreadable_sources_are_errors() {
    let fixture = Fixture::new();
    let missing = fixture.docroot.join("nope.pcss");

    let err = fixture
        .renderer(BuildMode::Production)
        .render(&missing)
        .await
        .expect_err("missing file cannot be read");

    assert!(matches!(err, RenderError::Read { .. }));
}
