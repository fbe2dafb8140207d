//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{
    collections::BTreeMap,
    net::SocketAddr,
    num::NonZeroUsize,
    path::PathBuf,
    str::FromStr,
};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::domain::types::BuildMode;

pub use cli::{BuildArgs, CliArgs, Command, PipelineOverrides, ServeArgs};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "stylesmith";
const DEFAULT_PROTOCOL: &str = "https";
const DEFAULT_DOMAIN_NAME: &str = "localhost";
const DEFAULT_SRC_DIR: &str = "src";
const DEFAULT_DIST_DIR: &str = "dist";
const DEFAULT_DOCROOT_DIR: &str = "src/docroot";
const DEFAULT_SOURCE_EXTENSION: &str = "pcss";
const DEFAULT_BROWSERS_QUERY: &str = "defaults";
const DEFAULT_PRESET_STAGE: u8 = 1;
const MAX_PRESET_STAGE: u8 = 4;
const DEFAULT_BUILD_CONCURRENCY: usize = 8;
const MAX_BUILD_CONCURRENCY: usize = 64;
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub site: SiteSettings,
    pub paths: PathSettings,
    pub style: StyleSettings,
    pub build: BuildSettings,
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    /// Option bags for tooling outside the stylesheet pipeline, kept verbatim.
    pub tools: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub protocol: String,
    pub domain_name: String,
    pub title: String,
    pub description: String,
}

impl SiteSettings {
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.protocol, self.domain_name)
    }
}

#[derive(Debug, Clone)]
pub struct PathSettings {
    /// Root for entry-level `@import` resolution.
    pub src: PathBuf,
    /// Distribution root mirrored from the document root.
    pub dist: PathBuf,
    /// Document root scanned for sources and used for request mapping.
    pub docroot: PathBuf,
}

#[derive(Debug, Clone)]
pub struct StyleSettings {
    /// Source extension without the leading dot.
    pub extension: String,
    pub mode: BuildMode,
    pub preset: PresetSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetSettings {
    pub browsers: Vec<String>,
    pub stage: u8,
    pub autoprefixer: bool,
    pub nesting_rules: bool,
}

impl Default for PresetSettings {
    fn default() -> Self {
        Self {
            browsers: vec![DEFAULT_BROWSERS_QUERY.to_string()],
            stage: DEFAULT_PRESET_STAGE,
            autoprefixer: true,
            nesting_rules: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BuildSettings {
    pub concurrency: NonZeroUsize,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("STYLESMITH").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(args),
        Some(Command::Build(args)) => raw.apply_build_overrides(args),
        None => raw.apply_serve_overrides(&ServeArgs::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    site: RawSiteSettings,
    paths: RawPathSettings,
    style: RawStyleSettings,
    build: RawBuildSettings,
    server: RawServerSettings,
    logging: RawLoggingSettings,
    tools: BTreeMap<String, serde_json::Value>,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, args: &ServeArgs) {
        self.apply_pipeline_overrides(&args.pipeline);
        if let Some(host) = args.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = args.server_port {
            self.server.port = Some(port);
        }
    }

    fn apply_build_overrides(&mut self, args: &BuildArgs) {
        self.apply_pipeline_overrides(&args.pipeline);
        if let Some(concurrency) = args.concurrency {
            self.build.concurrency = Some(concurrency);
        }
    }

    fn apply_pipeline_overrides(&mut self, overrides: &PipelineOverrides) {
        if let Some(mode) = overrides.mode.as_ref() {
            self.style.mode = Some(mode.clone());
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            site,
            paths,
            style,
            build,
            server,
            logging,
            tools,
        } = raw;

        Ok(Self {
            site: build_site_settings(site)?,
            paths: build_path_settings(paths)?,
            style: build_style_settings(style)?,
            build: build_build_settings(build)?,
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            tools,
        })
    }
}

fn build_site_settings(site: RawSiteSettings) -> Result<SiteSettings, LoadError> {
    let protocol = site
        .protocol
        .unwrap_or_else(|| DEFAULT_PROTOCOL.to_string())
        .to_ascii_lowercase();
    if protocol != "http" && protocol != "https" {
        return Err(LoadError::invalid(
            "site.protocol",
            format!("expected `http` or `https`, got `{protocol}`"),
        ));
    }

    let domain_name = site
        .domain_name
        .unwrap_or_else(|| DEFAULT_DOMAIN_NAME.to_string());
    if domain_name.trim().is_empty() {
        return Err(LoadError::invalid("site.domain_name", "must not be empty"));
    }

    Ok(SiteSettings {
        protocol,
        domain_name,
        title: site.title.unwrap_or_default(),
        description: site.description.unwrap_or_default(),
    })
}

fn build_path_settings(paths: RawPathSettings) -> Result<PathSettings, LoadError> {
    let src = non_empty_path(paths.src, DEFAULT_SRC_DIR, "paths.src")?;
    let dist = non_empty_path(paths.dist, DEFAULT_DIST_DIR, "paths.dist")?;
    let docroot = non_empty_path(paths.docroot, DEFAULT_DOCROOT_DIR, "paths.docroot")?;

    if dist == docroot {
        return Err(LoadError::invalid(
            "paths.dist",
            "must differ from the document root",
        ));
    }

    Ok(PathSettings { src, dist, docroot })
}

fn build_style_settings(style: RawStyleSettings) -> Result<StyleSettings, LoadError> {
    let extension = style
        .extension
        .unwrap_or_else(|| DEFAULT_SOURCE_EXTENSION.to_string());
    let extension = extension.trim().trim_start_matches('.').to_string();
    if extension.is_empty() || extension.contains(['/', '\\', '.']) {
        return Err(LoadError::invalid(
            "style.extension",
            "must be a single non-empty file extension",
        ));
    }

    let mode = style
        .mode
        .as_deref()
        .map(BuildMode::from_switch)
        .unwrap_or_default();

    let preset = build_preset_settings(style.preset)?;

    Ok(StyleSettings {
        extension,
        mode,
        preset,
    })
}

fn build_preset_settings(preset: RawPresetSettings) -> Result<PresetSettings, LoadError> {
    let defaults = PresetSettings::default();

    let browsers = match preset.browsers {
        Some(queries) => {
            let queries: Vec<String> = queries
                .into_iter()
                .map(|query| query.trim().to_string())
                .filter(|query| !query.is_empty())
                .collect();
            if queries.is_empty() {
                return Err(LoadError::invalid(
                    "style.preset.browsers",
                    "at least one browserslist query is required",
                ));
            }
            queries
        }
        None => defaults.browsers,
    };

    let stage = preset.stage.unwrap_or(defaults.stage);
    if stage > MAX_PRESET_STAGE {
        return Err(LoadError::invalid(
            "style.preset.stage",
            format!("must be between 0 and {MAX_PRESET_STAGE}"),
        ));
    }

    Ok(PresetSettings {
        browsers,
        stage,
        autoprefixer: preset.autoprefixer.unwrap_or(defaults.autoprefixer),
        nesting_rules: preset.nesting_rules.unwrap_or(defaults.nesting_rules),
    })
}

fn build_build_settings(build: RawBuildSettings) -> Result<BuildSettings, LoadError> {
    let value = build.concurrency.unwrap_or(DEFAULT_BUILD_CONCURRENCY);
    let concurrency = NonZeroUsize::new(value.min(MAX_BUILD_CONCURRENCY))
        .ok_or_else(|| LoadError::invalid("build.concurrency", "must be greater than zero"))?;

    Ok(BuildSettings { concurrency })
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    Ok(ServerSettings { addr })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSiteSettings {
    protocol: Option<String>,
    domain_name: Option<String>,
    title: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawPathSettings {
    src: Option<PathBuf>,
    dist: Option<PathBuf>,
    docroot: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawStyleSettings {
    extension: Option<String>,
    mode: Option<String>,
    preset: RawPresetSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawPresetSettings {
    browsers: Option<Vec<String>>,
    stage: Option<u8>,
    autoprefixer: Option<bool>,
    nesting_rules: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawBuildSettings {
    concurrency: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

fn non_empty_path(
    value: Option<PathBuf>,
    default: &str,
    key: &'static str,
) -> Result<PathBuf, LoadError> {
    let path = value.unwrap_or_else(|| PathBuf::from(default));
    if path.as_os_str().is_empty() {
        return Err(LoadError::invalid(key, "path must not be empty"));
    }
    Ok(path)
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}
