use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the stylesmith binary.
#[derive(Debug, Parser)]
#[command(name = "stylesmith", version, about = "Stylesheet pipeline for static sites")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "STYLESMITH_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the development server that renders stylesheets on demand.
    Serve(Box<ServeArgs>),
    /// Render every stylesheet source under the document root into the distribution root.
    Build(BuildArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct PipelineOverrides {
    /// Build mode; `development` lints and fixes, any other value minifies.
    #[arg(long = "mode", env = "STYLESMITH_MODE", value_name = "MODE")]
    pub mode: Option<String>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub pipeline: PipelineOverrides,

    /// Override the development server host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the development server port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct BuildArgs {
    #[command(flatten)]
    pub pipeline: PipelineOverrides,

    /// Maximum number of stylesheets rendered at the same time.
    #[arg(long, value_name = "COUNT", value_parser = clap::value_parser!(usize))]
    pub concurrency: Option<usize>,
}
