use std::process;

use stylesmith::{
    application::{
        build::{BuildLayout, build_all},
        error::AppError,
        render::{PipelineConfig, StylesheetRenderer},
    },
    config,
    infra::{
        error::InfraError,
        http::{self, HttpState},
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(target = "stylesmith", error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(target = "stylesmith", error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging)?;

    let renderer = StylesheetRenderer::new(&PipelineConfig::from(&settings))?;
    info!(
        target = "stylesmith",
        mode = %renderer.mode(),
        stages = ?renderer.stage_names(),
        site = %settings.site.base_url(),
        "stylesheet pipeline ready"
    );

    match command {
        config::Command::Serve(_) => run_serve(settings, renderer).await,
        config::Command::Build(_) => run_build(settings, renderer).await,
    }
}

async fn run_build(
    settings: config::Settings,
    renderer: StylesheetRenderer,
) -> Result<(), AppError> {
    let layout = BuildLayout::from(&settings);
    build_all(&renderer, &layout, settings.build.concurrency).await?;
    Ok(())
}

async fn run_serve(
    settings: config::Settings,
    renderer: StylesheetRenderer,
) -> Result<(), AppError> {
    let router = http::build_router(HttpState::new(renderer, &settings));

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(InfraError::from)?;
    info!(
        target = "stylesmith::serve",
        addr = %settings.server.addr,
        doc_root = %settings.paths.docroot.display(),
        "development server listening"
    );

    axum::serve(listener, router.into_make_service())
        .await
        .map_err(InfraError::from)?;

    Ok(())
}
