//! Batch build: render every source under the document root into the dist tree.

use std::{
    io,
    num::NonZeroUsize,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use futures::stream::{self, TryStreamExt};
use metrics::counter;
use thiserror::Error;
use tracing::{debug, info};

use crate::application::render::{RenderError, StylesheetRenderer};
use crate::config::Settings;
use crate::domain::{
    error::DomainError,
    paths::destination_path,
    types::{BuildSummary, RenderOutcome},
};
use crate::infra::fs::{discover_sources, write_file};

const METRIC_BUILD_WRITTEN_TOTAL: &str = "stylesmith_build_written_total";

/// Where sources are discovered and where rendered files land.
#[derive(Debug, Clone)]
pub struct BuildLayout {
    pub doc_root: PathBuf,
    pub dist_root: PathBuf,
    pub extension: String,
}

impl From<&Settings> for BuildLayout {
    fn from(settings: &Settings) -> Self {
        Self {
            doc_root: settings.paths.docroot.clone(),
            dist_root: settings.paths.dist.clone(),
            extension: settings.style.extension.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to discover sources under `{root}`: {source}")]
    Discover { root: String, source: io::Error },
    #[error("source discovery worker failed: {0}")]
    Worker(String),
    #[error("failed to write `{path}`: {source}")]
    Write { path: String, source: io::Error },
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl BuildError {
    fn discover(root: &Path, source: io::Error) -> Self {
        Self::Discover {
            root: root.display().to_string(),
            source,
        }
    }

    fn write(path: &Path, source: io::Error) -> Self {
        Self::Write {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Render every source below `layout.doc_root` and mirror the successes into
/// `layout.dist_root` with a `.css` extension.
///
/// Transform failures are logged by the renderer and counted; they never abort the
/// batch. Filesystem faults do.
pub async fn build_all(
    renderer: &StylesheetRenderer,
    layout: &BuildLayout,
    concurrency: NonZeroUsize,
) -> Result<BuildSummary, BuildError> {
    let doc_root = layout.doc_root.clone();
    let extension = layout.extension.clone();
    let sources = tokio::task::spawn_blocking(move || discover_sources(&doc_root, &extension))
        .await
        .map_err(|err| BuildError::Worker(err.to_string()))?
        .map_err(|err| BuildError::discover(&layout.doc_root, err))?;

    let discovered = sources.len();
    info!(
        target = "stylesmith::build",
        discovered,
        mode = %renderer.mode(),
        doc_root = %layout.doc_root.display(),
        dist_root = %layout.dist_root.display(),
        "building stylesheets"
    );

    let rendered = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let rendered_handle = rendered.clone();
    let failed_handle = failed.clone();

    stream::iter(sources.into_iter().map(Ok::<_, BuildError>))
        .try_for_each_concurrent(Some(concurrency.get()), move |source| {
            let rendered = rendered_handle.clone();
            let failed = failed_handle.clone();
            async move {
                match renderer.render(&source).await? {
                    RenderOutcome::Rendered(css) => {
                        let destination =
                            destination_path(&layout.doc_root, &layout.dist_root, &source)?;
                        write_file(&destination, &css)
                            .await
                            .map_err(|err| BuildError::write(&destination, err))?;
                        debug!(
                            target = "stylesmith::build",
                            source = %source.display(),
                            destination = %destination.display(),
                            "stylesheet written"
                        );
                        counter!(METRIC_BUILD_WRITTEN_TOTAL).increment(1);
                        rendered.fetch_add(1, Ordering::Relaxed);
                    }
                    RenderOutcome::Failed(_) => {
                        failed.fetch_add(1, Ordering::Relaxed);
                    }
                }
                Ok(())
            }
        })
        .await?;

    let summary = BuildSummary {
        discovered,
        rendered: rendered.load(Ordering::Relaxed),
        failed: failed.load(Ordering::Relaxed),
    };
    info!(
        target = "stylesmith::build",
        discovered = summary.discovered,
        rendered = summary.rendered,
        failed = summary.failed,
        "build finished"
    );
    Ok(summary)
}
