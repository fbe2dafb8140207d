//! HTTP surface of the development server.

mod middleware;
mod static_files;
mod stylesheets;

use std::{path::Path, sync::Arc};

use axum::{Router, middleware as axum_middleware};

use crate::application::render::StylesheetRenderer;
use crate::config::Settings;

pub use middleware::RequestContext;
use middleware::{log_responses, set_request_context};
use static_files::serve_docroot;
pub use stylesheets::render_stylesheets;

/// Shared state for the stylesheet middleware and the document-root fallback.
#[derive(Clone)]
pub struct HttpState {
    pub renderer: StylesheetRenderer,
    pub doc_root: Arc<Path>,
    pub extension: Arc<str>,
}

impl HttpState {
    pub fn new(renderer: StylesheetRenderer, settings: &Settings) -> Self {
        Self {
            renderer,
            doc_root: Arc::from(settings.paths.docroot.as_path()),
            extension: Arc::from(settings.style.extension.as_str()),
        }
    }
}

/// Router that renders stylesheets on demand and serves everything else from the
/// document root.
pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .fallback(serve_docroot)
        .with_state(state.clone())
        .layer(axum_middleware::from_fn_with_state(
            state,
            render_stylesheets,
        ))
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
