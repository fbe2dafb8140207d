//! On-demand stylesheet rendering for the development server.
//!
//! A request for `/a/b.css` is answered from `<docroot>/a/b.<extension>` when that
//! source exists. Any other request passes through untouched.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::debug;

use crate::application::error::ErrorReport;
use crate::domain::{paths::source_for_request, types::RenderOutcome};

use super::HttpState;

const SOURCE: &str = "infra::http::stylesheets::render_stylesheets";

pub async fn render_stylesheets(
    State(state): State<HttpState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(source) = source_for_request(&state.doc_root, request.uri().path(), &state.extension)
    else {
        return next.run(request).await;
    };

    let is_file = tokio::fs::metadata(&source)
        .await
        .map(|metadata| metadata.is_file())
        .unwrap_or(false);
    if !is_file {
        return next.run(request).await;
    }

    debug!(
        target = "stylesmith::http::stylesheets",
        path = %request.uri().path(),
        source = %source.display(),
        "rendering stylesheet on demand"
    );

    match state.renderer.render(&source).await {
        Ok(RenderOutcome::Rendered(css)) => css_response(css),
        Ok(RenderOutcome::Failed(failure)) => {
            let message = failure.summary();
            let mut response = json_error(&message);
            ErrorReport::from_message(SOURCE, StatusCode::INTERNAL_SERVER_ERROR, message)
                .attach(&mut response);
            response
        }
        Err(err) => {
            let mut response = json_error(&err.to_string());
            ErrorReport::from_error(SOURCE, StatusCode::INTERNAL_SERVER_ERROR, &err)
                .attach(&mut response);
            response
        }
    }
}

fn css_response(css: String) -> Response {
    let mut response = css.into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/css"));
    response
}

fn json_error(message: &str) -> Response {
    let body = json!({ "message": message }).to_string();
    let mut response = (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}
