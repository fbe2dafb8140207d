//! Document-root file serving for the development server.

use std::{
    io,
    path::{Component, Path, PathBuf},
};

use axum::{
    extract::State,
    http::{HeaderValue, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;

use crate::application::error::HttpError;

use super::HttpState;

const SOURCE: &str = "infra::http::static_files::serve_docroot";
const INDEX_FILE: &str = "index.html";

pub async fn serve_docroot(State(state): State<HttpState>, uri: Uri) -> Response {
    let Some(path) = resolve(&state.doc_root, uri.path()) else {
        return HttpError::new(
            SOURCE,
            StatusCode::NOT_FOUND,
            "Not found",
            format!("`{}` escapes the document root", uri.path()),
        )
        .into_response();
    };

    match tokio::fs::read(&path).await {
        Ok(contents) => file_response(&path, Bytes::from(contents)),
        Err(err) if matches!(err.kind(), io::ErrorKind::NotFound | io::ErrorKind::IsADirectory) => {
            HttpError::new(
                SOURCE,
                StatusCode::NOT_FOUND,
                "Not found",
                format!("`{}` does not exist", path.display()),
            )
            .into_response()
        }
        Err(err) => HttpError::from_error(
            SOURCE,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error",
            &err,
        )
        .into_response(),
    }
}

/// Map a request path below `doc_root`. Directory requests get their index file.
fn resolve(doc_root: &Path, request_path: &str) -> Option<PathBuf> {
    let relative = request_path.trim_start_matches('/');
    let mut resolved = doc_root.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(segment) => resolved.push(segment),
            Component::CurDir => {}
            _ => return None,
        }
    }

    if relative.is_empty() || relative.ends_with('/') {
        resolved.push(INDEX_FILE);
    }
    Some(resolved)
}

fn file_response(path: &Path, bytes: Bytes) -> Response {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let mut response = bytes.into_response();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        response.headers_mut().insert(header::CONTENT_TYPE, value);
    }
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response
}
