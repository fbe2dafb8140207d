//! Pure path mapping between the document root, the distribution root and request paths.

use std::path::{Component, Path, PathBuf};

use super::error::DomainError;

const CSS_EXTENSION: &str = "css";
const CSS_SUFFIX: &str = ".css";

/// Whether `path` carries the configured source extension (compared verbatim, without the dot).
pub fn has_source_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|value| value.to_str())
        .is_some_and(|value| value == extension)
}

/// Map a source file under `doc_root` to its mirrored `.css` file under `dist_root`.
pub fn destination_path(
    doc_root: &Path,
    dist_root: &Path,
    source: &Path,
) -> Result<PathBuf, DomainError> {
    let relative = source
        .strip_prefix(doc_root)
        .map_err(|_| DomainError::outside_root(source, doc_root))?;

    Ok(dist_root.join(relative).with_extension(CSS_EXTENSION))
}

/// Map a request path such as `/css/site.css` to `doc_root/css/site.<extension>`.
///
/// Returns `None` when the path does not end in `.css` (ASCII case-insensitive) or
/// tries to leave the document root.
pub fn source_for_request(doc_root: &Path, request_path: &str, extension: &str) -> Option<PathBuf> {
    let stem_len = request_path.len().checked_sub(CSS_SUFFIX.len())?;
    if !request_path.is_char_boundary(stem_len) {
        return None;
    }
    let (stem, suffix) = request_path.split_at(stem_len);
    if !suffix.eq_ignore_ascii_case(CSS_SUFFIX) {
        return None;
    }

    let relative = Path::new(stem.trim_start_matches('/'));
    let escapes = relative
        .components()
        .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir));
    if escapes {
        return None;
    }

    Some(doc_root.join(format!("{}.{extension}", relative.display())))
}
