//! Filesystem helpers shared by the batch build and the development server.

use std::{
    io,
    path::{Path, PathBuf},
};

use uuid::Uuid;
use walkdir::WalkDir;

use crate::domain::paths::has_source_extension;

/// List every file below `root` (top level included) whose extension equals `extension`.
///
/// Results are sorted so repeated builds log in a stable order.
pub fn discover_sources(root: &Path, extension: &str) -> io::Result<Vec<PathBuf>> {
    let mut sources = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(io::Error::from)?;
        if entry.file_type().is_file() && has_source_extension(entry.path(), extension) {
            sources.push(entry.into_path());
        }
    }
    sources.sort();
    Ok(sources)
}

/// Write `contents` to `path`, creating missing parent directories.
///
/// The bytes land in a uniquely named sibling first and are renamed into place, so two
/// writers racing on the same destination never interleave their output.
pub async fn write_file(path: &Path, contents: &str) -> io::Result<()> {
    let parent = path.parent().filter(|parent| !parent.as_os_str().is_empty());
    if let Some(parent) = parent {
        tokio::fs::create_dir_all(parent).await?;
    }

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("`{}` has no file name", path.display()),
            )
        })?;
    let staging = path.with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4().simple()));

    if let Err(err) = tokio::fs::write(&staging, contents).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(err);
    }
    if let Err(err) = tokio::fs::rename(&staging, path).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(err);
    }
    Ok(())
}
