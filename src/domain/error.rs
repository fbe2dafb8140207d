use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("path `{path}` is not inside `{root}`")]
    OutsideRoot { path: String, root: String },
}

impl DomainError {
    pub fn outside_root(path: &Path, root: &Path) -> Self {
        Self::OutsideRoot {
            path: path.display().to_string(),
            root: root.display().to_string(),
        }
    }
}
