use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Malformed cache file {}: {detail}", path.display())]
    MalformedState { path: PathBuf, detail: String },

    #[error("Cache I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CacheError {
    pub(crate) fn malformed(path: &Path, detail: impl ToString) -> Self {
        CacheError::MalformedState {
            path: path.to_path_buf(),
            detail: detail.to_string(),
        }
    }

    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::NotFound { .. })
    }
}
