use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config {path:?}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("no image files found in {0:?}")]
    NoImages(PathBuf),

    #[error("failed to load image {path:?}: {reason}")]
    AssetLoad { path: PathBuf, reason: String },

    #[error("renderer error: {0}")]
    Render(String),
}

impl ViewerError {
    pub fn asset_load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        ViewerError::AssetLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T, E = ViewerError> = std::result::Result<T, E>;
