use std::path::PathBuf;

use thiserror::Error;

use crate::model::FileId;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to persist registry to {path}: {source}")]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize registry state: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("path is not valid UTF-8: {0}")]
    NonUtf8Path(PathBuf),

    #[error("unknown file id: {0}")]
    UnknownFile(FileId),
}
