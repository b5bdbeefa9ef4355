use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store already exists at {0}, overwriting is not permitted")]
    AlreadyExists(PathBuf),

    #[error("no store found at {0}")]
    NotFound(PathBuf),

    #[error("article '{0}' is already expanded")]
    AlreadyExpanded(String),

    #[error("allocation conflict: '{name}' is persisted but missing from the working set")]
    AllocationConflict { name: String },

    #[error("consistency check failed for {table}: {persisted} persisted rows vs {cached} cached names")]
    ConsistencyCheckFailed {
        table: &'static str,
        persisted: i64,
        cached: i64,
    },

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
