use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CacheError {
    #[error("Query cache database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Cached result is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Query cache task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("Query cache connection is poisoned")]
    Poisoned,
}
