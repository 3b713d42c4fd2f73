use shmarql_rewrite::SearchError;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IndexError {
    #[error("Full-text index error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Search task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("Search service error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Search service returned status {0}")]
    Status(u16),
}

impl From<IndexError> for SearchError {
    fn from(error: IndexError) -> Self {
        SearchError::backend(error)
    }
}
