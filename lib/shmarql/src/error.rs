use shmarql_cache::CacheError;
use shmarql_engine::{ConfigError, StoreError};
use shmarql_search::IndexError;
use thiserror::Error;

/// An error raised while setting up a [`Gateway`](crate::Gateway).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GatewayError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Could not open the local store: {0}")]
    Store(#[from] StoreError),
    #[error("Could not open the query cache: {0}")]
    Cache(#[from] CacheError),
    #[error("Could not open the search index: {0}")]
    Index(#[from] IndexError),
}
