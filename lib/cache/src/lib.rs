//! The query cache of the gateway.
//!
//! Results are keyed by the hash of the *rewritten* query text and recorded together with the
//! endpoint that produced them. Rows are only ever appended; a lookup returns the newest row.

mod error;
mod hash;
mod sqlite;

pub use error::CacheError;
pub use hash::hash_query;
pub use sqlite::SqliteQueryCache;

use async_trait::async_trait;
use shmarql_model::{QuerySuccess, ResultPayload};

/// A result as it was stored in the cache.
#[derive(Clone, Debug, PartialEq)]
pub struct CachedResult {
    pub query_hash: String,
    pub query: String,
    pub timestamp: String,
    pub endpoint: String,
    pub result: QuerySuccess,
    pub duration: f64,
}

impl CachedResult {
    /// The stored result, marked as cached and carrying the recorded duration and timestamp.
    pub fn into_query_result(self) -> QuerySuccess {
        QuerySuccess {
            cached: true,
            duration: self.duration,
            timestamp: Some(self.timestamp),
            ..self.result
        }
    }

    pub fn payload(&self) -> &ResultPayload {
        &self.result.payload
    }
}

/// A row to append to the cache.
#[derive(Clone, Copy, Debug)]
pub struct NewCacheEntry<'a> {
    pub query_hash: &'a str,
    pub query: &'a str,
    pub endpoint: &'a str,
    pub result: &'a QuerySuccess,
    pub duration: f64,
}

/// Storage for the results of executed queries.
#[async_trait]
pub trait QueryCache: Send + Sync {
    /// Returns the newest successful row for `query_hash`, restricted to `endpoint` if given.
    async fn lookup(
        &self,
        query_hash: &str,
        endpoint: Option<&str>,
    ) -> Result<Option<CachedResult>, CacheError>;

    /// Appends a row. Earlier rows for the same hash are kept.
    async fn store(&self, entry: NewCacheEntry<'_>) -> Result<(), CacheError>;
}
