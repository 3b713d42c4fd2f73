use crate::{CacheError, CachedResult, NewCacheEntry, QueryCache};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS queries (
    queryhash TEXT,
    query TEXT,
    timestamp TEXT,
    endpoint TEXT,
    result TEXT,
    duration FLOAT
);
CREATE INDEX IF NOT EXISTS queries_queryhash ON queries (queryhash);";

const COLUMNS: &str = "queryhash, query, timestamp, endpoint, result, duration";
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// A [`QueryCache`] in a SQLite database, shared by all worker processes that use the same file.
#[derive(Clone, Debug)]
pub struct SqliteQueryCache {
    connection: Arc<Mutex<Connection>>,
}

type RawRow = (String, String, String, String, String, f64);

impl SqliteQueryCache {
    /// Opens the cache database at `path`, creating the table if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Opening query cache");
        Self::init(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self, CacheError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(connection: Connection) -> Result<Self, CacheError> {
        connection.pragma_update(None, "journal_mode", "WAL")?;
        connection.busy_timeout(BUSY_TIMEOUT)?;
        connection.execute_batch(SCHEMA)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Returns every successful row for `query_hash`, oldest first.
    pub async fn entries(&self, query_hash: &str) -> Result<Vec<CachedResult>, CacheError> {
        let query_hash = query_hash.to_owned();
        let rows = self
            .with_connection(move |connection| {
                let sql = format!(
                    "SELECT {COLUMNS} FROM queries WHERE queryhash = ?1 AND result IS NOT NULL \
                     ORDER BY timestamp, rowid"
                );
                let mut statement = connection.prepare(&sql)?;
                let rows = statement.query_map([query_hash], read_row)?;
                rows.collect::<Result<Vec<_>, _>>()
            })
            .await?;
        rows.into_iter().map(into_cached_result).collect()
    }

    async fn with_connection<T, F>(&self, f: F) -> Result<T, CacheError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, rusqlite::Error> + Send + 'static,
    {
        let connection = Arc::clone(&self.connection);
        tokio::task::spawn_blocking(move || {
            let connection = connection.lock().map_err(|_| CacheError::Poisoned)?;
            Ok(f(&connection)?)
        })
        .await?
    }
}

#[async_trait]
impl QueryCache for SqliteQueryCache {
    async fn lookup(
        &self,
        query_hash: &str,
        endpoint: Option<&str>,
    ) -> Result<Option<CachedResult>, CacheError> {
        let query_hash = query_hash.to_owned();
        let endpoint = endpoint.map(str::to_owned);
        let row = self
            .with_connection(move |connection| match endpoint {
                Some(endpoint) => connection
                    .query_row(
                        &format!(
                            "SELECT {COLUMNS} FROM queries \
                             WHERE queryhash = ?1 AND endpoint = ?2 AND result IS NOT NULL \
                             ORDER BY timestamp DESC, rowid DESC LIMIT 1"
                        ),
                        params![query_hash, endpoint],
                        read_row,
                    )
                    .optional(),
                None => connection
                    .query_row(
                        &format!(
                            "SELECT {COLUMNS} FROM queries \
                             WHERE queryhash = ?1 AND result IS NOT NULL \
                             ORDER BY timestamp DESC, rowid DESC LIMIT 1"
                        ),
                        params![query_hash],
                        read_row,
                    )
                    .optional(),
            })
            .await?;
        row.map(into_cached_result).transpose()
    }

    async fn store(&self, entry: NewCacheEntry<'_>) -> Result<(), CacheError> {
        let result = serde_json::to_string(entry.result)?;
        let values = (
            entry.query_hash.to_owned(),
            entry.query.to_owned(),
            entry.endpoint.to_owned(),
            result,
            entry.duration,
        );
        self.with_connection(move |connection| {
            connection.execute(
                "INSERT INTO queries (queryhash, query, timestamp, endpoint, result, duration) \
                 VALUES (?1, ?2, strftime('%Y-%m-%d %H:%M:%f', 'now'), ?3, ?4, ?5)",
                params![values.0, values.1, values.2, values.3, values.4],
            )
        })
        .await?;
        debug!(query_hash = entry.query_hash, endpoint = entry.endpoint, "Cached query result");
        Ok(())
    }
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        row.get(4)?,
        row.get::<_, Option<f64>>(5)?.unwrap_or_default(),
    ))
}

fn into_cached_result(
    (query_hash, query, timestamp, endpoint, result, duration): RawRow,
) -> Result<CachedResult, CacheError> {
    Ok(CachedResult {
        query_hash,
        query,
        timestamp,
        endpoint,
        result: serde_json::from_str(&result)?,
        duration,
    })
}
