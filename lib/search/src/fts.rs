use crate::IndexError;
use async_trait::async_trait;
use rusqlite::{Connection, OpenFlags};
use shmarql_rewrite::{FullTextSearch, SearchError};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

const SEARCH: &str = "SELECT uri FROM literal_index WHERE literal_index MATCH ?1 ORDER BY rank";
const STATS: &str = "SELECT uri, count(*) AS hits FROM literal_index WHERE literal_index MATCH ?1 \
                     GROUP BY uri ORDER BY hits DESC, uri";

/// A read-only SQLite FTS5 index with the table `literal_index(uri UNINDEXED, txt)`.
#[derive(Clone, Debug)]
pub struct FtsIndex {
    connection: Arc<Mutex<Connection>>,
}

impl FtsIndex {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, IndexError> {
        let connection = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self::from_connection(connection))
    }

    /// Uses an already opened connection, for example one to an in-memory database.
    pub fn from_connection(connection: Connection) -> Self {
        Self {
            connection: Arc::new(Mutex::new(connection)),
        }
    }

    async fn run<T, F>(&self, term: &str, f: F) -> Result<T, IndexError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection, &str) -> Result<T, rusqlite::Error> + Send + 'static,
    {
        let connection = Arc::clone(&self.connection);
        let expression = match_expression(term);
        debug!(term, expression = %expression, "Searching the full-text index");
        let result = tokio::task::spawn_blocking(move || {
            let connection = connection
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            f(&connection, &expression)
        })
        .await??;
        Ok(result)
    }
}

#[async_trait]
impl FullTextSearch for FtsIndex {
    async fn search(&self, term: &str) -> Result<Vec<String>, SearchError> {
        if term.trim().is_empty() {
            return Ok(Vec::new());
        }
        let uris = self
            .run(term, |connection, expression| {
                let mut statement = connection.prepare_cached(SEARCH)?;
                let rows = statement.query_map([expression], |row| row.get::<_, String>(0))?;
                let mut seen = HashSet::new();
                let mut uris = Vec::new();
                for uri in rows {
                    let uri = uri?;
                    if seen.insert(uri.clone()) {
                        uris.push(uri);
                    }
                }
                Ok(uris)
            })
            .await?;
        Ok(uris)
    }

    async fn stats(&self, term: &str) -> Result<Vec<(String, u64)>, SearchError> {
        if term.trim().is_empty() {
            return Ok(Vec::new());
        }
        let counts = self
            .run(term, |connection, expression| {
                let mut statement = connection.prepare_cached(STATS)?;
                let rows = statement.query_map([expression], |row| {
                    let hits: i64 = row.get(1)?;
                    Ok((row.get::<_, String>(0)?, u64::try_from(hits).unwrap_or_default()))
                })?;
                rows.collect()
            })
            .await?;
        Ok(counts)
    }
}

/// Turns free text into an FTS5 expression that matches all of its words.
///
/// Every word is quoted so that FTS5 operators in user input are taken literally. A trailing `*`
/// keeps its meaning as a prefix search.
fn match_expression(term: &str) -> String {
    term.split_whitespace()
        .map(|word| {
            let (word, prefix) = match word.strip_suffix('*') {
                Some(stem) if !stem.is_empty() => (stem, "*"),
                _ => (word, ""),
            };
            format!("\"{}\"{prefix}", word.replace('"', "\"\""))
        })
        .collect::<Vec<_>>()
        .join(" ")
}
