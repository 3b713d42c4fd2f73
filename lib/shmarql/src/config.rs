use std::fmt;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// The default timeout for queries sent to remote endpoints.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);

/// Which cache rows may answer a query.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CacheScope {
    /// The newest row for the query, whichever endpoint produced it.
    #[default]
    AnyEndpoint,
    /// Only rows produced by the endpoint the query was resolved to.
    PerEndpoint,
}

impl FromStr for CacheScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "any" => Ok(Self::AnyEndpoint),
            "endpoint" => Ok(Self::PerEndpoint),
            other => Err(format!("Unknown cache scope '{other}', expected 'any' or 'endpoint'")),
        }
    }
}

impl Display for CacheScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CacheScope::AnyEndpoint => "any",
            CacheScope::PerEndpoint => "endpoint",
        })
    }
}

/// Everything needed to assemble a [`Gateway`](crate::Gateway) from the outside world.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub endpoint: Option<String>,
    /// URLs of the named endpoints. Paired up with `endpoint_names`.
    pub endpoints: Vec<String>,
    pub endpoint_names: Vec<String>,
    /// Directory of the local store. Without it, and without data, there is no local store.
    pub store_path: Option<PathBuf>,
    pub data_load_paths: Vec<String>,
    /// The SQLite database of the query cache. `None` disables caching.
    pub queries_db: Option<PathBuf>,
    pub fts_filepath: Option<PathBuf>,
    pub vector_search_url: Option<String>,
    pub prefixes_file: Option<PathBuf>,
    pub cache_scope: CacheScope,
    pub timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            endpoints: Vec::new(),
            endpoint_names: Vec::new(),
            store_path: None,
            data_load_paths: Vec::new(),
            queries_db: Some(PathBuf::from("queries.db")),
            fts_filepath: None,
            vector_search_url: None,
            prefixes_file: None,
            cache_scope: CacheScope::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl GatewayConfig {
    /// Returns true if a local store should be opened.
    pub fn wants_local_store(&self) -> bool {
        self.store_path.is_some() || !self.data_load_paths.is_empty()
    }
}
