use shmarql_model::QueryResult;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// No backend is able to answer a query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ResolveError {
    #[error("No endpoint found")]
    NoEndpointFound,
}

/// An error raised while executing a query on its resolved target.
///
/// The display text of every variant is what callers of the gateway get to see.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExecutionError {
    /// The remote endpoint could not be reached or did not answer in time.
    #[error("could not connect")]
    Connection,
    /// The remote endpoint answered with status 500. Holds its response body.
    #[error("{0}")]
    RemoteQuery(String),
    /// The remote endpoint answered with another unexpected status.
    #[error("{body}")]
    RemoteStatus { status: u16, body: String },
    /// The local store could not parse or evaluate the query.
    #[error("{0}")]
    Local(String),
}

impl ExecutionError {
    pub fn into_query_result(self) -> QueryResult {
        match self {
            ExecutionError::RemoteStatus { status, body } => {
                QueryResult::error_with_status(body, status)
            }
            error => QueryResult::error(error.to_string()),
        }
    }
}

/// An error in the configuration of the gateway.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("{names} endpoint names were given for {urls} endpoint URLs")]
    EndpointListMismatch { names: usize, urls: usize },
    #[error("Could not read prefix file {path}: {error}")]
    PrefixFile {
        path: PathBuf,
        #[source]
        error: io::Error,
    },
    #[error("Invalid prefix file {path}: {error}")]
    PrefixFormat {
        path: PathBuf,
        #[source]
        error: serde_json::Error,
    },
    #[error("Could not create the HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// An error raised while opening or loading the local store.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Storage(#[from] oxigraph::store::StorageError),
    #[error(transparent)]
    Loader(#[from] oxigraph::store::LoaderError),
    #[error(transparent)]
    Serializer(#[from] oxigraph::store::SerializerError),
    #[error("Could not download {url}: {error}")]
    Download {
        url: String,
        #[source]
        error: reqwest::Error,
    },
    #[error("Loading task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("Unknown RDF format for {0}")]
    UnknownFormat(String),
}
