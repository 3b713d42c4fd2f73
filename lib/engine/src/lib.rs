//! Decides where a SPARQL query runs and runs it.
//!
//! Queries go to a remote endpoint from the [`EndpointRegistry`] or to the embedded
//! [`LocalStore`]. The [`resolve`] function picks the target and the [`QueryExecutor`] sends the
//! query there.

mod error;
mod executor;
mod prefixes;
mod registry;
mod resolver;
mod store;

pub use error::{ConfigError, ExecutionError, ResolveError, StoreError};
pub use executor::{QueryExecutor, SHMARQL_USER_AGENT};
pub use prefixes::Prefixes;
pub use registry::{EndpointRegistry, DEFAULT_ENDPOINT_NAME};
pub use resolver::{resolve, resolve_with_rng, EndpointTarget, LocalStoreState, LOCAL_TARGET};
pub use store::{guess_format, LoadState, LocalStore, StoreOptions, StoreRole};

pub use oxigraph::io::RdfFormat;
