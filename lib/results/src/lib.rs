//! Turns a [`QueryResult`](shmarql_model::QueryResult) into bytes of a SPARQL results format.
//!
//! Bindings and graphs are interchangeable here: a graph can be written as `s`, `p`, `o`
//! bindings and bindings over `s`, `p`, `o` can be written as triples.

mod error;
mod format;
mod serializer;
mod tabular;

pub use error::{FormatParseError, SerializationError};
pub use format::ResultFormat;
pub use serializer::{serialize, SerializedResults};
