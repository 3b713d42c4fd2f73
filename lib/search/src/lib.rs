//! Search backends for the pseudo-predicates of the rewriter.
//!
//! Both backends only read existing indexes. Building them is done by other tools.

mod error;
mod fts;
mod http;

pub use error::IndexError;
pub use fts::FtsIndex;
pub use http::HttpSearchIndex;
