mod error;
mod query_type;
mod result;
mod rewrite;
mod settings;
mod term;
pub mod vocab;

pub use error::*;
pub use query_type::QueryType;
pub use result::*;
pub use rewrite::RewriteResult;
pub use settings::Settings;
pub use term::*;
