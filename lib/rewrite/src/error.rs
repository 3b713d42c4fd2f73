use std::error::Error;
use thiserror::Error;

/// An error raised while rewriting a query.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RewriteError {
    /// The query could not be tokenized far enough to locate its triple patterns.
    #[error("Could not parse the query at byte {position}: {message}")]
    Syntax { position: usize, message: String },
    /// A search backend failed while resolving a pseudo-predicate.
    #[error("Search rewriting error: {0}")]
    Search(#[from] SearchError),
}

impl RewriteError {
    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            position,
            message: message.into(),
        }
    }
}

/// An error raised by a search backend.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SearchError {
    #[error("The operand {0} is not supported by this search")]
    UnsupportedOperand(String),
    #[error(transparent)]
    Backend(Box<dyn Error + Send + Sync + 'static>),
}

impl SearchError {
    pub fn backend(error: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        Self::Backend(error.into())
    }
}
