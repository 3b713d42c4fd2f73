use crate::{QueryType, Settings};

/// The outcome of rewriting a query before it is executed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RewriteResult {
    pub rewritten_query: String,
    /// Comment lines, verbatim and in query order.
    pub comments: Vec<String>,
    pub settings: Settings,
    pub query_type: QueryType,
}

impl RewriteResult {
    /// A result that leaves `query` untouched and carries no comments or settings.
    pub fn unmodified(query: impl Into<String>) -> Self {
        Self {
            rewritten_query: query.into(),
            ..Self::default()
        }
    }

    /// The endpoint name requested by a `shmarql-engine` directive. The last directive wins and
    /// only its last whitespace-separated token is used.
    pub fn engine_directive(&self) -> Option<&str> {
        self.settings
            .last(Settings::ENGINE)
            .and_then(|value| value.split_whitespace().last())
    }

    pub fn no_cache(&self) -> bool {
        self.settings.contains(Settings::NOCACHE)
    }
}
