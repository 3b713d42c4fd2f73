use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};

/// The form of a SPARQL query, derived from its leading keyword.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    Select,
    Construct,
    Ask,
    Describe,
    #[default]
    Unknown,
}

impl QueryType {
    /// Maps a query form keyword (case-insensitive) to its query type.
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword.to_ascii_lowercase().as_str() {
            "select" => Self::Select,
            "construct" => Self::Construct,
            "ask" => Self::Ask,
            "describe" => Self::Describe,
            _ => Self::Unknown,
        }
    }

    /// Returns true for the query forms that produce triples instead of bindings.
    pub fn produces_graph(self) -> bool {
        matches!(self, Self::Construct | Self::Describe)
    }
}

impl Display for QueryType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Select => "select",
            Self::Construct => "construct",
            Self::Ask => "ask",
            Self::Describe => "describe",
            Self::Unknown => "unknown",
        })
    }
}
