use crate::{Settings, Term};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row of a solution sequence: variable name to bound term. Unbound variables are absent.
pub type Row = BTreeMap<String, Term>;

/// The uniform output of running a query through the gateway.
///
/// Serialized, a failure is `{"error": ..., "status"?: ...}` and a success is the SPARQL JSON
/// results document extended with the gateway's metadata members.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryResult {
    Failure(QueryFailure),
    Success(QuerySuccess),
}

impl QueryResult {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Failure(QueryFailure {
            error: message.into(),
            status: None,
        })
    }

    pub fn error_with_status(message: impl Into<String>, status: u16) -> Self {
        Self::Failure(QueryFailure {
            error: message.into(),
            status: Some(status),
        })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    pub fn as_success(&self) -> Option<&QuerySuccess> {
        match self {
            Self::Success(success) => Some(success),
            Self::Failure(_) => None,
        }
    }

    pub fn as_failure(&self) -> Option<&QueryFailure> {
        match self {
            Self::Failure(failure) => Some(failure),
            Self::Success(_) => None,
        }
    }
}

impl From<QuerySuccess> for QueryResult {
    fn from(success: QuerySuccess) -> Self {
        Self::Success(success)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFailure {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

/// A successful result together with where and how it was obtained.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuerySuccess {
    #[serde(flatten)]
    pub payload: ResultPayload,
    /// Wall-clock seconds of the execution that produced the payload.
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub endpoint_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub endpoint: String,
    #[serde(default)]
    pub cached: bool,
    /// Creation time of the cache row a cached result was read from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, rename = "shmarql_settings")]
    pub settings: Settings,
}

impl QuerySuccess {
    pub fn new(payload: ResultPayload) -> Self {
        Self {
            payload,
            duration: 0.0,
            endpoint_name: String::new(),
            endpoint: String::new(),
            cached: false,
            timestamp: None,
            settings: Settings::default(),
        }
    }
}

/// The part of a result that comes from the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultPayload {
    Solutions { head: Head, results: Bindings },
    Boolean { head: Head, boolean: bool },
    /// Serialized triples of a CONSTRUCT or DESCRIBE query, or any other non-JSON response body.
    Graph { data: String },
}

impl ResultPayload {
    pub fn solutions(vars: Vec<String>, bindings: Vec<Row>) -> Self {
        Self::Solutions {
            head: Head { vars, link: None },
            results: Bindings { bindings },
        }
    }

    pub fn boolean(value: bool) -> Self {
        Self::Boolean {
            head: Head::default(),
            boolean: value,
        }
    }

    pub fn graph(data: impl Into<String>) -> Self {
        Self::Graph { data: data.into() }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Head {
    #[serde(default)]
    pub vars: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<Vec<String>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bindings {
    pub bindings: Vec<Row>,
}
