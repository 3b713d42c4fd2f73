use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SerializationError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// The name of an unknown result format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown result format '{0}', expected one of json, xml, csv, turtle, ntriples")]
pub struct FormatParseError(pub String);
