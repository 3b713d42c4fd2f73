use thiserror::Error;

/// An error raised while reading a term from its SPARQL JSON representation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum TermParseError {
    /// The `type` member is none of `uri`, `literal`, `typed-literal` or `bnode`.
    #[error("Unknown term type '{0}'")]
    UnknownType(String),
}
