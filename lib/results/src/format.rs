use crate::FormatParseError;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The formats a result can be serialized to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ResultFormat {
    #[default]
    Json,
    Xml,
    Csv,
    Turtle,
    NTriples,
}

impl ResultFormat {
    pub const ALL: [ResultFormat; 5] = [
        ResultFormat::Json,
        ResultFormat::Xml,
        ResultFormat::Csv,
        ResultFormat::Turtle,
        ResultFormat::NTriples,
    ];

    pub fn media_type(self) -> &'static str {
        match self {
            ResultFormat::Json => "application/sparql-results+json",
            ResultFormat::Xml => "application/sparql-results+xml",
            ResultFormat::Csv => "text/csv",
            ResultFormat::Turtle => "text/turtle",
            ResultFormat::NTriples => "application/n-triples",
        }
    }

    /// Looks up a format by media type, ignoring parameters such as `charset`.
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        let essence = media_type.split(';').next()?.trim().to_ascii_lowercase();
        match essence.as_str() {
            "application/sparql-results+json" | "application/json" => Some(Self::Json),
            "application/sparql-results+xml" | "application/xml" | "text/xml" => Some(Self::Xml),
            "text/csv" => Some(Self::Csv),
            "text/turtle" | "application/x-turtle" => Some(Self::Turtle),
            "application/n-triples" | "text/plain" => Some(Self::NTriples),
            _ => None,
        }
    }

    /// Looks up a format by its short name, as used in a `format` request parameter.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "xml" => Some(Self::Xml),
            "csv" => Some(Self::Csv),
            "turtle" | "ttl" => Some(Self::Turtle),
            "ntriples" | "n-triples" | "nt" => Some(Self::NTriples),
            other => Self::from_media_type(other),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ResultFormat::Json => "json",
            ResultFormat::Xml => "xml",
            ResultFormat::Csv => "csv",
            ResultFormat::Turtle => "turtle",
            ResultFormat::NTriples => "ntriples",
        }
    }

    /// Returns true for the formats that can only hold triples.
    pub fn is_graph_format(self) -> bool {
        matches!(self, ResultFormat::Turtle | ResultFormat::NTriples)
    }
}

impl FromStr for ResultFormat {
    type Err = FormatParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| FormatParseError(s.to_owned()))
    }
}

impl Display for ResultFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
