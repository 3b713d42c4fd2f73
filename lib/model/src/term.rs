use crate::vocab::{rdf, xsd};
use crate::TermParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter, Write};

/// An RDF term that is bound to a variable in a result row.
///
/// The serde representation is the term object of the
/// [SPARQL 1.1 JSON results format](https://www.w3.org/TR/sparql11-results-json/#select-encode-terms).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTerm", into = "RawTerm")]
pub enum Term {
    Uri(String),
    Literal(Literal),
    BlankNode(String),
}

impl Term {
    pub fn uri(value: impl Into<String>) -> Self {
        Self::Uri(value.into())
    }

    pub fn blank_node(value: impl Into<String>) -> Self {
        Self::BlankNode(value.into())
    }

    /// Returns the lexical value of the term, without any type information.
    pub fn value(&self) -> &str {
        match self {
            Term::Uri(value) | Term::BlankNode(value) => value,
            Term::Literal(literal) => literal.value(),
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal(_))
    }

    /// Converts this term into its oxrdf counterpart without validating IRIs or blank node ids.
    ///
    /// Remote endpoints do not always produce valid terms and the results are only re-serialized.
    pub fn to_oxrdf(&self) -> oxrdf::Term {
        match self {
            Term::Uri(value) => oxrdf::NamedNode::new_unchecked(value.as_str()).into(),
            Term::BlankNode(value) => oxrdf::BlankNode::new_unchecked(value.as_str()).into(),
            Term::Literal(literal) => literal.to_oxrdf().into(),
        }
    }
}

impl From<Literal> for Term {
    fn from(literal: Literal) -> Self {
        Self::Literal(literal)
    }
}

impl From<oxrdf::TermRef<'_>> for Term {
    fn from(term: oxrdf::TermRef<'_>) -> Self {
        match term {
            oxrdf::TermRef::NamedNode(node) => Self::Uri(node.as_str().to_owned()),
            oxrdf::TermRef::BlankNode(node) => Self::BlankNode(node.as_str().to_owned()),
            oxrdf::TermRef::Literal(literal) => Self::Literal(literal.into()),
            // Quoted triples have no representation in the results format we emit.
            oxrdf::TermRef::Triple(triple) => Self::Literal(Literal::new_simple(triple.to_string())),
        }
    }
}

impl From<&oxrdf::Term> for Term {
    fn from(term: &oxrdf::Term) -> Self {
        term.as_ref().into()
    }
}

impl Display for Term {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Term::Uri(value) => write!(f, "<{value}>"),
            Term::BlankNode(value) => write!(f, "_:{value}"),
            Term::Literal(literal) => literal.fmt(f),
        }
    }
}

/// An RDF literal. A literal carries either a datatype or a language tag, never both.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Literal {
    value: String,
    kind: LiteralKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    Simple,
    Typed(String),
    LanguageTagged(String),
}

impl Literal {
    pub fn new_simple(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: LiteralKind::Simple,
        }
    }

    /// Creates a typed literal. `xsd:string` is normalized to a simple literal.
    pub fn new_typed(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        let datatype = datatype.into();
        let kind = if datatype == xsd::STRING {
            LiteralKind::Simple
        } else {
            LiteralKind::Typed(datatype)
        };
        Self {
            value: value.into(),
            kind,
        }
    }

    pub fn new_language_tagged(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: LiteralKind::LanguageTagged(language.into()),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn kind(&self) -> &LiteralKind {
        &self.kind
    }

    pub fn datatype(&self) -> Option<&str> {
        match &self.kind {
            LiteralKind::Typed(datatype) => Some(datatype),
            LiteralKind::Simple | LiteralKind::LanguageTagged(_) => None,
        }
    }

    pub fn language(&self) -> Option<&str> {
        match &self.kind {
            LiteralKind::LanguageTagged(language) => Some(language),
            LiteralKind::Simple | LiteralKind::Typed(_) => None,
        }
    }

    pub fn to_oxrdf(&self) -> oxrdf::Literal {
        match &self.kind {
            LiteralKind::Simple => oxrdf::Literal::new_simple_literal(self.value.as_str()),
            LiteralKind::Typed(datatype) => oxrdf::Literal::new_typed_literal(
                self.value.as_str(),
                oxrdf::NamedNode::new_unchecked(datatype.as_str()),
            ),
            LiteralKind::LanguageTagged(language) => {
                oxrdf::Literal::new_language_tagged_literal_unchecked(
                    self.value.as_str(),
                    language.as_str(),
                )
            }
        }
    }
}

impl From<oxrdf::LiteralRef<'_>> for Literal {
    fn from(literal: oxrdf::LiteralRef<'_>) -> Self {
        if let Some(language) = literal.language() {
            Self::new_language_tagged(literal.value(), language)
        } else {
            Self::new_typed(literal.value(), literal.datatype().as_str())
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_char('"')?;
        for c in self.value.chars() {
            match c {
                '"' => f.write_str("\\\"")?,
                '\\' => f.write_str("\\\\")?,
                '\n' => f.write_str("\\n")?,
                '\r' => f.write_str("\\r")?,
                c => f.write_char(c)?,
            }
        }
        f.write_char('"')?;
        match &self.kind {
            LiteralKind::Simple => Ok(()),
            LiteralKind::Typed(datatype) => write!(f, "^^<{datatype}>"),
            LiteralKind::LanguageTagged(language) => write!(f, "@{language}"),
        }
    }
}

/// The wire shape of a term in SPARQL JSON results.
#[derive(Serialize, Deserialize)]
struct RawTerm {
    #[serde(rename = "type")]
    kind: String,
    value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    datatype: Option<String>,
    #[serde(default, rename = "xml:lang", skip_serializing_if = "Option::is_none")]
    language: Option<String>,
}

impl TryFrom<RawTerm> for Term {
    type Error = TermParseError;

    fn try_from(raw: RawTerm) -> Result<Self, Self::Error> {
        match raw.kind.as_str() {
            "uri" => Ok(Term::Uri(raw.value)),
            "bnode" => Ok(Term::BlankNode(raw.value)),
            "literal" | "typed-literal" => {
                // Some endpoints send rdf:langString alongside the tag; the tag wins.
                let literal = match (raw.language, raw.datatype) {
                    (Some(language), _) => Literal::new_language_tagged(raw.value, language),
                    (None, Some(datatype)) if datatype != rdf::LANG_STRING => {
                        Literal::new_typed(raw.value, datatype)
                    }
                    (None, _) => Literal::new_simple(raw.value),
                };
                Ok(Term::Literal(literal))
            }
            _ => Err(TermParseError::UnknownType(raw.kind)),
        }
    }
}

impl From<Term> for RawTerm {
    fn from(term: Term) -> Self {
        match term {
            Term::Uri(value) => RawTerm {
                kind: "uri".to_owned(),
                value,
                datatype: None,
                language: None,
            },
            Term::BlankNode(value) => RawTerm {
                kind: "bnode".to_owned(),
                value,
                datatype: None,
                language: None,
            },
            Term::Literal(Literal { value, kind }) => {
                let (datatype, language) = match kind {
                    LiteralKind::Simple => (None, None),
                    LiteralKind::Typed(datatype) => (Some(datatype), None),
                    LiteralKind::LanguageTagged(language) => (None, Some(language)),
                };
                RawTerm {
                    kind: "literal".to_owned(),
                    value,
                    datatype,
                    language,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn all_variants() -> Vec<Term> {
        vec![
            Term::uri("http://x/1"),
            Term::Literal(Literal::new_typed(
                "42",
                "http://www.w3.org/2001/XMLSchema#integer",
            )),
            Term::Literal(Literal::new_language_tagged("hallo", "de")),
            Term::Literal(Literal::new_simple("hello")),
            Term::blank_node("b0"),
        ]
    }

    #[test]
    fn json_round_trip_preserves_every_variant() -> Result<(), serde_json::Error> {
        for term in all_variants() {
            let json = serde_json::to_value(&term)?;
            let parsed: Term = serde_json::from_value(json.clone())?;
            assert_eq!(parsed, term);
            assert_eq!(serde_json::to_value(&parsed)?, json);
        }
        Ok(())
    }

    #[test]
    fn json_shape_follows_sparql_results() -> Result<(), serde_json::Error> {
        assert_eq!(
            serde_json::to_value(Term::Literal(Literal::new_language_tagged("chat", "fr")))?,
            json!({"type": "literal", "value": "chat", "xml:lang": "fr"})
        );
        assert_eq!(
            serde_json::to_value(Term::uri("http://x/1"))?,
            json!({"type": "uri", "value": "http://x/1"})
        );
        Ok(())
    }

    #[test]
    fn typed_literal_alias_is_accepted() -> Result<(), serde_json::Error> {
        let term: Term = serde_json::from_value(json!({
            "type": "typed-literal",
            "value": "1",
            "datatype": "http://www.w3.org/2001/XMLSchema#integer"
        }))?;
        assert_eq!(
            term,
            Term::Literal(Literal::new_typed(
                "1",
                "http://www.w3.org/2001/XMLSchema#integer"
            ))
        );
        Ok(())
    }

    #[test]
    fn language_wins_over_datatype() -> Result<(), serde_json::Error> {
        let term: Term = serde_json::from_value(json!({
            "type": "literal",
            "value": "x",
            "xml:lang": "en",
            "datatype": rdf::LANG_STRING
        }))?;
        let Term::Literal(literal) = term else {
            panic!("expected a literal");
        };
        assert_eq!(literal.language(), Some("en"));
        assert_eq!(literal.datatype(), None);
        Ok(())
    }

    #[test]
    fn xsd_string_is_a_simple_literal() {
        let literal = Literal::new_typed("a", xsd::STRING);
        assert_eq!(literal.kind(), &LiteralKind::Simple);
    }

    #[test]
    fn unknown_type_is_rejected() {
        let result = serde_json::from_value::<Term>(json!({"type": "triple", "value": "x"}));
        assert!(result.is_err());
    }

    #[test]
    fn oxrdf_conversion() {
        let literal = oxrdf::Literal::new_language_tagged_literal_unchecked("chat", "fr");
        let term = Term::from(&oxrdf::Term::from(literal.clone()));
        assert_eq!(term.to_oxrdf(), oxrdf::Term::from(literal));
    }

    #[test]
    fn display_uses_ntriples_syntax() {
        assert_eq!(Term::uri("http://x").to_string(), "<http://x>");
        assert_eq!(
            Term::Literal(Literal::new_simple("a \"b\"")).to_string(),
            "\"a \\\"b\\\"\""
        );
        assert_eq!(
            Term::Literal(Literal::new_language_tagged("a", "en")).to_string(),
            "\"a\"@en"
        );
    }
}
