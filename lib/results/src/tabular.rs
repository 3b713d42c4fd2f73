use oxrdf::{BlankNode, NamedNode, Subject, Triple};
use oxrdfio::{RdfFormat, RdfParser};
use shmarql_model::vocab::BOGUS_PREDICATE;
use shmarql_model::{ResultPayload, Row, Term};
use tracing::{debug, warn};

const SUBJECT: &str = "s";
const PREDICATE: &str = "p";
const OBJECT: &str = "o";

/// A payload as variables and rows.
pub(crate) enum Table {
    Rows { vars: Vec<String>, rows: Vec<Row> },
    Boolean(bool),
}

impl Table {
    /// Returns `None` for graph data that is not Turtle.
    pub(crate) fn from_payload(payload: &ResultPayload) -> Option<Self> {
        Some(match payload {
            ResultPayload::Solutions { head, results } => Table::Rows {
                vars: head.vars.clone(),
                rows: results.bindings.clone(),
            },
            ResultPayload::Boolean { boolean, .. } => Table::Boolean(*boolean),
            ResultPayload::Graph { data } => Table::Rows {
                vars: [SUBJECT, PREDICATE, OBJECT].map(str::to_owned).to_vec(),
                rows: parse_graph(data)?.into_iter().map(triple_row).collect(),
            },
        })
    }
}

/// Parses graph data as Turtle.
///
/// Endpoints answering with a format other than the one asked for end up here as well, so a
/// failure is logged and yields `None`.
fn parse_graph(data: &str) -> Option<Vec<Triple>> {
    let parsed: Result<Vec<Triple>, _> = RdfParser::from_format(RdfFormat::Turtle)
        .for_reader(data.as_bytes())
        .map(|quad| quad.map(Triple::from))
        .collect();
    match parsed {
        Ok(triples) => Some(triples),
        Err(error) => {
            warn!(%error, "Result data is not Turtle, passing it on unparsed");
            None
        }
    }
}

fn triple_row(triple: Triple) -> Row {
    let subject = oxrdf::Term::from(triple.subject);
    let predicate = oxrdf::Term::from(triple.predicate);
    Row::from([
        (SUBJECT.to_owned(), Term::from(&subject)),
        (PREDICATE.to_owned(), Term::from(&predicate)),
        (OBJECT.to_owned(), Term::from(&triple.object)),
    ])
}

/// The triples held by a payload.
///
/// Graph data is re-parsed, unparsable data holds no triples. Bindings contribute a triple for
/// every row that binds `s`, `p` and `o`. Other payloads hold no triples.
pub(crate) fn triples(payload: &ResultPayload) -> Vec<Triple> {
    match payload {
        ResultPayload::Graph { data } => parse_graph(data).unwrap_or_default(),
        ResultPayload::Solutions { results, .. } => results
            .bindings
            .iter()
            .filter_map(|row| {
                row_triple(row.get(SUBJECT)?, row.get(PREDICATE)?, row.get(OBJECT)?)
            })
            .collect(),
        ResultPayload::Boolean { .. } => Vec::new(),
    }
}

fn row_triple(subject: &Term, predicate: &Term, object: &Term) -> Option<Triple> {
    let subject: Subject = match subject {
        Term::Uri(iri) => NamedNode::new_unchecked(iri.as_str()).into(),
        Term::BlankNode(id) => BlankNode::new_unchecked(id.as_str()).into(),
        Term::Literal(_) => return None,
    };
    let predicate = match predicate {
        Term::Uri(iri) => NamedNode::new_unchecked(iri.as_str()),
        other => {
            debug!(predicate = %other, "Replacing a non-IRI predicate");
            NamedNode::new_unchecked(BOGUS_PREDICATE)
        }
    };
    Some(Triple::new(subject, predicate, object.to_oxrdf()))
}
