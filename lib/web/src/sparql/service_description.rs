use crate::error::ShmarqlServerError;
use anyhow::Context;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use oxrdf::vocab::rdf;
use oxrdf::{BlankNode, NamedNodeRef, TripleRef};
use oxrdfio::{RdfFormat, RdfSerializer};
use shmarql::results::ResultFormat;

mod sd {
    use oxrdf::NamedNodeRef;

    pub const SERVICE: NamedNodeRef<'_> = NamedNodeRef::new_unchecked(
        "http://www.w3.org/ns/sparql-service-description#Service",
    );

    pub const DEFAULT_ENTAILMENT_REGIME: NamedNodeRef<'_> = NamedNodeRef::new_unchecked(
        "http://www.w3.org/ns/sparql-service-description#defaultEntailmentRegime",
    );
    pub const ENDPOINT: NamedNodeRef<'_> = NamedNodeRef::new_unchecked(
        "http://www.w3.org/ns/sparql-service-description#endpoint",
    );
    pub const FEATURE: NamedNodeRef<'_> = NamedNodeRef::new_unchecked(
        "http://www.w3.org/ns/sparql-service-description#feature",
    );
    pub const RESULT_FORMAT: NamedNodeRef<'_> = NamedNodeRef::new_unchecked(
        "http://www.w3.org/ns/sparql-service-description#resultFormat",
    );
    pub const SUPPORTED_LANGUAGE: NamedNodeRef<'_> = NamedNodeRef::new_unchecked(
        "http://www.w3.org/ns/sparql-service-description#supportedLanguage",
    );

    pub const SPARQL_11_QUERY: NamedNodeRef<'_> = NamedNodeRef::new_unchecked(
        "http://www.w3.org/ns/sparql-service-description#SPARQL11Query",
    );
    pub const UNION_DEFAULT_GRAPH: NamedNodeRef<'_> = NamedNodeRef::new_unchecked(
        "http://www.w3.org/ns/sparql-service-description#UnionDefaultGraph",
    );
}

/// A SPARQL service description in Turtle.
pub struct ServiceDescription {
    description: String,
}

impl IntoResponse for ServiceDescription {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            [(CONTENT_TYPE, RdfFormat::Turtle.media_type())],
            self.description,
        )
            .into_response()
    }
}

fn format_iri(format: ResultFormat) -> &'static str {
    match format {
        ResultFormat::Json => "http://www.w3.org/ns/formats/SPARQL_Results_JSON",
        ResultFormat::Xml => "http://www.w3.org/ns/formats/SPARQL_Results_XML",
        ResultFormat::Csv => "http://www.w3.org/ns/formats/SPARQL_Results_CSV",
        ResultFormat::Turtle => "http://www.w3.org/ns/formats/Turtle",
        ResultFormat::NTriples => "http://www.w3.org/ns/formats/N-Triples",
    }
}

/// Describes the query endpoint. The local store always queries the union of its graphs.
pub fn generate_service_description() -> Result<ServiceDescription, ShmarqlServerError> {
    let mut graph = Vec::new();
    let root = BlankNode::default();
    graph.push(TripleRef::new(&root, rdf::TYPE, sd::SERVICE));
    // The empty IRI resolves to the IRI the description is served from.
    graph.push(TripleRef::new(
        &root,
        sd::ENDPOINT,
        NamedNodeRef::new_unchecked(""),
    ));
    graph.push(TripleRef::new(&root, sd::SUPPORTED_LANGUAGE, sd::SPARQL_11_QUERY));
    for format in ResultFormat::ALL {
        graph.push(TripleRef::new(
            &root,
            sd::RESULT_FORMAT,
            NamedNodeRef::new_unchecked(format_iri(format)),
        ));
    }
    graph.push(TripleRef::new(&root, sd::FEATURE, sd::UNION_DEFAULT_GRAPH));
    graph.push(TripleRef::new(
        &root,
        sd::DEFAULT_ENTAILMENT_REGIME,
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/entailment/Simple"),
    ));

    let mut serializer = RdfSerializer::from_format(RdfFormat::Turtle)
        .with_prefix("sd", "http://www.w3.org/ns/sparql-service-description#")
        .context("Invalid service description prefix")?
        .for_writer(Vec::new());
    for t in graph {
        serializer
            .serialize_triple(t)
            .context("Could not write the service description")?;
    }

    let description = String::from_utf8(
        serializer
            .finish()
            .context("Could not finish the service description")?,
    )
    .context("Service description is not UTF-8")?;
    Ok(ServiceDescription { description })
}
