#![cfg(test)]

use shmarql_model::vocab::BOGUS_PREDICATE;
use shmarql_model::{Literal, QueryResult, QuerySuccess, ResultPayload, Row, Term};
use shmarql_results::{serialize, ResultFormat};
use std::error::Error;

fn row(entries: &[(&str, Term)]) -> Row {
    entries
        .iter()
        .map(|(var, term)| ((*var).to_owned(), term.clone()))
        .collect()
}

fn success(payload: ResultPayload) -> QueryResult {
    QueryResult::Success(QuerySuccess::new(payload))
}

fn two_by_two() -> QueryResult {
    success(ResultPayload::solutions(
        vec!["name".to_owned(), "age".to_owned()],
        vec![
            row(&[
                ("name", Term::Literal(Literal::new_simple("Ann"))),
                (
                    "age",
                    Term::Literal(Literal::new_typed(
                        "42",
                        "http://www.w3.org/2001/XMLSchema#integer",
                    )),
                ),
            ]),
            row(&[("name", Term::Literal(Literal::new_simple("Bob, Jr.")))]),
        ],
    ))
}

fn spo_bindings(predicate: Term) -> QueryResult {
    let vars = ["s", "p", "o"].map(str::to_owned).to_vec();
    success(ResultPayload::solutions(
        vars,
        vec![row(&[
            ("s", Term::uri("http://x/1")),
            ("p", predicate),
            ("o", Term::Literal(Literal::new_language_tagged("hello", "en"))),
        ])],
    ))
}

#[test]
fn csv_has_a_header_and_one_line_per_row() -> Result<(), Box<dyn Error>> {
    let serialized = serialize(&two_by_two(), ResultFormat::Csv)?;

    let text = String::from_utf8(serialized.body)?;
    assert_eq!(serialized.content_type, "text/csv");
    assert_eq!(text.lines().count(), 3);
    assert_eq!(text, "name,age\r\nAnn,42\r\n\"Bob, Jr.\",\r\n");
    Ok(())
}

#[test]
fn json_keeps_terms_and_metadata() -> Result<(), Box<dyn Error>> {
    let serialized = serialize(&two_by_two(), ResultFormat::Json)?;

    let json: serde_json::Value = serde_json::from_slice(&serialized.body)?;
    assert_eq!(json["head"]["vars"], serde_json::json!(["name", "age"]));
    assert_eq!(
        json["results"]["bindings"][0]["age"],
        serde_json::json!({
            "type": "literal",
            "value": "42",
            "datatype": "http://www.w3.org/2001/XMLSchema#integer"
        })
    );
    assert_eq!(json["cached"], false);
    Ok(())
}

#[test]
fn graph_is_written_as_bindings_in_json() -> Result<(), Box<dyn Error>> {
    let result = success(ResultPayload::graph(
        "<http://x/1> <http://x/p> \"hello\" .\n",
    ));

    let serialized = serialize(&result, ResultFormat::Json)?;

    let json: serde_json::Value = serde_json::from_slice(&serialized.body)?;
    assert_eq!(json["head"]["vars"], serde_json::json!(["s", "p", "o"]));
    assert_eq!(json["results"]["bindings"][0]["s"]["value"], "http://x/1");
    assert!(json.get("data").is_none());
    Ok(())
}

#[test]
fn xml_results_document() -> Result<(), Box<dyn Error>> {
    let serialized = serialize(&spo_bindings(Term::uri("http://x/p")), ResultFormat::Xml)?;

    let xml = String::from_utf8(serialized.body)?;
    assert_eq!(serialized.content_type, "application/sparql-results+xml");
    assert!(xml.contains("<variable name=\"s\"/>"));
    assert!(xml.contains("<uri>http://x/1</uri>"));
    assert!(xml.contains("xml:lang=\"en\""));
    Ok(())
}

#[test]
fn ask_result_in_xml_and_csv() -> Result<(), Box<dyn Error>> {
    let result = success(ResultPayload::boolean(true));

    let xml = String::from_utf8(serialize(&result, ResultFormat::Xml)?.body)?;
    let csv = String::from_utf8(serialize(&result, ResultFormat::Csv)?.body)?;

    assert!(xml.contains("<boolean>true</boolean>"));
    assert_eq!(csv, "boolean\r\ntrue\r\n");
    Ok(())
}

#[test]
fn spo_bindings_become_triples() -> Result<(), Box<dyn Error>> {
    let serialized = serialize(&spo_bindings(Term::uri("http://x/p")), ResultFormat::NTriples)?;

    assert_eq!(
        String::from_utf8(serialized.body)?,
        "<http://x/1> <http://x/p> \"hello\"@en .\n"
    );
    Ok(())
}

#[test]
fn literal_predicate_is_replaced_by_a_placeholder() -> Result<(), Box<dyn Error>> {
    let result = spo_bindings(Term::Literal(Literal::new_simple("not an iri")));

    let serialized = serialize(&result, ResultFormat::Turtle)?;

    let turtle = String::from_utf8(serialized.body)?;
    assert!(turtle.contains(BOGUS_PREDICATE));
    assert!(!turtle.contains("not an iri"));
    Ok(())
}

#[test]
fn bindings_without_triples_give_an_empty_graph() -> Result<(), Box<dyn Error>> {
    let serialized = serialize(&two_by_two(), ResultFormat::Turtle)?;

    assert!(serialized.body.is_empty());
    assert_eq!(serialized.content_type, "text/turtle");
    Ok(())
}

#[test]
fn failures_are_json_in_every_format() -> Result<(), Box<dyn Error>> {
    let result = QueryResult::error("could not connect");

    for format in ResultFormat::ALL {
        let serialized = serialize(&result, format)?;
        assert_eq!(serialized.content_type, "application/json");
        assert_eq!(serialized.body, br#"{"error":"could not connect"}"#);
    }
    Ok(())
}

#[test]
fn non_turtle_data_is_passed_on() -> Result<(), Box<dyn Error>> {
    let data = "<?xml version=\"1.0\"?>\n<sparql xmlns=\"http://www.w3.org/2005/sparql-results#\"><head><variable name=\"s\"/></head></sparql>";
    let result = success(ResultPayload::graph(data));

    let json = serialize(&result, ResultFormat::Json)?;
    let value: serde_json::Value = serde_json::from_slice(&json.body)?;
    assert_eq!(value["data"], data);
    assert_eq!(json.content_type, "application/sparql-results+json");
    for format in [
        ResultFormat::Xml,
        ResultFormat::Csv,
        ResultFormat::Turtle,
        ResultFormat::NTriples,
    ] {
        let serialized = serialize(&result, format)?;
        assert!(serialized.body.is_empty(), "{format} is not empty");
        assert_eq!(serialized.content_type, format.media_type());
    }
    Ok(())
}
