use crate::tabular::{triples, Table};
use crate::{ResultFormat, SerializationError};
use oxrdf::{Variable, VariableRef};
use oxrdfio::{RdfFormat, RdfSerializer};
use shmarql_model::{QueryResult, QuerySuccess, ResultPayload, Term};
use sparesults::{QueryResultsFormat, QueryResultsSerializer};

const ERROR_CONTENT_TYPE: &str = "application/json";

/// Serialized results ready to be sent with their `Content-Type`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SerializedResults {
    pub body: Vec<u8>,
    pub content_type: &'static str,
}

/// Serializes `result` in `format`.
///
/// Failures are always written as a JSON `{"error": ...}` document, whatever `format` asks for.
pub fn serialize(
    result: &QueryResult,
    format: ResultFormat,
) -> Result<SerializedResults, SerializationError> {
    let success = match result {
        QueryResult::Failure(failure) => {
            return Ok(SerializedResults {
                body: serde_json::to_vec(failure)?,
                content_type: ERROR_CONTENT_TYPE,
            })
        }
        QueryResult::Success(success) => success,
    };
    let body = match format {
        ResultFormat::Json => serialize_json(success)?,
        ResultFormat::Xml => serialize_xml(&success.payload)?,
        ResultFormat::Csv => serialize_csv(&success.payload)?,
        ResultFormat::Turtle => serialize_rdf(&success.payload, RdfFormat::Turtle)?,
        ResultFormat::NTriples => serialize_rdf(&success.payload, RdfFormat::NTriples)?,
    };
    Ok(SerializedResults {
        body,
        content_type: format.media_type(),
    })
}

/// The SPARQL JSON document together with the gateway's metadata.
///
/// Turtle graphs become bindings, other graph data is kept as `{"data": ...}`.
fn serialize_json(success: &QuerySuccess) -> Result<Vec<u8>, SerializationError> {
    if !matches!(success.payload, ResultPayload::Graph { .. }) {
        return Ok(serde_json::to_vec(success)?);
    }
    let Some(Table::Rows { vars, rows }) = Table::from_payload(&success.payload) else {
        return Ok(serde_json::to_vec(success)?);
    };
    let mut success = success.clone();
    success.payload = ResultPayload::solutions(vars, rows);
    Ok(serde_json::to_vec(&success)?)
}

fn serialize_xml(payload: &ResultPayload) -> Result<Vec<u8>, SerializationError> {
    let serializer = QueryResultsSerializer::from_format(QueryResultsFormat::Xml);
    let (vars, rows) = match Table::from_payload(payload) {
        Some(Table::Boolean(value)) => {
            return Ok(serializer.serialize_boolean_to_writer(Vec::new(), value)?);
        }
        Some(Table::Rows { vars, rows }) => (vars, rows),
        None => return Ok(Vec::new()),
    };

    let variables: Vec<Variable> = vars.iter().map(Variable::new_unchecked).collect();
    let mut writer = serializer.serialize_solutions_to_writer(Vec::new(), variables.clone())?;
    for row in &rows {
        let solution: Vec<(VariableRef<'_>, oxrdf::Term)> = variables
            .iter()
            .filter_map(|variable| {
                let term = row.get(variable.as_str())?;
                Some((variable.as_ref(), term.to_oxrdf()))
            })
            .collect();
        writer.serialize(
            solution
                .iter()
                .map(|(variable, term)| (*variable, term.as_ref())),
        )?;
    }
    Ok(writer.finish()?)
}

/// One header row with the variable names, then the plain values. Unbound values are empty.
fn serialize_csv(payload: &ResultPayload) -> Result<Vec<u8>, SerializationError> {
    let Some(table) = Table::from_payload(payload) else {
        return Ok(Vec::new());
    };
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());
    match table {
        Table::Boolean(value) => {
            writer.write_record(["boolean"])?;
            writer.write_record([value.to_string()])?;
        }
        Table::Rows { vars, rows } => {
            writer.write_record(&vars)?;
            for row in &rows {
                writer.write_record(vars.iter().map(|var| row.get(var).map_or("", Term::value)))?;
            }
        }
    }
    writer
        .into_inner()
        .map_err(|error| SerializationError::from(error.into_error()))
}

fn serialize_rdf(payload: &ResultPayload, format: RdfFormat) -> Result<Vec<u8>, SerializationError> {
    let mut serializer = RdfSerializer::from_format(format).for_writer(Vec::new());
    for triple in triples(payload) {
        serializer.serialize_triple(&triple)?;
    }
    Ok(serializer.finish()?)
}
