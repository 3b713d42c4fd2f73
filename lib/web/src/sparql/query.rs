use crate::error::ShmarqlServerError;
use crate::sparql::content_negotiation::ResponseFormat;
use crate::sparql::service_description::generate_service_description;
use crate::sparql::sparql_query_params::SparqlQueryParams;
use crate::AppState;
use anyhow::Context;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use shmarql::model::QueryResult;
use shmarql::results::{serialize, ResultFormat};
use tracing::debug;

const NO_QUERY_UI: &str = "There is currently no SPARQL query form to be found here, \
                           call it from a command line via a POST request.";

pub async fn handle_query(
    State(state): State<AppState>,
    format: ResponseFormat,
    query_params: SparqlQueryParams,
) -> Result<Response, ShmarqlServerError> {
    let Some(query) = query_params.query else {
        return Ok(generate_service_description()?.into_response());
    };

    if query.trim().is_empty() {
        return Err(ShmarqlServerError::BadRequest(
            "The query must not be empty".to_owned(),
        ));
    }

    let format = match format {
        ResponseFormat::Results(format) => format,
        ResponseFormat::Html if !state.query_ui => {
            return Ok((StatusCode::OK, NO_QUERY_UI).into_response());
        }
        ResponseFormat::Html => ResultFormat::Json,
    };

    let mut result = state.gateway.query(&query).await;
    if let QueryResult::Success(success) = &mut result {
        debug!(endpoint = %success.endpoint, cached = success.cached, "Answered query");
        if format == ResultFormat::Json {
            success.endpoint.clear();
        }
    }

    let serialized = serialize(&result, format).context("Could not serialize the result")?;
    Ok((
        StatusCode::OK,
        [(CONTENT_TYPE, serialized.content_type)],
        serialized.body,
    )
        .into_response())
}
