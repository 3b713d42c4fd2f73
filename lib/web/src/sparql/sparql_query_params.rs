use crate::error::ShmarqlServerError;
use crate::AppState;
use axum::extract::{FromRequest, Query, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::Method;
use axum::Form;
use serde::Deserialize;

const SPARQL_QUERY_MEDIA_TYPE: &str = "application/sparql-query";

/// The query of a SPARQL protocol request.
///
/// It is read from the query string, from an `application/sparql-query` body or from the
/// `query` field of a form.
#[derive(Debug, Default)]
pub struct SparqlQueryParams {
    pub query: Option<String>,
}

#[derive(Deserialize)]
struct QueryField {
    query: Option<String>,
}

impl FromRequest<AppState> for SparqlQueryParams {
    type Rejection = ShmarqlServerError;

    async fn from_request(request: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let Query(QueryField { query }) = Query::<QueryField>::try_from_uri(request.uri())
            .map_err(|rejection| ShmarqlServerError::BadRequest(rejection.body_text()))?;
        if query.is_some() || request.method() != Method::POST {
            return Ok(Self { query });
        }

        let content_type = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .map(|value| value.trim().to_ascii_lowercase())
            .unwrap_or_default();

        if content_type == SPARQL_QUERY_MEDIA_TYPE {
            let query = String::from_request(request, state)
                .await
                .map_err(|rejection| ShmarqlServerError::BadRequest(rejection.body_text()))?;
            return Ok(Self { query: Some(query) });
        }

        let Form(QueryField { query }) = Form::<QueryField>::from_request(request, state)
            .await
            .map_err(|rejection| ShmarqlServerError::BadRequest(rejection.body_text()))?;
        Ok(Self { query })
    }
}
