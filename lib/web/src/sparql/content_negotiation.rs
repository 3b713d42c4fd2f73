use crate::error::ShmarqlServerError;
use crate::AppState;
use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use headers::HeaderMapExt;
use headers_accept::Accept;
use mediatype::names::{APPLICATION, CSV, HTML, JSON, N_TRIPLES, TEXT, TURTLE, XML};
use mediatype::{MediaType, Name};
use serde::Deserialize;
use shmarql::results::ResultFormat;

/// What the client asked to receive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseFormat {
    Results(ResultFormat),
    /// A browser asking for a page.
    Html,
}

#[derive(Deserialize)]
struct FormatParam {
    format: Option<String>,
}

/// Uses the `format` parameter if given, the `Accept` header otherwise.
impl FromRequestParts<AppState> for ResponseFormat {
    type Rejection = ShmarqlServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        static MEDIA_TYPES: [MediaType<'_>; 9] = [
            MediaType::from_parts(APPLICATION, Name::new_unchecked("sparql-results"), Some(JSON), &[]),
            MediaType::new(APPLICATION, JSON),
            MediaType::from_parts(APPLICATION, Name::new_unchecked("sparql-results"), Some(XML), &[]),
            MediaType::new(APPLICATION, XML),
            MediaType::new(TEXT, CSV),
            MediaType::new(TEXT, TURTLE),
            MediaType::new(APPLICATION, N_TRIPLES),
            MediaType::new(TEXT, XML),
            MediaType::new(TEXT, HTML),
        ];
        static DEFAULT_MEDIA_TYPE: MediaType<'_> =
            MediaType::from_parts(APPLICATION, Name::new_unchecked("sparql-results"), Some(JSON), &[]);

        if let Ok(Query(FormatParam {
            format: Some(format),
        })) = Query::<FormatParam>::try_from_uri(&parts.uri)
        {
            return format
                .parse()
                .map(ResponseFormat::Results)
                .map_err(|error| ShmarqlServerError::BadRequest(error.to_string()));
        }

        let accept = parts.headers.typed_get::<Accept>();
        let media_type = content_negotiation(
            accept,
            &MEDIA_TYPES,
            &DEFAULT_MEDIA_TYPE,
            "application/sparql-results+json or text/csv",
        )?;

        if media_type.ty == TEXT && media_type.subty == HTML {
            return Ok(ResponseFormat::Html);
        }
        ResultFormat::from_media_type(media_type.to_string().as_str())
            .map(ResponseFormat::Results)
            .ok_or(ShmarqlServerError::BadRequest(format!(
                "Could not convert negotiated media type '{media_type}' to a result format."
            )))
    }
}

fn content_negotiation<'media>(
    accept: Option<Accept>,
    available: &'media [MediaType<'media>],
    default: &'media MediaType<'media>,
    example: &str,
) -> Result<MediaType<'media>, ShmarqlServerError> {
    let Some(accept) = accept else {
        return Ok(default.clone());
    };

    match accept.negotiate(available) {
        None => Err(ShmarqlServerError::ContentNegotiation(format!(
            "The accept header does not provide any accepted format like {example}."
        ))),
        Some(result) => Ok(result.clone()),
    }
}
