use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

#[derive(thiserror::Error, Debug)]
pub enum ShmarqlServerError {
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Content Negotiation Failed: {0}")]
    ContentNegotiation(String),
    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ShmarqlServerError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ShmarqlServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ShmarqlServerError::ContentNegotiation(msg) => (StatusCode::NOT_ACCEPTABLE, msg),
            ShmarqlServerError::Internal(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        (status, message).into_response()
    }
}
