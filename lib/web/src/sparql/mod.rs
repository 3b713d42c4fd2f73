use crate::sparql::query::handle_query;
use crate::AppState;
use axum::routing::get;
use axum::Router;

mod content_negotiation;
mod query;
mod service_description;
mod sparql_query_params;

pub fn create_sparql_routes() -> Router<AppState> {
    Router::new()
        .route("/sparql", get(handle_query).post(handle_query))
        .route("/shmarql", get(handle_query))
}
