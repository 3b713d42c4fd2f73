use axum::http::header::ACCESS_CONTROL_ALLOW_ORIGIN;
use axum::http::HeaderValue;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::info;

mod config;
mod error;
mod sparql;
mod state;

pub use config::ServerConfig;
pub use error::ShmarqlServerError;
pub use state::AppState;

use crate::sparql::create_sparql_routes;

/// Builds the router with the SPARQL routes. Every response allows any origin.
pub fn create_router(app_state: AppState) -> Router {
    create_sparql_routes()
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(SetResponseHeaderLayer::if_not_present(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
}

pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let app = create_router(AppState {
        gateway: config.gateway,
        query_ui: config.query_ui,
    });

    let listener = TcpListener::bind(&config.bind).await?;
    info!(address = %listener.local_addr()?, "Listening");
    Ok(axum::serve(listener, app).await?)
}
