use shmarql::Gateway;

/// Holds the configuration for a SHMARQL web server.
#[derive(Debug)]
pub struct ServerConfig {
    /// The gateway that answers the queries.
    pub gateway: Gateway,
    /// The address the socket binds to, e.g. `localhost:5001`.
    pub bind: String,
    /// Whether the interactive query form is enabled.
    pub query_ui: bool,
}
