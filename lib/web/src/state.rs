use shmarql::Gateway;

#[derive(Clone, Debug)]
pub struct AppState {
    pub gateway: Gateway,
    /// Whether browsers may be served an interactive query form.
    pub query_ui: bool,
}
