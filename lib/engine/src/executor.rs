use crate::{
    ConfigError, EndpointRegistry, EndpointTarget, ExecutionError, LocalStore, Prefixes,
    DEFAULT_ENDPOINT_NAME,
};
use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, StatusCode};
use shmarql_model::{QuerySuccess, QueryType, ResultPayload};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// The `User-Agent` sent to remote endpoints.
pub const SHMARQL_USER_AGENT: &str = "SHMARQL/2024 (https://shmarql.com/ ep@epoz.org)";

const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";
const TURTLE: &str = "text/turtle";

/// Runs rewritten queries against remote SPARQL endpoints or the local store.
#[derive(Clone, Debug)]
pub struct QueryExecutor {
    client: Client,
    registry: Arc<EndpointRegistry>,
    prefixes: Prefixes,
    local: Option<Arc<LocalStore>>,
}

impl QueryExecutor {
    pub fn new(
        registry: Arc<EndpointRegistry>,
        prefixes: Prefixes,
        local: Option<Arc<LocalStore>>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            registry,
            prefixes,
            local,
        })
    }

    pub fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }

    pub fn local_store(&self) -> Option<&Arc<LocalStore>> {
        self.local.as_ref()
    }

    /// Executes `query` on `target`.
    ///
    /// The configured prefixes are prepended first. The returned result carries the wall-clock
    /// duration and the endpoint it was answered by.
    pub async fn execute(
        &self,
        query: &str,
        target: &EndpointTarget,
        query_type: QueryType,
    ) -> Result<QuerySuccess, ExecutionError> {
        let query = self.prefixes.apply(query);
        let start = Instant::now();
        let payload = match target {
            EndpointTarget::Remote(url) => self.execute_remote(&query, url, query_type).await?,
            EndpointTarget::Local => self.execute_local(query).await?,
        };
        let duration = start.elapsed().as_secs_f64();
        debug!(target = %target, duration, "Executed query");

        let mut result = QuerySuccess::new(payload);
        result.duration = duration;
        result.endpoint = target.as_str().to_owned();
        result.endpoint_name = match target {
            EndpointTarget::Remote(url) => self.registry.name_of(url).to_owned(),
            EndpointTarget::Local => DEFAULT_ENDPOINT_NAME.to_owned(),
        };
        Ok(result)
    }

    async fn execute_remote(
        &self,
        query: &str,
        url: &str,
        query_type: QueryType,
    ) -> Result<ResultPayload, ExecutionError> {
        let accept = if query_type.produces_graph() {
            TURTLE
        } else {
            SPARQL_RESULTS_JSON
        };
        let response = self
            .client
            .post(url)
            .header(ACCEPT, accept)
            .header(USER_AGENT, SHMARQL_USER_AGENT)
            .form(&[("query", query)])
            .send()
            .await
            .map_err(|error| {
                warn!(%error, url, "Could not reach endpoint");
                ExecutionError::Connection
            })?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("json"));
        let body = response.text().await.map_err(|error| {
            warn!(%error, url, "Could not read the endpoint response");
            ExecutionError::Connection
        })?;

        match status {
            StatusCode::OK if query_type.produces_graph() || !is_json => {
                Ok(ResultPayload::graph(body))
            }
            StatusCode::OK => match serde_json::from_str::<ResultPayload>(&body) {
                Ok(payload) => Ok(payload),
                Err(error) => {
                    debug!(%error, url, "Keeping a JSON answer that is not SPARQL results as data");
                    Ok(ResultPayload::graph(body))
                }
            },
            StatusCode::INTERNAL_SERVER_ERROR => Err(ExecutionError::RemoteQuery(body)),
            status => {
                debug!(status = status.as_u16(), url, "Endpoint answered with an error");
                Err(ExecutionError::RemoteStatus {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }

    async fn execute_local(&self, query: String) -> Result<ResultPayload, ExecutionError> {
        let Some(local) = self.local.clone() else {
            return Err(ExecutionError::Local("No local store is configured".to_owned()));
        };
        tokio::task::spawn_blocking(move || local.query(&query))
            .await
            .map_err(|error| ExecutionError::Local(error.to_string()))?
    }
}
