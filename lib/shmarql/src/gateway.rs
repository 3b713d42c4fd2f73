use crate::config::DEFAULT_TIMEOUT;
use crate::{CacheScope, GatewayConfig, GatewayError};
use shmarql_cache::{hash_query, NewCacheEntry, QueryCache, SqliteQueryCache};
use shmarql_engine::{
    resolve, ConfigError, EndpointRegistry, EndpointTarget, LoadState, LocalStore, LocalStoreState,
    Prefixes, QueryExecutor, StoreOptions,
};
use shmarql_model::{QueryResult, QuerySuccess, RewriteResult};
use shmarql_rewrite::{FullTextSearch, HandlerRegistry, Rewriter, VectorSearch};
use shmarql_search::{FtsIndex, HttpSearchIndex};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// The query pipeline: rewrite, resolve, look up the cache, execute, record.
///
/// A gateway is cheap to clone and meant to be shared by all request handlers.
#[derive(Clone)]
pub struct Gateway {
    rewriter: Rewriter,
    executor: QueryExecutor,
    cache: Option<Arc<dyn QueryCache>>,
    cache_scope: CacheScope,
}

impl Gateway {
    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::default()
    }

    /// Opens every configured resource and assembles the gateway.
    ///
    /// The local store keeps loading in the background after this returns.
    pub async fn from_config(config: GatewayConfig) -> Result<Self, GatewayError> {
        let registry = EndpointRegistry::from_lists(&config.endpoint_names, &config.endpoints)?
            .with_default(config.endpoint.clone().unwrap_or_default());

        let prefixes = match &config.prefixes_file {
            Some(path) => Prefixes::builtin().with_json_file(path).unwrap_or_else(|error| {
                warn!(%error, "Using the built-in prefixes only");
                Prefixes::builtin()
            }),
            None => Prefixes::builtin(),
        };

        let mut handlers = HandlerRegistry::new();
        if let Some(path) = &config.fts_filepath {
            let index: Arc<dyn FullTextSearch> = Arc::new(FtsIndex::open(path)?);
            handlers = handlers.with_full_text(index);
        }
        if let Some(url) = &config.vector_search_url {
            let index: Arc<dyn VectorSearch> =
                Arc::new(HttpSearchIndex::new(url.as_str(), config.timeout)?);
            handlers = handlers.with_vector(index);
        }

        let mut builder = Gateway::builder()
            .registry(registry)
            .handlers(handlers)
            .prefixes(prefixes)
            .cache_scope(config.cache_scope)
            .timeout(config.timeout);
        if let Some(path) = &config.queries_db {
            builder = builder.cache(Arc::new(SqliteQueryCache::open(path)?));
        }
        if config.wants_local_store() {
            let store = LocalStore::open(StoreOptions {
                path: config.store_path.clone(),
                data_load_paths: config.data_load_paths.clone(),
                ..StoreOptions::default()
            })
            .await?;
            builder = builder.local_store(Arc::new(store));
        }
        Ok(builder.build()?)
    }

    pub fn registry(&self) -> &EndpointRegistry {
        self.executor.registry()
    }

    pub fn local_store(&self) -> Option<&Arc<LocalStore>> {
        self.executor.local_store()
    }

    pub fn cache_scope(&self) -> CacheScope {
        self.cache_scope
    }

    /// Runs `query` through the whole pipeline.
    ///
    /// Every failure ends up as the `error` of the returned result.
    pub async fn query(&self, query: &str) -> QueryResult {
        let rewritten = match self.rewriter.rewrite(query).await {
            Ok(rewritten) => rewritten,
            Err(error) => {
                warn!(%error, "Could not rewrite query");
                return QueryResult::error(error.to_string());
            }
        };

        let target = match resolve(
            rewritten.engine_directive(),
            self.registry(),
            self.local_state(),
        ) {
            Ok(target) => target,
            Err(error) => {
                warn!(%error, "Could not resolve an endpoint");
                return QueryResult::error(error.to_string());
            }
        };

        if target.is_local() {
            if let Some(store) = self.local_store() {
                if store.load_state() == LoadState::Loading {
                    debug!("Waiting for the local store to finish loading");
                    store.wait_until_loaded().await;
                }
            }
        }

        let query_hash = hash_query(&rewritten.rewritten_query);
        if !rewritten.no_cache() {
            if let Some(mut cached) = self.lookup(&query_hash, &target).await {
                cached.settings = rewritten.settings;
                return cached.into();
            }
        }

        match self
            .executor
            .execute(&rewritten.rewritten_query, &target, rewritten.query_type)
            .await
        {
            Ok(result) => {
                if !rewritten.no_cache() {
                    self.record(&query_hash, &rewritten, &target, &result).await;
                }
                let mut result = result;
                result.settings = rewritten.settings;
                result.into()
            }
            Err(error) => {
                debug!(%error, target = %target, "Query failed");
                error.into_query_result()
            }
        }
    }

    fn local_state(&self) -> LocalStoreState {
        self.local_store()
            .map_or(LocalStoreState::Unavailable, |store| store.routing_state())
    }

    async fn lookup(&self, query_hash: &str, target: &EndpointTarget) -> Option<QuerySuccess> {
        let cache = self.cache.as_ref()?;
        let endpoint = match self.cache_scope {
            CacheScope::AnyEndpoint => None,
            CacheScope::PerEndpoint => Some(target.as_str()),
        };
        match cache.lookup(query_hash, endpoint).await {
            Ok(Some(cached)) => {
                debug!(query_hash, endpoint = %cached.endpoint, "Cache hit");
                Some(cached.into_query_result())
            }
            Ok(None) => None,
            Err(error) => {
                warn!(%error, query_hash, "Cache lookup failed");
                None
            }
        }
    }

    /// Records a successful result. Failing to do so only costs a future cache hit.
    async fn record(
        &self,
        query_hash: &str,
        rewritten: &RewriteResult,
        target: &EndpointTarget,
        result: &QuerySuccess,
    ) {
        let Some(cache) = &self.cache else {
            return;
        };
        let entry = NewCacheEntry {
            query_hash,
            query: &rewritten.rewritten_query,
            endpoint: target.as_str(),
            result,
            duration: result.duration,
        };
        if let Err(error) = cache.store(entry).await {
            warn!(%error, query_hash, "Could not cache query result");
        }
    }
}

impl fmt::Debug for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway")
            .field("rewriter", &self.rewriter)
            .field("executor", &self.executor)
            .field("cached", &self.cache.is_some())
            .field("cache_scope", &self.cache_scope)
            .finish()
    }
}

/// Assembles a [`Gateway`] from already opened parts.
pub struct GatewayBuilder {
    registry: EndpointRegistry,
    handlers: HandlerRegistry,
    prefixes: Prefixes,
    cache: Option<Arc<dyn QueryCache>>,
    cache_scope: CacheScope,
    local: Option<Arc<LocalStore>>,
    timeout: Duration,
}

impl Default for GatewayBuilder {
    fn default() -> Self {
        Self {
            registry: EndpointRegistry::new(),
            handlers: HandlerRegistry::new(),
            prefixes: Prefixes::builtin(),
            cache: None,
            cache_scope: CacheScope::default(),
            local: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl GatewayBuilder {
    #[must_use]
    pub fn registry(mut self, registry: EndpointRegistry) -> Self {
        self.registry = registry;
        self
    }

    #[must_use]
    pub fn handlers(mut self, handlers: HandlerRegistry) -> Self {
        self.handlers = handlers;
        self
    }

    #[must_use]
    pub fn prefixes(mut self, prefixes: Prefixes) -> Self {
        self.prefixes = prefixes;
        self
    }

    #[must_use]
    pub fn cache(mut self, cache: Arc<dyn QueryCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    #[must_use]
    pub fn cache_scope(mut self, cache_scope: CacheScope) -> Self {
        self.cache_scope = cache_scope;
        self
    }

    #[must_use]
    pub fn local_store(mut self, store: Arc<LocalStore>) -> Self {
        self.local = Some(store);
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<Gateway, ConfigError> {
        info!(
            default = ?self.registry.default_endpoint(),
            named = self.registry.named().len(),
            local = self.local.is_some(),
            cached = self.cache.is_some(),
            "Starting gateway"
        );
        let executor = QueryExecutor::new(
            Arc::new(self.registry),
            self.prefixes,
            self.local,
            self.timeout,
        )?;
        Ok(Gateway {
            rewriter: Rewriter::new(self.handlers),
            executor,
            cache: self.cache,
            cache_scope: self.cache_scope,
        })
    }
}
