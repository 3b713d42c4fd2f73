#![cfg(test)]

use assert_fs::prelude::*;
use assert_fs::TempDir;
use axum::http::{header, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use shmarql::cache::{hash_query, SqliteQueryCache};
use shmarql::engine::{EndpointRegistry, LoadState, LocalStore, RdfFormat, StoreOptions};
use shmarql::model::{Literal, QueryResult, ResultPayload, Term};
use shmarql::rewrite::{from_fn, HandlerRegistry, SearchError, Substitution};
use shmarql::{CacheScope, Gateway, GatewayConfig};
use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

const QUERY: &str = "SELECT * WHERE {?s ?p ?o} LIMIT 10";
const SOLUTIONS: &str = r#"{"head":{"vars":["s"]},"results":{"bindings":[{"s":{"type":"uri","value":"http://x/1"}}]}}"#;

/// A fake SPARQL endpoint that counts the queries it receives.
struct Endpoint {
    url: String,
    hits: Arc<AtomicUsize>,
}

impl Endpoint {
    async fn spawn(status: StatusCode, body: &'static str) -> Result<Self, Box<dyn Error>> {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let app = Router::new().route(
            "/sparql",
            post(move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                (
                    status,
                    [(header::CONTENT_TYPE, "application/sparql-results+json")],
                    body,
                )
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?;
        tokio::spawn(async move { axum::serve(listener, app).await });
        Ok(Self {
            url: format!("http://{address}/sparql"),
            hits,
        })
    }

    async fn ok() -> Result<Self, Box<dyn Error>> {
        Self::spawn(StatusCode::OK, SOLUTIONS).await
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

fn local_store() -> Result<Arc<LocalStore>, Box<dyn Error>> {
    let store = LocalStore::in_memory()?;
    store.load(
        RdfFormat::Turtle,
        "<http://x/1> <http://x/p> \"hello\" .\n<http://x/2> <http://x/p> \"world\" .".as_bytes(),
    )?;
    Ok(Arc::new(store))
}

fn gateway_for(
    endpoint: &Endpoint,
    cache: &Arc<SqliteQueryCache>,
    scope: CacheScope,
) -> Result<Gateway, Box<dyn Error>> {
    Ok(Gateway::builder()
        .registry(EndpointRegistry::new().with_default(endpoint.url.clone()))
        .cache(cache.clone())
        .cache_scope(scope)
        .build()?)
}

#[tokio::test]
async fn local_store_answers_when_nothing_else_is_configured() -> Result<(), Box<dyn Error>> {
    let gateway = Gateway::builder().local_store(local_store()?).build()?;

    let result = gateway
        .query("SELECT * WHERE {?s ?p ?o . FILTER(?o = \"hello\")} LIMIT 10")
        .await;

    let success = result.as_success().ok_or("expected a success")?;
    let ResultPayload::Solutions { results, .. } = &success.payload else {
        return Err("expected solutions".into());
    };
    assert_eq!(results.bindings.len(), 1);
    let row = &results.bindings[0];
    assert_eq!(row["s"], Term::uri("http://x/1"));
    assert_eq!(row["p"], Term::uri("http://x/p"));
    assert_eq!(row["o"], Term::Literal(Literal::new_simple("hello")));
    assert_eq!(success.endpoint, "__local__");
    Ok(())
}

#[tokio::test]
async fn endpoint_scoped_cache_keeps_one_row_per_endpoint() -> Result<(), Box<dyn Error>> {
    let a = Endpoint::ok().await?;
    let b = Endpoint::ok().await?;
    let cache = Arc::new(SqliteQueryCache::in_memory()?);
    let via_a = gateway_for(&a, &cache, CacheScope::PerEndpoint)?;
    let via_b = gateway_for(&b, &cache, CacheScope::PerEndpoint)?;

    let first = via_a.query(QUERY).await;
    let other = via_b.query(QUERY).await;
    let repeated = via_a.query(QUERY).await;

    let first = first.as_success().ok_or("first query failed")?;
    let other = other.as_success().ok_or("second query failed")?;
    let repeated = repeated.as_success().ok_or("repeated query failed")?;
    assert!(!first.cached);
    assert!(!other.cached);
    assert!(repeated.cached);
    assert_eq!(repeated.duration, first.duration);
    assert_eq!(repeated.endpoint, a.url);
    assert_eq!((a.hits(), b.hits()), (1, 1));
    assert_eq!(cache.entries(&hash_query(QUERY)).await?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn endpoint_agnostic_cache_serves_any_endpoint() -> Result<(), Box<dyn Error>> {
    let a = Endpoint::ok().await?;
    let b = Endpoint::ok().await?;
    let cache = Arc::new(SqliteQueryCache::in_memory()?);

    let first = gateway_for(&a, &cache, CacheScope::AnyEndpoint)?
        .query(QUERY)
        .await;
    let second = gateway_for(&b, &cache, CacheScope::AnyEndpoint)?
        .query(QUERY)
        .await;

    assert!(!first.is_error());
    let second = second.as_success().ok_or("second query failed")?;
    assert!(second.cached);
    assert!(second.timestamp.is_some());
    assert_eq!(b.hits(), 0);
    Ok(())
}

#[tokio::test]
async fn nocache_comment_bypasses_lookup_and_store() -> Result<(), Box<dyn Error>> {
    let endpoint = Endpoint::ok().await?;
    let cache = Arc::new(SqliteQueryCache::in_memory()?);
    let gateway = gateway_for(&endpoint, &cache, CacheScope::AnyEndpoint)?;
    let query = format!("# shmarql-nocache\n{QUERY}");

    gateway.query(&query).await;
    let second = gateway.query(&query).await;

    let second = second.as_success().ok_or("query failed")?;
    assert!(!second.cached);
    assert!(second.settings.contains("nocache"));
    assert_eq!(endpoint.hits(), 2);
    assert!(cache.entries(&hash_query(&query)).await?.is_empty());
    assert!(cache.entries(&hash_query(QUERY)).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn queries_wait_for_a_loading_store() -> Result<(), Box<dyn Error>> {
    let app = Router::new().route(
        "/data.ttl",
        get(|| async {
            tokio::time::sleep(Duration::from_millis(800)).await;
            "<http://x/1> <http://x/p> \"hello\" ."
        }),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let address = listener.local_addr()?;
    tokio::spawn(async move { axum::serve(listener, app).await });

    let store = LocalStore::open(StoreOptions {
        data_load_paths: vec![format!("http://{address}/data.ttl")],
        ..StoreOptions::default()
    })
    .await?;
    assert_eq!(store.load_state(), LoadState::Loading);
    let cache = Arc::new(SqliteQueryCache::in_memory()?);
    let gateway = Gateway::builder()
        .local_store(Arc::new(store))
        .cache(cache.clone())
        .build()?;

    let first = gateway.query(QUERY).await;
    let second = gateway.query(QUERY).await;

    for result in [&first, &second] {
        let success = result.as_success().ok_or("query failed")?;
        let ResultPayload::Solutions { results, .. } = &success.payload else {
            return Err("expected solutions".into());
        };
        assert_eq!(results.bindings.len(), 1);
    }
    assert!(!first.as_success().ok_or("query failed")?.cached);
    assert!(second.as_success().ok_or("query failed")?.cached);
    Ok(())
}

#[tokio::test]
async fn failures_are_not_cached() -> Result<(), Box<dyn Error>> {
    let endpoint = Endpoint::spawn(StatusCode::INTERNAL_SERVER_ERROR, "parse error at line 3").await?;
    let cache = Arc::new(SqliteQueryCache::in_memory()?);
    let gateway = gateway_for(&endpoint, &cache, CacheScope::AnyEndpoint)?;

    let first = gateway.query(QUERY).await;
    let second = gateway.query(QUERY).await;

    assert_eq!(first, QueryResult::error("parse error at line 3"));
    assert_eq!(second, QueryResult::error("parse error at line 3"));
    assert_eq!(endpoint.hits(), 2);
    assert!(cache.entries(&hash_query(QUERY)).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn directive_selects_the_named_endpoint() -> Result<(), Box<dyn Error>> {
    let named = Endpoint::ok().await?;
    let default = Endpoint::ok().await?;
    let gateway = Gateway::builder()
        .registry(
            EndpointRegistry::new()
                .with_default(default.url.clone())
                .with_endpoint("wikidata", named.url.clone()),
        )
        .build()?;

    let result = gateway
        .query(&format!("# shmarql-engine: wikidata\n{QUERY}"))
        .await;

    let success = result.as_success().ok_or("query failed")?;
    assert_eq!(success.endpoint_name, "wikidata");
    assert_eq!(success.settings.last("engine"), Some("wikidata"));
    assert_eq!((named.hits(), default.hits()), (1, 0));
    Ok(())
}

#[tokio::test]
async fn no_endpoint_is_reported() {
    let gateway = Gateway::builder().build().unwrap();

    let result = gateway.query(QUERY).await;

    assert_eq!(result, QueryResult::error("No endpoint found"));
}

#[tokio::test]
async fn search_results_restrict_the_local_query() -> Result<(), Box<dyn Error>> {
    let handlers = HandlerRegistry::new().with(
        "https://shmarql.com/fts",
        from_fn(|_| async { Ok(Substitution::Uris(vec!["http://x/2".to_owned()])) }),
    );
    let gateway = Gateway::builder()
        .handlers(handlers)
        .local_store(local_store()?)
        .build()?;

    let result = gateway
        .query("SELECT ?o WHERE { ?s <https://shmarql.com/fts> \"world\" . ?s ?p ?o }")
        .await;

    let success = result.as_success().ok_or("query failed")?;
    let ResultPayload::Solutions { results, .. } = &success.payload else {
        return Err("expected solutions".into());
    };
    assert_eq!(results.bindings.len(), 1);
    assert_eq!(
        results.bindings[0]["o"],
        Term::Literal(Literal::new_simple("world"))
    );
    Ok(())
}

#[tokio::test]
async fn failing_search_is_an_error_result() -> Result<(), Box<dyn Error>> {
    let handlers = HandlerRegistry::new().with(
        "https://shmarql.com/fts",
        from_fn(|_| async { Err(SearchError::backend("index is offline")) }),
    );
    let gateway = Gateway::builder()
        .handlers(handlers)
        .local_store(local_store()?)
        .build()?;

    let result = gateway
        .query("SELECT ?s WHERE { ?s <https://shmarql.com/fts> \"world\" }")
        .await;

    assert_eq!(
        result,
        QueryResult::error("Search rewriting error: index is offline")
    );
    Ok(())
}

#[tokio::test]
async fn gateway_from_config_loads_data_and_caches() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    dir.child("data.ttl")
        .write_str("<http://x/1> <http://x/p> \"hello\" .")?;
    let config = GatewayConfig {
        data_load_paths: vec![dir.child("data.ttl").path().to_string_lossy().into_owned()],
        queries_db: Some(dir.child("queries.db").path().to_owned()),
        ..GatewayConfig::default()
    };

    let gateway = Gateway::from_config(config).await?;
    gateway
        .local_store()
        .ok_or("no local store")?
        .wait_until_loaded()
        .await;
    let first = gateway.query(QUERY).await;
    let second = gateway.query(QUERY).await;

    assert!(!first.is_error(), "{first:?}");
    assert!(second.as_success().ok_or("second query failed")?.cached);
    dir.child("queries.db").assert(predicates::path::exists());
    Ok(())
}

#[tokio::test]
async fn mismatched_endpoint_lists_are_a_configuration_error() {
    let config = GatewayConfig {
        endpoints: vec!["http://a/sparql".to_owned(), "http://b/sparql".to_owned()],
        endpoint_names: vec!["a".to_owned()],
        queries_db: None,
        ..GatewayConfig::default()
    };

    assert!(Gateway::from_config(config).await.is_err());
}
