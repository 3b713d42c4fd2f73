#![cfg(test)]

use axum::http::header::{ACCEPT, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum_test::TestServer;
use shmarql::engine::{LocalStore, RdfFormat};
use shmarql::Gateway;
use shmarql_web::{create_router, AppState};
use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;

const QUERY: &str = "SELECT ?s ?o WHERE { ?s <http://x/p> ?o } ORDER BY ?s";

fn server(query_ui: bool) -> Result<TestServer, Box<dyn Error>> {
    let store = LocalStore::in_memory()?;
    store.load(
        RdfFormat::Turtle,
        "<http://x/1> <http://x/p> \"hello\" .\n<http://x/2> <http://x/p> \"world\" .".as_bytes(),
    )?;
    let gateway = Gateway::builder().local_store(Arc::new(store)).build()?;
    let app = create_router(AppState { gateway, query_ui });
    Ok(TestServer::new(app)?)
}

#[tokio::test]
async fn get_returns_json_without_the_endpoint_url() -> Result<(), Box<dyn Error>> {
    let server = server(true)?;

    let response = server.get("/sparql").add_query_param("query", QUERY).await;

    response.assert_status_ok();
    assert_eq!(
        response.header(CONTENT_TYPE),
        "application/sparql-results+json"
    );
    assert_eq!(response.header(ACCESS_CONTROL_ALLOW_ORIGIN), "*");
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["head"]["vars"], serde_json::json!(["s", "o"]));
    assert_eq!(json["results"]["bindings"][1]["o"]["value"], "world");
    assert_eq!(json["endpoint_name"], "default");
    assert!(json.get("endpoint").is_none());
    Ok(())
}

#[tokio::test]
async fn post_form_and_raw_query_bodies() -> Result<(), Box<dyn Error>> {
    let server = server(true)?;
    let form = HashMap::from([("query", QUERY)]);

    let from_form = server.post("/sparql").form(&form).await;
    let from_body = server
        .post("/sparql")
        .bytes(QUERY.as_bytes().to_vec().into())
        .content_type("application/sparql-query")
        .await;

    from_form.assert_status_ok();
    from_body.assert_status_ok();
    assert_eq!(from_form.text(), from_body.text());
    Ok(())
}

#[tokio::test]
async fn accept_header_selects_csv() -> Result<(), Box<dyn Error>> {
    let server = server(true)?;

    let response = server
        .get("/shmarql")
        .add_query_param("query", QUERY)
        .add_header(ACCEPT, HeaderValue::from_static("text/csv"))
        .await;

    response.assert_status_ok();
    assert_eq!(response.header(CONTENT_TYPE), "text/csv");
    assert_eq!(
        response.text(),
        "s,o\r\nhttp://x/1,hello\r\nhttp://x/2,world\r\n"
    );
    Ok(())
}

#[tokio::test]
async fn format_parameter_wins_over_accept() -> Result<(), Box<dyn Error>> {
    let server = server(true)?;

    let response = server
        .get("/sparql")
        .add_query_param("query", QUERY)
        .add_query_param("format", "xml")
        .add_header(ACCEPT, HeaderValue::from_static("text/csv"))
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.header(CONTENT_TYPE),
        "application/sparql-results+xml"
    );
    assert!(response.text().contains("<literal>hello</literal>"));
    Ok(())
}

#[tokio::test]
async fn unknown_format_parameter_is_rejected() -> Result<(), Box<dyn Error>> {
    let server = server(true)?;

    let response = server
        .get("/sparql")
        .add_query_param("query", QUERY)
        .add_query_param("format", "yaml")
        .expect_failure()
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn missing_query_returns_the_service_description() -> Result<(), Box<dyn Error>> {
    let server = server(true)?;

    let response = server.get("/sparql").await;

    response.assert_status_ok();
    assert_eq!(response.header(CONTENT_TYPE), "text/turtle");
    assert!(response.text().contains("sd:Service"));
    Ok(())
}

#[tokio::test]
async fn empty_query_is_a_bad_request() -> Result<(), Box<dyn Error>> {
    let server = server(true)?;

    let response = server
        .get("/sparql")
        .add_query_param("query", "  ")
        .expect_failure()
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.header(ACCESS_CONTROL_ALLOW_ORIGIN), "*");
    Ok(())
}

#[tokio::test]
async fn browsers_get_a_notice_without_query_ui() -> Result<(), Box<dyn Error>> {
    let server = server(false)?;

    let response = server
        .get("/sparql")
        .add_query_param("query", QUERY)
        .add_header(ACCEPT, HeaderValue::from_static("text/html"))
        .await;

    response.assert_status_ok();
    assert!(response
        .text()
        .starts_with("There is currently no SPARQL query form to be found here"));
    Ok(())
}

#[tokio::test]
async fn query_errors_are_json_payloads() -> Result<(), Box<dyn Error>> {
    let server = server(true)?;

    let response = server
        .get("/sparql")
        .add_query_param("query", "SELECT WHERE {")
        .add_header(ACCEPT, HeaderValue::from_static("text/csv"))
        .await;

    response.assert_status_ok();
    assert_eq!(response.header(CONTENT_TYPE), "application/json");
    let json = response.json::<serde_json::Value>();
    assert!(json["error"].is_string());
    Ok(())
}
