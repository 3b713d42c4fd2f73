use crate::IndexError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use shmarql_rewrite::{FullTextSearch, SearchError, VectorSearch};
use std::time::Duration;
use tracing::debug;

/// A search service reached over HTTP.
///
/// The service is called as `GET <base>?q=<operand>` and answers with a JSON array of IRIs, or of
/// `[iri, count]` pairs for statistics.
#[derive(Clone, Debug)]
pub struct HttpSearchIndex {
    client: Client,
    url: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Hit {
    Uri(String),
    Counted(String, u64),
}

impl Hit {
    fn into_uri(self) -> String {
        match self {
            Hit::Uri(uri) | Hit::Counted(uri, _) => uri,
        }
    }

    fn into_count(self) -> (String, u64) {
        match self {
            Hit::Uri(uri) => (uri, 1),
            Hit::Counted(uri, count) => (uri, count),
        }
    }
}

impl HttpSearchIndex {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, IndexError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    async fn hits(&self, operand: &str) -> Result<Vec<Hit>, IndexError> {
        debug!(url = %self.url, operand, "Calling search service");
        let response = self
            .client
            .get(&self.url)
            .query(&[("q", operand)])
            .send()
            .await?;
        if response.status() != StatusCode::OK {
            return Err(IndexError::Status(response.status().as_u16()));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl VectorSearch for HttpSearchIndex {
    async fn similar(&self, entity: &str) -> Result<Vec<String>, SearchError> {
        let hits = self.hits(entity).await?;
        Ok(hits.into_iter().map(Hit::into_uri).collect())
    }
}

#[async_trait]
impl FullTextSearch for HttpSearchIndex {
    async fn search(&self, term: &str) -> Result<Vec<String>, SearchError> {
        let hits = self.hits(term).await?;
        Ok(hits.into_iter().map(Hit::into_uri).collect())
    }

    async fn stats(&self, term: &str) -> Result<Vec<(String, u64)>, SearchError> {
        let hits = self.hits(term).await?;
        Ok(hits.into_iter().map(Hit::into_count).collect())
    }
}
