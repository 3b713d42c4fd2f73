use crate::SearchError;
use async_trait::async_trait;
use shmarql_model::vocab::{fizzy, shmarql};
use std::collections::HashMap;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::future::Future;
use std::sync::Arc;

/// The object of a pseudo-predicate triple pattern.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operand {
    /// The lexical form of a literal, without quotes, language tag or datatype.
    Literal(String),
    /// An IRI, with prefixed names already expanded.
    Iri(String),
}

impl Operand {
    pub fn value(&self) -> &str {
        match self {
            Operand::Literal(value) | Operand::Iri(value) => value,
        }
    }
}

impl Display for Operand {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(value) => write!(f, "\"{value}\""),
            Operand::Iri(value) => write!(f, "<{value}>"),
        }
    }
}

/// What a handler binds to the subject variable of its triple pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Substitution {
    /// `VALUES ?var { <uri> ... }`
    Uris(Vec<String>),
    /// `VALUES (?var ?varCount) { (<uri> count) ... }`
    Counts(Vec<(String, u64)>),
}

/// Resolves the operand of a pseudo-predicate into the values of the subject variable.
#[async_trait]
pub trait PseudoPredicateHandler: Send + Sync {
    async fn resolve(&self, operand: &Operand) -> Result<Substitution, SearchError>;
}

/// A full-text index over the literals of a dataset.
#[async_trait]
pub trait FullTextSearch: Send + Sync {
    /// Returns the subjects that have a literal matching `term`.
    async fn search(&self, term: &str) -> Result<Vec<String>, SearchError>;

    /// Returns the subjects that have a literal matching `term` with the number of matches.
    async fn stats(&self, term: &str) -> Result<Vec<(String, u64)>, SearchError>;
}

/// A vector-similarity index over the entities of a dataset.
#[async_trait]
pub trait VectorSearch: Send + Sync {
    /// Returns the entities most similar to `entity`.
    async fn similar(&self, entity: &str) -> Result<Vec<String>, SearchError>;
}

struct FullTextHandler(Arc<dyn FullTextSearch>);

#[async_trait]
impl PseudoPredicateHandler for FullTextHandler {
    async fn resolve(&self, operand: &Operand) -> Result<Substitution, SearchError> {
        Ok(Substitution::Uris(self.0.search(operand.value()).await?))
    }
}

struct StatsHandler(Arc<dyn FullTextSearch>);

#[async_trait]
impl PseudoPredicateHandler for StatsHandler {
    async fn resolve(&self, operand: &Operand) -> Result<Substitution, SearchError> {
        Ok(Substitution::Counts(self.0.stats(operand.value()).await?))
    }
}

struct VectorHandler(Arc<dyn VectorSearch>);

#[async_trait]
impl PseudoPredicateHandler for VectorHandler {
    async fn resolve(&self, operand: &Operand) -> Result<Substitution, SearchError> {
        Ok(Substitution::Uris(self.0.similar(operand.value()).await?))
    }
}

struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> PseudoPredicateHandler for FnHandler<F>
where
    F: Fn(Operand) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Substitution, SearchError>> + Send + 'static,
{
    async fn resolve(&self, operand: &Operand) -> Result<Substitution, SearchError> {
        (self.0)(operand.clone()).await
    }
}

/// Wraps an async closure into a handler.
pub fn from_fn<F, Fut>(f: F) -> Arc<dyn PseudoPredicateHandler>
where
    F: Fn(Operand) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Substitution, SearchError>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

/// The pseudo-predicates a rewriter knows, keyed by IRI or by their literal prefixed form.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn PseudoPredicateHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, handler: Arc<dyn PseudoPredicateHandler>) -> Self {
        self.register(key, handler);
        self
    }

    pub fn register(&mut self, key: impl Into<String>, handler: Arc<dyn PseudoPredicateHandler>) {
        self.handlers.insert(key.into(), handler);
    }

    /// Registers the full-text and stats pseudo-predicates for `index`.
    #[must_use]
    pub fn with_full_text(mut self, index: Arc<dyn FullTextSearch>) -> Self {
        let search: Arc<dyn PseudoPredicateHandler> =
            Arc::new(FullTextHandler(Arc::clone(&index)));
        for key in [shmarql::FTS, fizzy::FTS, fizzy::FTS_PREFIXED] {
            self.register(key, Arc::clone(&search));
        }
        let stats: Arc<dyn PseudoPredicateHandler> = Arc::new(StatsHandler(index));
        for key in [shmarql::FTS_STATS, fizzy::FTS_STATS_PREFIXED] {
            self.register(key, Arc::clone(&stats));
        }
        self
    }

    /// Registers the vector-similarity pseudo-predicates for `index`.
    #[must_use]
    pub fn with_vector(mut self, index: Arc<dyn VectorSearch>) -> Self {
        let similar: Arc<dyn PseudoPredicateHandler> = Arc::new(VectorHandler(index));
        for key in [shmarql::VECTOR, fizzy::RDF2VEC_PREFIXED] {
            self.register(key, Arc::clone(&similar));
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&Arc<dyn PseudoPredicateHandler>> {
        self.handlers.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

impl Debug for HandlerRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.keys().collect();
        keys.sort_unstable();
        f.debug_struct("HandlerRegistry")
            .field("keys", &keys)
            .finish()
    }
}
