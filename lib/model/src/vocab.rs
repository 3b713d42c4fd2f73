//! IRIs that are used across the gateway.

pub mod xsd {
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
}

pub mod rdf {
    pub const LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
    pub const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
}

/// Pseudo-predicates in the `https://shmarql.com/` namespace.
pub mod shmarql {
    pub const FTS: &str = "https://shmarql.com/fts";
    pub const FTS_STATS: &str = "https://shmarql.com/ftsStats";
    pub const VECTOR: &str = "https://shmarql.com/vector";
}

/// Pseudo-predicates understood by fizzysearch-style queries.
pub mod fizzy {
    pub const NAMESPACE: &str = "https://fizzysearch.ise.fiz-karlsruhe.de/";
    pub const FTS: &str = "https://fizzysearch.ise.fiz-karlsruhe.de/fts";
    pub const FTS_PREFIXED: &str = "fizzy:fts";
    pub const FTS_STATS_PREFIXED: &str = "fizzy:ftsStats";
    pub const RDF2VEC_PREFIXED: &str = "fizzy:rdf2vec";
}

/// Placeholder used when a remote endpoint returns a literal in predicate position.
pub const BOGUS_PREDICATE: &str = "http://bogus_literal_as_predicate_from_endpoint/";
