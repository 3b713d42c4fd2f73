//! Query rewriting for the SHMARQL gateway.
//!
//! Queries may contain search *pseudo-predicates*, triple patterns such as
//! `?s <https://shmarql.com/fts> "culture"` that no triple store understands. The [`Rewriter`]
//! hands the object of such a pattern to a registered [`PseudoPredicateHandler`] and replaces
//! the pattern with a `VALUES` block that binds the subject variable to what the search found.
//!
//! Comments of the form `# shmarql-<key>: <value>` are collected into the
//! [`Settings`](shmarql_model::Settings) of the [`RewriteResult`](shmarql_model::RewriteResult).

mod error;
pub mod handler;
mod lexer;
mod rewriter;

pub use error::{RewriteError, SearchError};
pub use handler::{
    from_fn, FullTextSearch, HandlerRegistry, Operand, PseudoPredicateHandler, Substitution,
    VectorSearch,
};
pub use rewriter::Rewriter;
