use crate::{EndpointRegistry, ResolveError};
use rand::prelude::IndexedRandom;
use rand::Rng;
use std::fmt;
use std::fmt::{Display, Formatter};

/// The identifier of the embedded store wherever a target is reported as a string.
pub const LOCAL_TARGET: &str = "__local__";

/// Where a query is executed.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EndpointTarget {
    Remote(String),
    Local,
}

impl EndpointTarget {
    pub fn is_local(&self) -> bool {
        matches!(self, EndpointTarget::Local)
    }

    /// The URL of a remote endpoint, or `__local__`.
    pub fn as_str(&self) -> &str {
        match self {
            EndpointTarget::Remote(url) => url,
            EndpointTarget::Local => LOCAL_TARGET,
        }
    }
}

impl Display for EndpointTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the resolver knows about the embedded store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LocalStoreState {
    #[default]
    Unavailable,
    /// The initial load has not finished yet. The store counts as having data.
    Loading,
    Ready {
        triples: usize,
    },
}

impl LocalStoreState {
    fn is_routable(self) -> bool {
        match self {
            LocalStoreState::Unavailable => false,
            LocalStoreState::Loading => true,
            LocalStoreState::Ready { triples } => triples > 0,
        }
    }
}

/// Picks the target of a query.
///
/// In order: the endpoint named by the `shmarql-engine` directive, the default endpoint, a
/// uniformly random named endpoint, the local store if it has data.
pub fn resolve(
    directive: Option<&str>,
    registry: &EndpointRegistry,
    local: LocalStoreState,
) -> Result<EndpointTarget, ResolveError> {
    resolve_with_rng(directive, registry, local, &mut rand::rng())
}

/// Like [`resolve`], drawing the random fallback from `rng`.
pub fn resolve_with_rng<R: Rng + ?Sized>(
    directive: Option<&str>,
    registry: &EndpointRegistry,
    local: LocalStoreState,
    rng: &mut R,
) -> Result<EndpointTarget, ResolveError> {
    if let Some(url) = directive.and_then(|name| registry.get(name)) {
        return Ok(EndpointTarget::Remote(url.to_owned()));
    }
    if let Some(url) = registry.default_endpoint() {
        return Ok(EndpointTarget::Remote(url.to_owned()));
    }
    if let Some(url) = registry.named_urls().choose(rng) {
        return Ok(EndpointTarget::Remote((*url).to_owned()));
    }
    if local.is_routable() {
        return Ok(EndpointTarget::Local);
    }
    Err(ResolveError::NoEndpointFound)
}
