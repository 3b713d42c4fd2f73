use crate::ConfigError;

/// The name reported for endpoints that are not registered under a name.
pub const DEFAULT_ENDPOINT_NAME: &str = "default";

/// The configured SPARQL endpoints: an optional default and any number of named ones.
///
/// The registry is built once at start-up and never changes afterwards.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EndpointRegistry {
    default: Option<String>,
    named: Vec<(String, String)>,
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs up endpoint `names` with `urls`. Empty entries are ignored.
    pub fn from_lists<N, U>(
        names: impl IntoIterator<Item = N>,
        urls: impl IntoIterator<Item = U>,
    ) -> Result<Self, ConfigError>
    where
        N: Into<String>,
        U: Into<String>,
    {
        let names: Vec<String> = non_empty(names);
        let urls: Vec<String> = non_empty(urls);
        if names.len() != urls.len() {
            return Err(ConfigError::EndpointListMismatch {
                names: names.len(),
                urls: urls.len(),
            });
        }
        Ok(Self {
            default: None,
            named: names.into_iter().zip(urls).collect(),
        })
    }

    #[must_use]
    pub fn with_default(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.default = (!url.is_empty()).then_some(url);
        self
    }

    /// Adds a named endpoint. A later registration under the same name replaces the earlier one.
    #[must_use]
    pub fn with_endpoint(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        let (name, url) = (name.into(), url.into());
        match self.named.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = url,
            None => self.named.push((name, url)),
        }
        self
    }

    pub fn default_endpoint(&self) -> Option<&str> {
        self.default.as_deref()
    }

    /// The URL of the endpoint registered as `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.named
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, url)| url.as_str())
    }

    /// The name under which `url` is registered, or `"default"`.
    pub fn name_of(&self, url: &str) -> &str {
        self.named
            .iter()
            .find(|(_, existing)| existing == url)
            .map_or(DEFAULT_ENDPOINT_NAME, |(name, _)| name.as_str())
    }

    pub fn named(&self) -> impl ExactSizeIterator<Item = (&str, &str)> {
        self.named
            .iter()
            .map(|(name, url)| (name.as_str(), url.as_str()))
    }

    /// The URLs of the named endpoints, in registration order.
    pub fn named_urls(&self) -> Vec<&str> {
        self.named.iter().map(|(_, url)| url.as_str()).collect()
    }

    /// Returns true if neither a default nor a named endpoint is configured.
    pub fn is_empty(&self) -> bool {
        self.default.is_none() && self.named.is_empty()
    }
}

fn non_empty<T: Into<String>>(values: impl IntoIterator<Item = T>) -> Vec<String> {
    values
        .into_iter()
        .map(Into::into)
        .filter(|value| !value.trim().is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_pair_up() {
        let registry =
            EndpointRegistry::from_lists(["a", "b", ""], ["http://a/sparql", "http://b/sparql"])
                .unwrap();
        assert_eq!(registry.get("b"), Some("http://b/sparql"));
        assert_eq!(registry.name_of("http://a/sparql"), "a");
        assert_eq!(registry.name_of("http://elsewhere/sparql"), "default");
        assert_eq!(registry.named().len(), 2);
    }

    #[test]
    fn mismatched_lists_are_rejected() {
        let error = EndpointRegistry::from_lists(["a"], ["http://a", "http://b"]).unwrap_err();
        assert!(matches!(
            error,
            ConfigError::EndpointListMismatch { names: 1, urls: 2 }
        ));
    }

    #[test]
    fn empty_default_is_ignored() {
        let registry = EndpointRegistry::new().with_default("");
        assert!(registry.is_empty());
        assert_eq!(registry.default_endpoint(), None);
    }

    #[test]
    fn re_registering_a_name_replaces_it() {
        let registry = EndpointRegistry::new()
            .with_endpoint("a", "http://old")
            .with_endpoint("a", "http://new");
        assert_eq!(registry.named_urls(), ["http://new"]);
    }
}
