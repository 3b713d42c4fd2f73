use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Settings extracted from `# shmarql-<key>: <value>` comments of a query.
///
/// Every key keeps its values in the order in which they appeared in the query.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings(BTreeMap<String, Vec<String>>);

impl Settings {
    /// Selects the endpoint that answers the query.
    pub const ENGINE: &'static str = "engine";
    /// Bypasses the query cache for lookups and writes.
    pub const NOCACHE: &'static str = "nocache";

    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `key` without adding a value.
    pub fn insert_key(&mut self, key: impl Into<String>) {
        self.0.entry(key.into()).or_default();
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.entry(key.into()).or_default().push(value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn get(&self, key: &str) -> &[String] {
        self.0.get(key).map_or(&[], Vec::as_slice)
    }

    pub fn last(&self, key: &str) -> Option<&str> {
        self.get(key).last().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_keep_their_order() {
        let mut settings = Settings::new();
        settings.push("engine", "a");
        settings.push("engine", "b");
        assert_eq!(settings.get("engine"), ["a", "b"]);
        assert_eq!(settings.last("engine"), Some("b"));
    }

    #[test]
    fn key_without_value() {
        let mut settings = Settings::new();
        settings.insert_key(Settings::NOCACHE);
        assert!(settings.contains(Settings::NOCACHE));
        assert!(settings.get(Settings::NOCACHE).is_empty());
        assert_eq!(settings.last(Settings::NOCACHE), None);
    }
}
