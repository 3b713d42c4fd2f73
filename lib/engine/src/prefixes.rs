use crate::ConfigError;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::fs;
use std::path::Path;

const BUILTIN: [(&str, &str); 12] = [
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
    ("owl", "http://www.w3.org/2002/07/owl#"),
    ("xsd", "http://www.w3.org/2001/XMLSchema#"),
    ("schema", "http://schema.org/"),
    ("skos", "http://www.w3.org/2004/02/skos/core#"),
    ("dct", "http://purl.org/dc/terms/"),
    ("dc", "http://purl.org/dc/elements/1.1/"),
    ("foaf", "http://xmlns.com/foaf/0.1/"),
    ("wd", "http://www.wikidata.org/entity/"),
    ("wdt", "http://www.wikidata.org/prop/direct/"),
    ("fizzy", "https://fizzysearch.ise.fiz-karlsruhe.de/"),
];

/// The prefix declarations that are put in front of every executed query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prefixes {
    prefixes: BTreeMap<String, String>,
}

impl Default for Prefixes {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Prefixes {
    pub fn builtin() -> Self {
        Self {
            prefixes: BUILTIN
                .iter()
                .map(|(prefix, iri)| ((*prefix).to_owned(), (*iri).to_owned()))
                .collect(),
        }
    }

    pub fn empty() -> Self {
        Self {
            prefixes: BTreeMap::new(),
        }
    }

    /// Adds the prefixes of a JSON file mapping IRIs to prefixes, e.g. `{"http://x/": "x:"}`.
    /// Entries of the file replace built-in prefixes with the same name.
    pub fn with_json_file(mut self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|error| ConfigError::PrefixFile {
            path: path.to_owned(),
            error,
        })?;
        let mapping: BTreeMap<String, String> =
            serde_json::from_str(&content).map_err(|error| ConfigError::PrefixFormat {
                path: path.to_owned(),
                error,
            })?;
        for (iri, prefix) in mapping {
            self.insert(prefix.trim().trim_end_matches(':'), iri);
        }
        Ok(self)
    }

    pub fn insert(&mut self, prefix: impl Into<String>, iri: impl Into<String>) {
        self.prefixes.insert(prefix.into(), iri.into());
    }

    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// One `PREFIX p: <iri>` line per prefix.
    pub fn preamble(&self) -> String {
        let mut preamble = String::new();
        for (prefix, iri) in &self.prefixes {
            let _ = writeln!(preamble, "PREFIX {prefix}: <{iri}>");
        }
        preamble
    }

    /// Puts the preamble in front of `query`.
    pub fn apply(&self, query: &str) -> String {
        format!("{}\n{query}", self.preamble())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preamble_declares_every_prefix() {
        let prefixes = Prefixes::builtin();
        let preamble = prefixes.preamble();
        assert_eq!(preamble.lines().count(), 12);
        assert!(preamble.contains("PREFIX fizzy: <https://fizzysearch.ise.fiz-karlsruhe.de/>\n"));
        assert!(prefixes.apply("ASK {}").ends_with("\nASK {}"));
    }

    #[test]
    fn empty_prefixes_leave_the_query_alone() {
        assert_eq!(Prefixes::empty().apply("ASK {}"), "\nASK {}");
    }
}
