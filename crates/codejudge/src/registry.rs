//! Language registry
//!
//! The constructed lookup table from language id to [`Language`] profile.
//! Built once from a [`Config`] and handed to the runner; never mutated.

use std::collections::HashMap;

use thiserror::Error;

use crate::config::{Config, Language};

/// A language id that is not registered
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("language '{0}' is not supported")]
pub struct UnsupportedLanguage(pub String);

/// Immutable table of the languages the engine can run
#[derive(Debug, Clone, Default)]
pub struct LanguageRegistry {
    languages: HashMap<String, Language>,
}

impl LanguageRegistry {
    pub fn new(languages: HashMap<String, Language>) -> Self {
        Self { languages }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.languages.clone())
    }

    /// Look up a language profile by id
    pub fn resolve(&self, id: &str) -> Result<&Language, UnsupportedLanguage> {
        self.languages
            .get(id)
            .ok_or_else(|| UnsupportedLanguage(id.to_owned()))
    }

    /// Registered ids in sorted order
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.languages.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Registered `(id, language)` pairs in id order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Language)> {
        self.ids()
            .into_iter()
            .filter_map(|id| self.languages.get(id).map(|lang| (id, lang)))
    }

    pub fn len(&self) -> usize {
        self.languages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }
}
