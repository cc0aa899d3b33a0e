//! Grammar Registry
//!
//! Maps language ids to grammars. Several ids may share one grammar (a family
//! id plus dialect ids), and the registration order of ids is kept exactly:
//! it is the order `list_languages` reports.

use super::Grammar;
use crate::language::LanguageId;
use crate::{Error, Result};
use indexmap::IndexMap;
use std::sync::Arc;

/// Registry of grammars, keyed by language id in registration order
#[derive(Debug, Default)]
pub struct GrammarRegistry {
    languages: IndexMap<LanguageId, Arc<Grammar>>,
}

impl GrammarRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a grammar under one language id
    pub fn register(&mut self, id: impl Into<LanguageId>, grammar: Arc<Grammar>) -> Result<()> {
        let id = id.into();
        if self.languages.contains_key(&id) {
            return Err(Error::DuplicateLanguage(id.to_string()));
        }
        tracing::debug!("Registered language {} -> {} grammar", id, grammar.name());
        self.languages.insert(id, grammar);
        Ok(())
    }

    /// Register one grammar under several ids, in the given order.
    ///
    /// Either every id is registered or, on a duplicate, none is.
    pub fn register_family(&mut self, ids: &[&str], grammar: Grammar) -> Result<Arc<Grammar>> {
        let ids: Vec<LanguageId> = ids.iter().map(|id| LanguageId::new(id)).collect();
        for (i, id) in ids.iter().enumerate() {
            if self.languages.contains_key(id) || ids[..i].contains(id) {
                return Err(Error::DuplicateLanguage(id.to_string()));
            }
        }

        let grammar = Arc::new(grammar);
        for id in ids {
            self.register(id, Arc::clone(&grammar))?;
        }
        Ok(grammar)
    }

    /// Resolve a language id. Unknown ids are an error, never a default grammar.
    pub fn resolve(&self, id: &str) -> Result<&Arc<Grammar>> {
        let normalized = crate::language::normalize(id);
        self.languages
            .get(normalized.as_str())
            .ok_or_else(|| Error::UnknownLanguage(id.to_string()))
    }

    /// Resolve a language id, returning the normalized id alongside the grammar
    pub fn resolve_entry(&self, id: &str) -> Result<(&LanguageId, &Arc<Grammar>)> {
        let normalized = crate::language::normalize(id);
        self.languages
            .get_key_value(normalized.as_str())
            .ok_or_else(|| Error::UnknownLanguage(id.to_string()))
    }

    /// Registered language ids, in registration order
    pub fn list_languages(&self) -> Vec<LanguageId> {
        self.languages.keys().cloned().collect()
    }

    /// Ids sharing a grammar with `id` (itself included), in registration order
    pub fn family(&self, id: &str) -> Result<Vec<LanguageId>> {
        let grammar = self.resolve(id)?;
        Ok(self
            .languages
            .iter()
            .filter(|(_, g)| Arc::ptr_eq(g, grammar))
            .map(|(id, _)| id.clone())
            .collect())
    }

    /// Distinct grammars, in order of first registration
    pub fn grammars(&self) -> Vec<&Arc<Grammar>> {
        let mut grammars: Vec<&Arc<Grammar>> = Vec::new();
        for grammar in self.languages.values() {
            if !grammars.iter().any(|g| Arc::ptr_eq(g, grammar)) {
                grammars.push(grammar);
            }
        }
        grammars
    }

    pub fn contains(&self, id: &str) -> bool {
        self.resolve(id).is_ok()
    }

    pub fn len(&self) -> usize {
        self.languages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn html() -> Grammar {
        Grammar::new("html", tree_sitter_html::LANGUAGE.into(), "document").unwrap()
    }

    fn python() -> Grammar {
        Grammar::new("python", tree_sitter_python::LANGUAGE.into(), "module").unwrap()
    }

    #[test]
    fn test_registration_order_is_kept() {
        let mut registry = GrammarRegistry::new();
        registry.register_family(&["html", "xml"], html()).unwrap();
        registry.register_family(&["python", "python2", "python3"], python()).unwrap();

        let ids: Vec<String> = registry.list_languages().into_iter().map(String::from).collect();
        assert_eq!(ids, vec!["html", "xml", "python", "python2", "python3"]);
        assert_eq!(registry.grammars().len(), 2);
    }

    #[test]
    fn test_aliases_share_grammar() {
        let mut registry = GrammarRegistry::new();
        registry.register_family(&["python", "python2", "python3"], python()).unwrap();

        let a = registry.resolve("python2").unwrap();
        let b = registry.resolve("PYTHON3").unwrap();
        assert!(Arc::ptr_eq(a, b));
        assert_eq!(registry.family("python3").unwrap(), vec!["python", "python2", "python3"]);
    }

    #[test]
    fn test_unknown_language() {
        let mut registry = GrammarRegistry::new();
        registry.register_family(&["html", "xml"], html()).unwrap();

        let err = registry.resolve("python").unwrap_err();
        assert!(err.is_unknown_language());
        assert!(!registry.contains("python"));
    }

    #[test]
    fn test_duplicate_family_is_atomic() {
        let mut registry = GrammarRegistry::new();
        registry.register_family(&["html", "xml"], html()).unwrap();

        let err = registry.register_family(&["python", "xml"], python()).unwrap_err();
        assert!(matches!(err, Error::DuplicateLanguage(ref id) if id == "xml"));
        assert!(!registry.contains("python"));
        assert_eq!(registry.len(), 2);

        let err = registry.register_family(&["go", "go"], python()).unwrap_err();
        assert!(matches!(err, Error::DuplicateLanguage(_)));
        assert!(!registry.contains("go"));
    }
}
