//! Alias → symbol bindings.
//!
//! Append-only: an alias is bound at most once and never removed, so a handle
//! read from the registry stays the same for the registry's lifetime.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Registry of bound aliases.
pub struct BindingRegistry<H> {
    bindings: RwLock<HashMap<String, H>>,
}

impl<H: Clone> BindingRegistry<H> {
    pub fn new() -> Self {
        Self {
            bindings: RwLock::new(HashMap::new()),
        }
    }

    /// Get the handle bound to an alias.
    pub fn get(&self, alias: &str) -> Option<H> {
        self.bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(alias)
            .cloned()
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(alias)
    }

    /// Bind an alias unless it is already bound.
    ///
    /// Returns false (and keeps the existing handle) if the alias was taken.
    pub fn bind(&self, alias: &str, handle: H) -> bool {
        let mut bindings = self
            .bindings
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if bindings.contains_key(alias) {
            return false;
        }
        bindings.insert(alias.to_string(), handle);
        true
    }

    /// Bound aliases, sorted.
    pub fn aliases(&self) -> Vec<String> {
        let mut aliases: Vec<String> = self
            .bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        aliases.sort();
        aliases
    }

    pub fn len(&self) -> usize {
        self.bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<H: Clone> Default for BindingRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_once() {
        let registry = BindingRegistry::new();
        assert!(registry.bind("MarcXmlReader", 1));
        assert!(!registry.bind("MarcXmlReader", 2));
        assert_eq!(registry.get("MarcXmlReader"), Some(1));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_aliases_sorted() {
        let registry = BindingRegistry::new();
        registry.bind("SolrInputDocument", ());
        registry.bind("HttpSolrServer", ());
        assert_eq!(registry.aliases(), ["HttpSolrServer", "SolrInputDocument"]);
        assert!(registry.contains("HttpSolrServer"));
        assert!(!registry.contains("MarcXmlReader"));
    }
}
