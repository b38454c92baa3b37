//! In-memory secret store

use std::collections::HashMap;

use parking_lot::RwLock;

use super::traits::{SecretStore, SecretStoreResult};

/// In-memory secret store for tests and keys passed on the command line
///
/// Lookups are exact on the key, then case-insensitive.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    secrets: RwLock<HashMap<String, String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory store with one secret
    pub fn with_secret(key: impl Into<String>, value: impl Into<String>) -> Self {
        let store = Self::new();
        store.secrets.write().insert(key.into(), value.into());
        store
    }

    pub fn len(&self) -> usize {
        self.secrets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SecretStore for MemorySecretStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn get(&self, key: &str) -> Option<String> {
        let secrets = self.secrets.read();
        secrets.get(key).cloned().or_else(|| {
            secrets
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v.clone())
        })
    }

    fn store(&self, key: &str, value: &str) -> SecretStoreResult<()> {
        self.secrets.write().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemorySecretStore::new();
        assert!(store.is_empty());

        store.store("anthropic", "sk-ant").unwrap();
        assert_eq!(store.get("anthropic"), Some("sk-ant".to_string()));
        assert_eq!(store.get("Anthropic"), Some("sk-ant".to_string()));
        assert_eq!(store.len(), 1);
        assert!(!store.has("openai"));
    }

    #[test]
    fn test_with_secret() {
        let store = MemorySecretStore::with_secret("openai", "sk-1");
        assert!(store.has("openai"));
    }
}
