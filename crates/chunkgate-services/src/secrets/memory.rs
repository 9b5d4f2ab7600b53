use super::{SecretStore, SecretStoreError, SecretStoreResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

/// Secret store held in process memory
#[derive(Debug, Default)]
pub struct InMemorySecretStore {
    entries: RwLock<HashMap<String, HashMap<String, String>>>,
    writes: AtomicUsize,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful writes since creation
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Raw stored value, for assertions
    pub fn get(&self, path: &str, name: &str) -> Option<String> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(path).and_then(|data| data.get(name)).cloned()
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn write_key(&self, path: &str, name: &str, value: &str) -> SecretStoreResult<()> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries
            .entry(path.to_string())
            .or_default()
            .insert(name.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn read_key(&self, path: &str, name: &str) -> SecretStoreResult<String> {
        self.get(path, name)
            .ok_or_else(|| SecretStoreError::NotFound(format!("{}#{}", path, name)))
    }

    async fn check(&self) -> SecretStoreResult<()> {
        Ok(())
    }
}
