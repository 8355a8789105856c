use super::SnapshotStore;
use anyhow::{Result, anyhow};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

/// In-memory snapshot store. Contents are lost when it is dropped.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let map = self
            .inner
            .read()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        let value = map.get(key).cloned();
        debug!(hit = value.is_some(), "MemoryStore READ {key}");
        Ok(value)
    }

    fn write(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        debug!("MemoryStore WRITE {key}");
        map.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}
