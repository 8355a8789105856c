use super::SnapshotStore;
use anyhow::{Context, Result};
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use tracing::debug;

const PARTITION: &str = "snapshots";

/// Snapshot store backed by a fjall keyspace on disk.
pub struct DiskStore {
    keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create data directory: {}", path.display()))?;

        let keyspace = Config::new(path.join("db"))
            .open()
            .with_context(|| format!("Failed to open data store at {}", path.display()))?;
        let partition = keyspace
            .open_partition(PARTITION, PartitionCreateOptions::default())
            .context("Failed to open snapshot partition")?;
        debug!("Opened data store at {}", path.display());

        Ok(Self {
            keyspace,
            partition,
        })
    }
}

impl SnapshotStore for DiskStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value = self.partition.get(key)?.map(|v| v.to_vec());
        debug!(hit = value.is_some(), "DiskStore READ {key}");
        Ok(value)
    }

    fn write(&self, key: &str, value: &[u8]) -> Result<()> {
        self.partition.insert(key, value)?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        debug!("DiskStore WRITE {key}");
        Ok(())
    }
}
