//! Whole-collection snapshot persistence.
pub mod disk;
pub mod memory;

use anyhow::{Context, Result};
use serde::{Serialize, de::DeserializeOwned};
use std::fmt::Display;
use tracing::{debug, warn};

/// Named collections, each stored as one JSON document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Loans,
    Transactions,
    Profile,
    Notifications,
    Theme,
    Rates,
}

impl Collection {
    pub fn key(&self) -> &'static str {
        match self {
            Collection::Loans => "loans",
            Collection::Transactions => "transactions",
            Collection::Profile => "profile",
            Collection::Notifications => "notifications",
            Collection::Theme => "theme",
            Collection::Rates => "rates",
        }
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Durable key-value storage of raw snapshot bytes.
pub trait SnapshotStore: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn write(&self, key: &str, value: &[u8]) -> Result<()>;
}

/// Decodes a collection, falling back to `default` when it is missing,
/// unreadable or does not match the expected shape.
pub fn load_or<T, F>(store: &dyn SnapshotStore, collection: Collection, default: F) -> T
where
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    match store.read(collection.key()) {
        Ok(Some(bytes)) => match serde_json::from_slice::<T>(&bytes) {
            Ok(value) => {
                debug!("Loaded {collection} snapshot ({} bytes)", bytes.len());
                value
            }
            Err(e) => {
                warn!("Discarding malformed {collection} snapshot: {e}");
                default()
            }
        },
        Ok(None) => {
            debug!("No {collection} snapshot, using defaults");
            default()
        }
        Err(e) => {
            warn!("Failed to read {collection} snapshot: {e}");
            default()
        }
    }
}

pub fn save<T: Serialize + ?Sized>(
    store: &dyn SnapshotStore,
    collection: Collection,
    value: &T,
) -> Result<()> {
    let bytes = serde_json::to_vec(value)
        .with_context(|| format!("Failed to serialize {collection} snapshot"))?;
    store
        .write(collection.key(), &bytes)
        .with_context(|| format!("Failed to write {collection} snapshot"))?;
    debug!("Saved {collection} snapshot ({} bytes)", bytes.len());
    Ok(())
}
