//! Tile store abstraction for the grid cache.
//!
//! This module provides a trait-based abstraction over the durable
//! key-value store that backs a `TileCache` instance, mirroring the
//! browser store the frontend uses: string keys, opaque payload, write
//! timestamp. Expiry decisions stay with the cache; the store only keeps
//! records and purges them when told to.

use crate::error::{ObsMapError, Result};
use crate::types::CacheRecord;
use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};

/// Trait for tile store implementations.
///
/// Operations on a closed store fail with `ObsMapError::StoreClosed`;
/// storage failures always surface to the caller instead of being
/// swallowed as cache misses.
pub trait TileStore: Send {
    /// Create the underlying schema/object store if absent. Idempotent;
    /// the cache guarantees it runs at most once per instance.
    fn ensure_schema(&mut self) -> Result<()>;

    /// Insert or overwrite a record. Last write wins.
    fn put(&mut self, key: &str, record: CacheRecord) -> Result<()>;

    /// Fetch a record by key. Absent keys are `Ok(None)`.
    fn get(&self, key: &str) -> Result<Option<CacheRecord>>;

    /// Remove a record, returning it if it existed.
    fn delete(&mut self, key: &str) -> Result<Option<CacheRecord>>;

    /// Number of records, expired or not.
    fn len(&self) -> Result<usize>;

    /// Whether the store holds no records.
    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Flush pending writes to durable storage.
    fn sync(&mut self) -> Result<()>;

    /// Close the store. Further operations fail with `StoreClosed`.
    fn close(&mut self) -> Result<()>;

    /// Remove every record whose age at `now` has reached `ttl`.
    /// Returns the number of records removed.
    fn purge_expired(&mut self, now: SystemTime, ttl: Duration) -> Result<usize>;
}

/// In-memory tile store backed by a `BTreeMap`.
///
/// The default backend for tests and for hosts that accept recomputing
/// grids across process restarts.
pub struct MemoryStore {
    data: BTreeMap<String, CacheRecord>,
    closed: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            data: BTreeMap::new(),
            closed: false,
        }
    }

    fn guard_open(&self) -> Result<()> {
        if self.closed {
            return Err(ObsMapError::StoreClosed);
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TileStore for MemoryStore {
    fn ensure_schema(&mut self) -> Result<()> {
        self.guard_open()
    }

    fn put(&mut self, key: &str, record: CacheRecord) -> Result<()> {
        self.guard_open()?;
        self.data.insert(key.to_owned(), record);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<CacheRecord>> {
        self.guard_open()?;
        Ok(self.data.get(key).cloned())
    }

    fn delete(&mut self, key: &str) -> Result<Option<CacheRecord>> {
        self.guard_open()?;
        Ok(self.data.remove(key))
    }

    fn len(&self) -> Result<usize> {
        self.guard_open()?;
        Ok(self.data.len())
    }

    fn sync(&mut self) -> Result<()> {
        self.guard_open()
    }

    fn close(&mut self) -> Result<()> {
        self.data.clear();
        self.closed = true;
        Ok(())
    }

    fn purge_expired(&mut self, now: SystemTime, ttl: Duration) -> Result<usize> {
        self.guard_open()?;
        let before = self.data.len();
        self.data.retain(|_, record| !record.is_expired_at(now, ttl));
        Ok(before - self.data.len())
    }
}

/// Durable tile store persisting records to a snapshot file.
///
/// Models the browser's persistent store: records survive restarts and are
/// loaded back on `ensure_schema`. Every mutation rewrites the snapshot,
/// which is acceptable at the record counts a map frontend produces
/// (one record per viewport/zoom combination).
#[cfg(feature = "persist")]
pub struct FileStore {
    path: std::path::PathBuf,
    data: BTreeMap<String, CacheRecord>,
    loaded: bool,
    closed: bool,
}

#[cfg(feature = "persist")]
impl FileStore {
    /// Create a store persisting to `path`. The file is created on first
    /// write and loaded on `ensure_schema` if it already exists.
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            data: BTreeMap::new(),
            loaded: false,
            closed: false,
        }
    }

    fn guard_open(&self) -> Result<()> {
        if self.closed {
            return Err(ObsMapError::StoreClosed);
        }
        Ok(())
    }

    fn write_snapshot(&self) -> Result<()> {
        let encoded = bincode::serialize(&self.data)
            .map_err(|e| ObsMapError::Storage(format!("snapshot encode failed: {}", e)))?;
        // Write-then-rename so a crash mid-write never truncates the store.
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, encoded)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(feature = "persist")]
impl TileStore for FileStore {
    fn ensure_schema(&mut self) -> Result<()> {
        self.guard_open()?;
        if self.loaded {
            return Ok(());
        }
        if self.path.exists() {
            let raw = std::fs::read(&self.path)?;
            self.data = bincode::deserialize(&raw)
                .map_err(|e| ObsMapError::Storage(format!("snapshot decode failed: {}", e)))?;
        }
        self.loaded = true;
        Ok(())
    }

    fn put(&mut self, key: &str, record: CacheRecord) -> Result<()> {
        self.guard_open()?;
        self.data.insert(key.to_owned(), record);
        self.write_snapshot()
    }

    fn get(&self, key: &str) -> Result<Option<CacheRecord>> {
        self.guard_open()?;
        Ok(self.data.get(key).cloned())
    }

    fn delete(&mut self, key: &str) -> Result<Option<CacheRecord>> {
        self.guard_open()?;
        let old = self.data.remove(key);
        if old.is_some() {
            self.write_snapshot()?;
        }
        Ok(old)
    }

    fn len(&self) -> Result<usize> {
        self.guard_open()?;
        Ok(self.data.len())
    }

    fn sync(&mut self) -> Result<()> {
        self.guard_open()?;
        self.write_snapshot()
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.write_snapshot()?;
        self.data.clear();
        self.closed = true;
        Ok(())
    }

    fn purge_expired(&mut self, now: SystemTime, ttl: Duration) -> Result<usize> {
        self.guard_open()?;
        let before = self.data.len();
        self.data.retain(|_, record| !record.is_expired_at(now, ttl));
        let removed = before - self.data.len();
        if removed > 0 {
            self.write_snapshot()?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_basic_ops() {
        let mut store = MemoryStore::new();
        store.ensure_schema().unwrap();

        let record = CacheRecord::new(vec![1u8, 2, 3]);
        store.put("tile:a", record.clone()).unwrap();

        let fetched = store.get("tile:a").unwrap().unwrap();
        assert_eq!(fetched.payload, record.payload);
        assert!(store.get("tile:missing").unwrap().is_none());

        let deleted = store.delete("tile:a").unwrap();
        assert!(deleted.is_some());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_memory_store_last_write_wins() {
        let mut store = MemoryStore::new();
        store.put("k", CacheRecord::new(vec![1u8])).unwrap();
        store.put("k", CacheRecord::new(vec![2u8])).unwrap();

        assert_eq!(store.len().unwrap(), 1);
        assert_eq!(store.get("k").unwrap().unwrap().payload.as_ref(), &[2u8]);
    }

    #[test]
    fn test_memory_store_closed() {
        let mut store = MemoryStore::new();
        store.put("k", CacheRecord::new(vec![1u8])).unwrap();
        store.close().unwrap();

        assert!(matches!(
            store.get("k"),
            Err(ObsMapError::StoreClosed)
        ));
        assert!(matches!(
            store.put("k", CacheRecord::new(vec![1u8])),
            Err(ObsMapError::StoreClosed)
        ));
    }

    #[test]
    fn test_memory_store_purge_expired() {
        let mut store = MemoryStore::new();
        let now = SystemTime::now();
        let ttl = Duration::from_secs(60);

        store
            .put(
                "stale",
                CacheRecord::written_at(vec![0u8], now - Duration::from_secs(120)),
            )
            .unwrap();
        store
            .put("fresh", CacheRecord::written_at(vec![0u8], now))
            .unwrap();

        let removed = store.purge_expired(now, ttl).unwrap();
        assert_eq!(removed, 1);
        assert!(store.get("stale").unwrap().is_none());
        assert!(store.get("fresh").unwrap().is_some());
    }

    #[cfg(feature = "persist")]
    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grids.bin");

        let mut store = FileStore::new(&path);
        store.ensure_schema().unwrap();
        store.put("tile:a", CacheRecord::new(vec![9u8, 9])).unwrap();
        store.close().unwrap();

        let mut reopened = FileStore::new(&path);
        reopened.ensure_schema().unwrap();
        let record = reopened.get("tile:a").unwrap().unwrap();
        assert_eq!(record.payload.as_ref(), &[9u8, 9]);
    }

    #[cfg(feature = "persist")]
    #[test]
    fn test_file_store_corrupt_snapshot_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grids.bin");
        std::fs::write(&path, b"definitely not bincode").unwrap();

        let mut store = FileStore::new(&path);
        assert!(matches!(
            store.ensure_schema(),
            Err(ObsMapError::Storage(_))
        ));
    }
}
