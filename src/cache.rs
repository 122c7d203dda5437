//! Grid tile cache with per-instance TTL and lazy expiry.
//!
//! A `TileCache` avoids recomputing `grid::bucket` output for an unchanged
//! marker set and resolution. Entries are keyed by a deterministic
//! derivation over the marker identities plus the resolution, stamped with
//! their write instant, and reported as misses once their age reaches the
//! instance TTL. Expired records stay in storage until [`TileCache::purge_expired`]
//! runs; there is no background eviction.
//!
//! The production frontend runs two independent instances: a grid cache
//! ([`GRID_TTL`], one hour) and a region cache ([`REGION_TTL`], five
//! minutes).
//!
//! # Examples
//!
//! ```rust
//! use obsmap::{CacheConfig, MemoryStore, TileCache, GRID_TTL};
//! use obsmap::grid::bucket;
//! use obsmap_types::{Marker, Source};
//!
//! let markers = vec![Marker::new(1, Source::Fobi, -6.2, 106.8)];
//! let cells = bucket(&markers, 0.2)?;
//!
//! let cache = TileCache::open(
//!     MemoryStore::new(),
//!     CacheConfig::new("grids").with_ttl(GRID_TTL),
//! )?;
//! cache.put(&markers, 0.2, &cells)?;
//! assert_eq!(cache.get(&markers, 0.2)?, Some(cells));
//!
//! cache.close()?;
//! # Ok::<(), obsmap::ObsMapError>(())
//! ```

use crate::error::{ObsMapError, Result};
use crate::storage::TileStore;
use crate::types::{CacheConfig, CacheRecord, CacheStats, GridCell};
use log::debug;
use obsmap_types::Marker;
use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};
use std::time::{Duration, SystemTime};

/// TTL of the grid cache instance (1 hour).
pub const GRID_TTL: Duration = Duration::from_millis(3_600_000);

/// TTL of the region cache instance (5 minutes).
pub const REGION_TTL: Duration = Duration::from_millis(300_000);

/// Derive the cache key for a marker set at a resolution.
///
/// The key is the ordered `(id, source)` identity pairs joined with `;`,
/// followed by `:` and the resolution. Any change in membership, order, or
/// resolution yields a different key. Marker order is deliberately NOT
/// normalized: reordered-but-identical sets are distinct keys, matching how
/// the upstream API pages markers deterministically.
///
/// # Examples
///
/// ```
/// use obsmap::cache::cache_key;
/// use obsmap_types::{Marker, Source};
///
/// let markers = vec![
///     Marker::new(1, Source::Fobi, -6.2, 106.8),
///     Marker::new(2, Source::Taxa, -6.3, 106.9),
/// ];
/// assert_eq!(cache_key(&markers, 0.2), "1-fobi;2-taxa:0.2");
/// ```
pub fn cache_key(markers: &[Marker], resolution: f64) -> String {
    let mut key = String::with_capacity(markers.len() * 8 + 8);
    for (i, marker) in markers.iter().enumerate() {
        if i > 0 {
            key.push(';');
        }
        key.push_str(&marker.id.to_string());
        key.push('-');
        key.push_str(marker.source.as_str());
    }
    key.push(':');
    key.push_str(&resolution.to_string());
    key
}

/// A cache of computed grid cells over a durable tile store.
///
/// Explicitly constructed and dependency-injected; there is no global
/// instance. `open` validates the configuration, `close` releases the
/// underlying store deterministically, and the store schema is created
/// lazily on first use, exactly once, even under concurrent first use.
///
/// A cache miss (absent or expired entry) is `Ok(None)`; errors are
/// reserved for storage and serialization failures.
pub struct TileCache<S: TileStore> {
    store: RwLock<S>,
    config: CacheConfig,
    init: OnceCell<()>,
    stats: Mutex<CacheStats>,
}

impl<S: TileStore> TileCache<S> {
    /// Open a cache over `store` with the given configuration.
    ///
    /// # Errors
    ///
    /// `InvalidInput` when the configuration fails validation.
    pub fn open(store: S, config: CacheConfig) -> Result<Self> {
        config.validate().map_err(ObsMapError::InvalidInput)?;
        Ok(Self {
            store: RwLock::new(store),
            config,
            init: OnceCell::new(),
            stats: Mutex::new(CacheStats::new()),
        })
    }

    /// The store namespace this instance owns.
    pub fn namespace(&self) -> &str {
        &self.config.namespace
    }

    /// The configured entry time-to-live.
    pub fn ttl(&self) -> Duration {
        self.config.ttl()
    }

    /// Look up cached cells for a marker set and resolution.
    ///
    /// Returns `Ok(None)` when nothing was stored under the derived key or
    /// the stored record's age has reached the TTL. The expired record is
    /// left in place (lazy expiry).
    pub fn get(&self, markers: &[Marker], resolution: f64) -> Result<Option<Vec<GridCell>>> {
        self.get_at(markers, resolution, SystemTime::now())
    }

    /// Clock-injected variant of [`get`](Self::get), used by expiry tests.
    pub fn get_at(
        &self,
        markers: &[Marker],
        resolution: f64,
        now: SystemTime,
    ) -> Result<Option<Vec<GridCell>>> {
        self.ensure_init()?;
        let key = cache_key(markers, resolution);

        let record = self.store.read().get(&key)?;
        let Some(record) = record else {
            debug!("cache miss (absent) namespace={} key_len={}", self.namespace(), key.len());
            self.stats.lock().record_miss();
            return Ok(None);
        };

        if record.is_expired_at(now, self.ttl()) {
            debug!("cache miss (expired) namespace={}", self.namespace());
            self.stats.lock().record_miss();
            return Ok(None);
        }

        let cells: Vec<GridCell> = serde_json::from_slice(&record.payload)?;
        debug!(
            "cache hit namespace={} cells={}",
            self.namespace(),
            cells.len()
        );
        self.stats.lock().record_hit();
        Ok(Some(cells))
    }

    /// Store computed cells for a marker set and resolution, stamped with
    /// the current time. Overwrites any previous entry under the same key.
    pub fn put(&self, markers: &[Marker], resolution: f64, cells: &[GridCell]) -> Result<()> {
        self.ensure_init()?;
        let key = cache_key(markers, resolution);
        let payload = serde_json::to_vec(cells)?;

        self.store.write().put(&key, CacheRecord::new(payload))
    }

    /// Remove every record whose age has reached the TTL. Returns the
    /// number of records removed.
    pub fn purge_expired(&self) -> Result<usize> {
        self.ensure_init()?;
        let removed = self
            .store
            .write()
            .purge_expired(SystemTime::now(), self.ttl())?;
        self.stats.lock().record_purged(removed as u64);
        Ok(removed)
    }

    /// Flush pending writes to durable storage.
    pub fn sync(&self) -> Result<()> {
        self.ensure_init()?;
        self.store.write().sync()
    }

    /// Close the cache, releasing the underlying store. Subsequent
    /// operations fail with `StoreClosed`.
    pub fn close(&self) -> Result<()> {
        self.store.write().close()
    }

    /// Current counters, with the live record count read from the store.
    pub fn stats(&self) -> Result<CacheStats> {
        let mut stats = self.stats.lock().clone();
        stats.record_count = self.store.read().len()?;
        Ok(stats)
    }

    /// Run schema creation exactly once per instance, even when the first
    /// `get`/`put` calls race from multiple threads.
    fn ensure_init(&self) -> Result<()> {
        self.init
            .get_or_try_init(|| self.store.write().ensure_schema())
            .copied()
    }
}
