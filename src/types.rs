//! Grid cell and cache configuration types.
//!
//! This module provides the derived entities of the clustering pipeline
//! (grid cells, cache records) and the serializable cache configuration.

use bytes::Bytes;
use obsmap_types::{CellBounds, Marker, Source};
use serde::de::Error;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

/// One clustered bucket of markers for map display.
///
/// Fully recomputed from a marker set and a resolution; never mutated after
/// construction. `data` preserves marker insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    /// Axis-aligned cell rectangle, exactly one resolution step per side.
    pub bounds: CellBounds,
    /// Number of markers in the cell. Always equals `data.len()`.
    pub count: usize,
    /// Member markers in insertion order.
    pub data: Vec<Marker>,
    /// Dominant display source: sticks to the privileged origin once any
    /// member carries it.
    pub source: Source,
}

impl GridCell {
    /// Create an empty cell seeded with the source of its first marker.
    pub(crate) fn new(bounds: CellBounds, source: Source) -> Self {
        Self {
            bounds,
            count: 0,
            data: Vec::new(),
            source,
        }
    }

    /// Append a marker, updating the count and the sticky source election.
    pub(crate) fn push(&mut self, marker: Marker) {
        if marker.source.is_primary() {
            self.source = marker.source;
        }
        self.data.push(marker);
        self.count += 1;
    }
}

/// Configuration for a tile cache instance.
///
/// Two independent cache instances exist in the production frontend: the
/// grid cache (1 hour TTL) and the region cache (5 minutes TTL). TTL is a
/// per-instance parameter, not a crate-wide constant.
///
/// # Example
///
/// ```rust
/// use obsmap::CacheConfig;
/// use std::time::Duration;
///
/// let config = CacheConfig::new("grids").with_ttl(Duration::from_secs(3600));
///
/// // Load from JSON
/// let json = r#"{ "namespace": "grids", "ttl_seconds": 3600 }"#;
/// let config: CacheConfig = serde_json::from_str(json).unwrap();
/// assert_eq!(config.ttl(), Duration::from_secs(3600));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Name of the object store this cache instance owns.
    pub namespace: String,

    /// Entry time-to-live in seconds. Entries whose age reaches the TTL are
    /// reported as misses.
    #[serde(default = "CacheConfig::default_ttl_seconds")]
    pub ttl_seconds: f64,
}

impl CacheConfig {
    const fn default_ttl_seconds() -> f64 {
        3600.0
    }

    /// Create a configuration with the default one-hour TTL.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ttl_seconds: Self::default_ttl_seconds(),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_seconds = ttl.as_secs_f64();
        self
    }

    /// Get the TTL as a Duration. Falls back to the default when the
    /// configured value is unusable.
    pub fn ttl(&self) -> Duration {
        if self.ttl_seconds.is_finite() && self.ttl_seconds > 0.0 {
            Duration::from_secs_f64(self.ttl_seconds)
        } else {
            Duration::from_secs_f64(Self::default_ttl_seconds())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.namespace.is_empty() {
            return Err("Cache namespace cannot be empty".to_string());
        }
        if !self.ttl_seconds.is_finite() {
            return Err("TTL must be finite (not NaN or infinity)".to_string());
        }
        if self.ttl_seconds <= 0.0 {
            return Err("TTL must be positive".to_string());
        }
        Ok(())
    }

    /// Load configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: CacheConfig = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// A stored cache entry: opaque payload plus its write instant.
///
/// Expiry is lazy. The record keeps its write timestamp and the cache
/// decides staleness at read time against its own TTL; expired records
/// stay in storage until an explicit purge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Serialized grid cells.
    pub payload: Bytes,
    /// Instant the record was written.
    pub timestamp: SystemTime,
}

impl CacheRecord {
    /// Create a record stamped with the current time.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self::written_at(payload, SystemTime::now())
    }

    /// Create a record with an explicit write instant.
    pub fn written_at(payload: impl Into<Bytes>, timestamp: SystemTime) -> Self {
        Self {
            payload: payload.into(),
            timestamp,
        }
    }

    /// Whether the record has reached the given TTL at `now`.
    /// Age exactly equal to the TTL counts as expired.
    pub fn is_expired_at(&self, now: SystemTime, ttl: Duration) -> bool {
        match now.duration_since(self.timestamp) {
            Ok(age) => age >= ttl,
            // Clock went backwards; treat the record as fresh.
            Err(_) => false,
        }
    }
}

/// Counters exposed by a cache instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of records currently in the store, expired or not.
    pub record_count: usize,
    /// Lookups answered from storage.
    pub hits: u64,
    /// Lookups that found nothing, or only an expired record.
    pub misses: u64,
    /// Records removed by purge operations.
    pub purged: u64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_purged(&mut self, count: u64) {
        self.purged += count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_config_default_ttl() {
        let config = CacheConfig::new("grids");
        assert_eq!(config.ttl(), Duration::from_secs(3600));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cache_config_with_ttl() {
        let config = CacheConfig::new("regions").with_ttl(Duration::from_millis(300_000));
        assert_eq!(config.ttl(), Duration::from_secs(300));
    }

    #[test]
    fn test_cache_config_validation() {
        let mut config = CacheConfig::new("grids");
        assert!(config.validate().is_ok());

        config.ttl_seconds = -1.0;
        assert!(config.validate().is_err());

        config.ttl_seconds = f64::NAN;
        assert!(config.validate().is_err());

        config.ttl_seconds = 60.0;
        config.namespace.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cache_config_json_roundtrip() {
        let config = CacheConfig::new("grids").with_ttl(Duration::from_secs(300));
        let json = config.to_json().unwrap();
        let back = CacheConfig::from_json(&json).unwrap();
        assert_eq!(back.namespace, "grids");
        assert_eq!(back.ttl(), Duration::from_secs(300));
    }

    #[test]
    fn test_cache_config_rejects_bad_json() {
        let json = r#"{ "namespace": "grids", "ttl_seconds": 0 }"#;
        assert!(CacheConfig::from_json(json).is_err());
    }

    #[test]
    fn test_record_expiry_boundary() {
        let wrote = SystemTime::now();
        let record = CacheRecord::written_at(vec![1u8, 2, 3], wrote);
        let ttl = Duration::from_secs(60);

        assert!(!record.is_expired_at(wrote + Duration::from_secs(59), ttl));
        // Age == TTL counts as expired.
        assert!(record.is_expired_at(wrote + ttl, ttl));
        assert!(record.is_expired_at(wrote + Duration::from_secs(61), ttl));
    }

    #[test]
    fn test_record_clock_skew() {
        let record = CacheRecord::new(vec![0u8]);
        let earlier = record.timestamp - Duration::from_secs(10);
        assert!(!record.is_expired_at(earlier, Duration::from_secs(1)));
    }

    #[test]
    fn test_cache_stats() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_miss();
        stats.record_miss();
        stats.record_purged(3);

        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.purged, 3);
    }
}
