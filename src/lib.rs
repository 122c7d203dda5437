//! Marker clustering and grid-tile caching core for biodiversity
//! observation maps.
//!
//! ```rust
//! use obsmap::{CacheConfig, GridPipeline, MemoryStore, TileCache, GRID_TTL};
//! use obsmap::filter::filter_visible;
//! use obsmap_types::{Marker, Source, Viewport};
//!
//! let markers = vec![
//!     Marker::new(1, Source::Fobi, -6.20, 106.80),
//!     Marker::new(2, Source::Burungnesia, -6.19, 106.81),
//! ];
//!
//! // Cluster markers into grid cells, cached per marker set + resolution.
//! let cache = TileCache::open(
//!     MemoryStore::new(),
//!     CacheConfig::new("grids").with_ttl(GRID_TTL),
//! )?;
//! let pipeline = GridPipeline::new(cache);
//! let cells = pipeline.cells(&markers, 0.2)?;
//! assert_eq!(cells[0].count, 2);
//!
//! // Gate individual markers on the current viewport.
//! let viewport = Viewport::new(-7.0, -6.0, 106.0, 107.0, 13.0);
//! let visible = filter_visible(&viewport, &markers);
//! assert_eq!(visible.len(), 2);
//! # Ok::<(), obsmap::ObsMapError>(())
//! ```

pub mod cache;
pub mod error;
pub mod filter;
pub mod grid;
pub mod pipeline;
pub mod storage;
pub mod types;
pub mod worker;

pub use error::{ObsMapError, Result};

pub use cache::{TileCache, cache_key, GRID_TTL, REGION_TTL};

pub use grid::{GridScale, bucket, distance_km, EARTH_RADIUS_KM};

pub use filter::{MIN_MARKER_ZOOM, filter_visible};

pub use pipeline::GridPipeline;

pub use storage::{MemoryStore, TileStore};

#[cfg(feature = "persist")]
pub use storage::FileStore;

pub use types::{CacheConfig, CacheRecord, CacheStats, GridCell};

pub use worker::{GridRequest, GridResponse, GridWorker, RequestId};

pub use obsmap_types::{CellBounds, Marker, Source, Viewport};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{ObsMapError, Result};

    pub use crate::{GridPipeline, TileCache, GRID_TTL, REGION_TTL};

    pub use crate::grid::{GridScale, bucket, distance_km};

    pub use crate::filter::{MIN_MARKER_ZOOM, filter_visible};

    pub use crate::{CacheConfig, GridCell};

    pub use crate::{MemoryStore, TileStore};

    #[cfg(feature = "persist")]
    pub use crate::FileStore;

    pub use crate::worker::GridWorker;

    pub use obsmap_types::{Marker, Source, Viewport};

    pub use std::time::Duration;
}
