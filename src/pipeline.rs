//! Cache-backed grid computation.
//!
//! `GridPipeline` wires the tile cache and the bucketing function into the
//! flow the map frontend runs on every viewport settle: consult the cache,
//! on a miss compute the grid and store it, hand the cells to the widget.

use crate::cache::TileCache;
use crate::error::Result;
use crate::grid;
use crate::storage::TileStore;
use crate::types::GridCell;
use log::warn;
use obsmap_types::Marker;

/// Cache-fronted grid bucketing.
///
/// A failed cache *read* degrades to recomputation (the frontend treats a
/// broken browser store as a miss); a failed cache *write* or an invalid
/// input is surfaced to the caller.
///
/// # Examples
///
/// ```rust
/// use obsmap::{CacheConfig, GridPipeline, MemoryStore, TileCache, GRID_TTL};
/// use obsmap_types::{Marker, Source};
///
/// let cache = TileCache::open(
///     MemoryStore::new(),
///     CacheConfig::new("grids").with_ttl(GRID_TTL),
/// )?;
/// let pipeline = GridPipeline::new(cache);
///
/// let markers = vec![Marker::new(1, Source::Fobi, -6.2, 106.8)];
/// let cells = pipeline.cells(&markers, 0.2)?;     // computed
/// let cached = pipeline.cells(&markers, 0.2)?;    // served from cache
/// assert_eq!(cells, cached);
/// # Ok::<(), obsmap::ObsMapError>(())
/// ```
pub struct GridPipeline<S: TileStore> {
    cache: TileCache<S>,
}

impl<S: TileStore> GridPipeline<S> {
    pub fn new(cache: TileCache<S>) -> Self {
        Self { cache }
    }

    /// Grid cells for a marker set at a resolution, from cache when fresh.
    pub fn cells(&self, markers: &[Marker], resolution: f64) -> Result<Vec<GridCell>> {
        match self.cache.get(markers, resolution) {
            Ok(Some(cells)) => return Ok(cells),
            Ok(None) => {}
            Err(e) => warn!("cache read failed, recomputing grid: {}", e),
        }

        let cells = grid::bucket(markers, resolution)?;
        self.cache.put(markers, resolution, &cells)?;
        Ok(cells)
    }

    /// The cache instance backing this pipeline.
    pub fn cache(&self) -> &TileCache<S> {
        &self.cache
    }

    /// Tear down the pipeline, closing the cache's store.
    pub fn close(self) -> Result<()> {
        self.cache.close()
    }
}
