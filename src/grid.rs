//! Grid bucketing for marker clustering.
//!
//! This module partitions geo-tagged markers into fixed-size grid cells
//! aligned to a global grid anchored at (0, 0). Bucketing is a pure
//! function: no shared state, deterministic modulo output ordering, safe to
//! run concurrently with different inputs. The `worker` module runs it off
//! the host thread.

use crate::error::{ObsMapError, Result};
use crate::types::GridCell;
use geo::Point;
use obsmap_types::{CellBounds, Marker};
use rustc_hash::FxHashMap;

/// Mean Earth radius in kilometers used by the haversine helper.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Grid resolutions used by the map frontend, keyed to zoom bands.
///
/// # Examples
///
/// ```
/// use obsmap::grid::GridScale;
///
/// assert_eq!(GridScale::for_zoom(13.0), GridScale::Small);
/// assert_eq!(GridScale::for_zoom(4.0).degrees(), 0.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridScale {
    /// 0.5 degree cells, zoom below 6.
    ExtraLarge,
    /// 0.2 degree cells, zoom 6 to 8.
    Large,
    /// 0.05 degree cells, zoom 9 to 11.
    Medium,
    /// 0.02 degree cells, zoom 12 and above.
    Small,
}

impl GridScale {
    /// Cell edge length in degrees.
    pub fn degrees(&self) -> f64 {
        match self {
            GridScale::ExtraLarge => 0.5,
            GridScale::Large => 0.2,
            GridScale::Medium => 0.05,
            GridScale::Small => 0.02,
        }
    }

    /// The scale the frontend displays at a given zoom level.
    pub fn for_zoom(zoom: f64) -> Self {
        if zoom >= 12.0 {
            GridScale::Small
        } else if zoom >= 9.0 {
            GridScale::Medium
        } else if zoom >= 6.0 {
            GridScale::Large
        } else {
            GridScale::ExtraLarge
        }
    }
}

/// Great-circle distance between two points in kilometers, by the standard
/// haversine formula on a spherical Earth of radius [`EARTH_RADIUS_KM`].
///
/// Not used by bucketing itself; exported for radius-based filtering so all
/// consumers share one distance definition. Points are (x = longitude,
/// y = latitude).
///
/// # Examples
///
/// ```
/// use geo::Point;
/// use obsmap::grid::distance_km;
///
/// let jakarta = Point::new(106.8456, -6.2088);
/// let surabaya = Point::new(112.7521, -7.2575);
/// let d = distance_km(&jakarta, &surabaya);
/// assert!(d > 650.0 && d < 680.0);
/// ```
pub fn distance_km(a: &Point<f64>, b: &Point<f64>) -> f64 {
    let d_lat = (b.y() - a.y()).to_radians();
    let d_lng = (b.x() - a.x()).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.y().to_radians().cos() * b.y().to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Partition markers into grid cells of `resolution` degrees per side.
///
/// Markers with non-finite or out-of-range coordinates are silently
/// dropped; they contribute to no cell. Each surviving marker lands in the
/// cell anchored at `(floor(lat / resolution) * resolution,
/// floor(lng / resolution) * resolution)`. A cell's source tag starts as
/// its first marker's and sticks to the privileged origin once any member
/// carries it.
///
/// Output ordering is unspecified; callers must not depend on it.
///
/// # Errors
///
/// `InvalidInput` when `resolution` is not a finite positive number. Bad
/// individual markers never raise.
///
/// # Examples
///
/// ```
/// use obsmap::grid::bucket;
/// use obsmap_types::{Marker, Source};
///
/// let markers = vec![
///     Marker::new(1, Source::Fobi, -6.20, 106.80),
///     Marker::new(2, Source::Burungnesia, -6.19, 106.81),
/// ];
///
/// let cells = bucket(&markers, 0.2)?;
/// assert_eq!(cells.len(), 1);
/// assert_eq!(cells[0].count, 2);
/// assert_eq!(cells[0].source, Source::Fobi);
/// # Ok::<(), obsmap::ObsMapError>(())
/// ```
pub fn bucket(markers: &[Marker], resolution: f64) -> Result<Vec<GridCell>> {
    if !resolution.is_finite() || resolution <= 0.0 {
        return Err(ObsMapError::InvalidInput(format!(
            "grid resolution must be a finite positive number, got {}",
            resolution
        )));
    }

    let mut grid: FxHashMap<String, GridCell> = FxHashMap::default();

    for marker in markers {
        if !marker.has_valid_position() {
            continue;
        }

        let lat_key = (marker.latitude / resolution).floor() * resolution;
        let lng_key = (marker.longitude / resolution).floor() * resolution;
        let grid_key = format!("{}_{}", lat_key, lng_key);

        let cell = grid.entry(grid_key).or_insert_with(|| {
            GridCell::new(CellBounds::anchored(lat_key, lng_key, resolution), marker.source)
        });
        cell.push(marker.clone());
    }

    // A cell with a non-finite edge would break the map widget.
    Ok(grid
        .into_values()
        .filter(|cell| cell.bounds.is_finite())
        .collect())
}
