use geo::Rect;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounds of a single grid cell.
///
/// Serialized as `[[south, west], [north, east]]` to match the grid payload
/// shape the map widget consumes.
///
/// # Examples
///
/// ```
/// use obsmap_types::CellBounds;
///
/// let bounds = CellBounds::anchored(-6.2, 106.8, 0.2);
/// assert!((bounds.north - -6.0).abs() < 1e-9);
/// assert!((bounds.east - 107.0).abs() < 1e-9);
///
/// let json = serde_json::to_string(&bounds).unwrap();
/// assert!(json.starts_with("[[")); // nested-array wire shape
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[[f64; 2]; 2]", into = "[[f64; 2]; 2]")]
pub struct CellBounds {
    /// Southern edge latitude.
    pub south: f64,
    /// Western edge longitude.
    pub west: f64,
    /// Northern edge latitude.
    pub north: f64,
    /// Eastern edge longitude.
    pub east: f64,
}

impl CellBounds {
    /// Create bounds for a cell anchored at the given grid origin, spanning
    /// `resolution` degrees on each side.
    pub fn anchored(south: f64, west: f64, resolution: f64) -> Self {
        Self {
            south,
            west,
            north: south + resolution,
            east: west + resolution,
        }
    }

    /// Whether all four edges are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.south.is_finite()
            && self.west.is_finite()
            && self.north.is_finite()
            && self.east.is_finite()
    }

    /// Cell height in degrees of latitude.
    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Cell width in degrees of longitude.
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    /// Convert to a `geo` rectangle (x = longitude, y = latitude).
    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            geo::coord! { x: self.west, y: self.south },
            geo::coord! { x: self.east, y: self.north },
        )
    }
}

impl From<[[f64; 2]; 2]> for CellBounds {
    fn from(corners: [[f64; 2]; 2]) -> Self {
        let [[south, west], [north, east]] = corners;
        Self {
            south,
            west,
            north,
            east,
        }
    }
}

impl From<CellBounds> for [[f64; 2]; 2] {
    fn from(bounds: CellBounds) -> Self {
        [[bounds.south, bounds.west], [bounds.north, bounds.east]]
    }
}

/// The visible map window, supplied by the map widget on every move or
/// zoom event. Transient; never stored.
///
/// # Examples
///
/// ```
/// use obsmap_types::Viewport;
///
/// let viewport = Viewport::new(-7.0, -6.0, 106.0, 107.0, 13.0);
/// assert!(viewport.contains(-6.5, 106.5));
/// assert!(viewport.contains(-7.0, 106.0)); // edges are inclusive
/// assert!(!viewport.contains(-5.9, 106.5));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
    /// Map zoom level (Leaflet-style, may be fractional).
    pub zoom: f64,
}

impl Viewport {
    pub fn new(min_lat: f64, max_lat: f64, min_lng: f64, max_lng: f64, zoom: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
            zoom,
        }
    }

    /// Inclusive bounding-box membership test. Non-finite coordinates
    /// never match.
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        latitude >= self.min_lat
            && latitude <= self.max_lat
            && longitude >= self.min_lng
            && longitude <= self.max_lng
    }

    /// Convert to a `geo` rectangle (x = longitude, y = latitude).
    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            geo::coord! { x: self.min_lng, y: self.min_lat },
            geo::coord! { x: self.max_lng, y: self.max_lat },
        )
    }
}
