use geo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::SystemTime;

/// Data-origin tag for an observation record.
///
/// The upstream API aggregates observations from several citizen-science
/// platforms. `Fobi` is the primary origin: once a grid cell contains any
/// FOBI marker its display source sticks to `Fobi` regardless of what else
/// lands in the cell.
///
/// # Examples
///
/// ```
/// use obsmap_types::Source;
///
/// assert!(Source::Fobi.is_primary());
/// assert!(!Source::Burungnesia.is_primary());
/// assert_eq!(Source::Kupunesia.as_str(), "kupunesia");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// FOBI observations, the platform's own records (privileged origin).
    Fobi,
    /// Bird observations imported from Burungnesia.
    Burungnesia,
    /// Butterfly observations imported from Kupunesia.
    Kupunesia,
    /// Records attached to taxonomy pages.
    Taxa,
}

impl Source {
    /// Whether this is the privileged origin that wins the sticky
    /// per-cell source election.
    pub fn is_primary(&self) -> bool {
        matches!(self, Source::Fobi)
    }

    /// The lowercase wire representation of the tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Fobi => "fobi",
            Source::Burungnesia => "burungnesia",
            Source::Kupunesia => "kupunesia",
            Source::Taxa => "taxa",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single geo-tagged observation record used for map display.
///
/// Markers arrive from the REST API and are immutable once received.
/// Identity is the `(id, source)` pair; ids are only unique within one
/// origin platform.
///
/// # Examples
///
/// ```
/// use obsmap_types::{Marker, Source};
///
/// let marker = Marker::new(1, Source::Burungnesia, -6.21, 106.81);
/// assert_eq!(marker.checklist(), 1);
/// assert_eq!(marker.identity(), (1, Source::Burungnesia));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// Record id, unique per origin platform.
    pub id: u64,
    /// Owning checklist, when the API provides one.
    #[serde(default)]
    pub checklist_id: Option<u64>,
    /// Data-origin tag.
    pub source: Source,
    /// Latitude in degrees, positive north.
    pub latitude: f64,
    /// Longitude in degrees, positive east.
    pub longitude: f64,
    /// Observation creation time, when the API provides one.
    #[serde(default)]
    pub created_at: Option<SystemTime>,
}

impl Marker {
    /// Create a marker with no checklist or timestamp attached.
    pub fn new(id: u64, source: Source, latitude: f64, longitude: f64) -> Self {
        Self {
            id,
            checklist_id: None,
            source,
            latitude,
            longitude,
            created_at: None,
        }
    }

    /// Attach an owning checklist id.
    pub fn with_checklist(mut self, checklist_id: u64) -> Self {
        self.checklist_id = Some(checklist_id);
        self
    }

    /// Attach the observation creation time.
    pub fn with_created_at(mut self, created_at: SystemTime) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// The marker's identity pair. Two markers are the same record iff
    /// their identities are equal.
    pub fn identity(&self) -> (u64, Source) {
        (self.id, self.source)
    }

    /// Effective checklist id: falls back to the record id when the API
    /// omitted the checklist.
    pub fn checklist(&self) -> u64 {
        self.checklist_id.unwrap_or(self.id)
    }

    /// The marker's position as a `geo` point (x = longitude, y = latitude).
    pub fn point(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }

    /// Whether both coordinates are finite and inside the valid geographic
    /// range (lat in [-90, 90], lng in [-180, 180]).
    pub fn has_valid_position(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}
