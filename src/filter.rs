//! Viewport visibility filtering for individual markers.
//!
//! Individual markers are only rendered at high zoom; below
//! [`MIN_MARKER_ZOOM`] the map shows grid clusters instead and this filter
//! returns nothing. The filter is a stateless total function invoked on
//! every map move/zoom event; the host owns debouncing and cancellation.

use obsmap_types::{Marker, Viewport};

/// Minimum zoom level at which individual markers are displayed.
/// Below this the map renders grid cells only. Fixed display policy.
pub const MIN_MARKER_ZOOM: f64 = 12.0;

/// Markers eligible for individual display in the given viewport.
///
/// Empty whenever `viewport.zoom < MIN_MARKER_ZOOM`. Otherwise returns the
/// subsequence of markers inside the viewport's inclusive bounding box, in
/// input order. Markers with non-finite coordinates never match; malformed
/// input is excluded, never an error.
///
/// # Examples
///
/// ```
/// use obsmap::filter::filter_visible;
/// use obsmap_types::{Marker, Source, Viewport};
///
/// let markers = vec![
///     Marker::new(1, Source::Fobi, -6.5, 106.5),
///     Marker::new(2, Source::Fobi, -5.0, 106.5),
/// ];
///
/// let viewport = Viewport::new(-7.0, -6.0, 106.0, 107.0, 13.0);
/// let visible = filter_visible(&viewport, &markers);
/// assert_eq!(visible.len(), 1);
/// assert_eq!(visible[0].id, 1);
///
/// // Below the zoom gate nothing is shown, in-box or not.
/// let zoomed_out = Viewport::new(-7.0, -6.0, 106.0, 107.0, 8.0);
/// assert!(filter_visible(&zoomed_out, &markers).is_empty());
/// ```
pub fn filter_visible(viewport: &Viewport, markers: &[Marker]) -> Vec<Marker> {
    if viewport.zoom < MIN_MARKER_ZOOM {
        return Vec::new();
    }

    markers
        .iter()
        .filter(|marker| viewport.contains(marker.latitude, marker.longitude))
        .cloned()
        .collect()
}
