//! # obsmap-types
//!
//! Core data types for the obsmap marker clustering core.
//!
//! This crate provides the primitive types shared between the clustering
//! pipeline and its host application:
//!
//! - **Marker types**: `Marker`, `Source`
//! - **Geometry types**: `CellBounds`, `Viewport`
//!
//! All types are serializable with Serde and interoperate with the `geo`
//! crate's geometric primitives.
//!
//! ## Examples
//!
//! ```rust
//! use obsmap_types::{Marker, Source};
//!
//! let marker = Marker::new(42, Source::Fobi, -6.20, 106.80);
//! assert!(marker.has_valid_position());
//! ```

pub mod geometry;
pub mod marker;

pub use geometry::{CellBounds, Viewport};
pub use marker::{Marker, Source};
