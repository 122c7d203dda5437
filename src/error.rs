//! Error types for obsmap.
//!
//! A cache miss is never an error: `TileCache::get` returns `Ok(None)` for
//! absent or expired entries. Errors are reserved for storage failures,
//! structurally invalid input, and a torn-down worker channel.

use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, ObsMapError>;

/// Errors produced by the clustering and caching core.
#[derive(Debug, Error)]
pub enum ObsMapError {
    /// Structurally invalid input, e.g. a non-positive grid resolution.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The underlying tile store rejected an operation.
    #[error("storage error: {0}")]
    Storage(String),

    /// Operation attempted on a store that has been closed.
    #[error("tile store is closed")]
    StoreClosed,

    /// Cache payload could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O failure from a persistent store backend.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The grid worker thread has shut down or panicked.
    #[error("grid worker disconnected")]
    WorkerDisconnected,
}
