//! Off-thread grid computation.
//!
//! Bucketing large marker sets must not block the host's interactive
//! rendering, so a `GridWorker` owns a dedicated thread and an explicit
//! request/response channel. Every request carries an identifier and every
//! response echoes it back, so callers may pipeline requests or abandon a
//! stale one in favor of newer input without misattributing replies.
//!
//! Structural input errors (e.g. a non-positive resolution) travel back
//! through the channel as a failed response; they never panic the worker
//! or the caller's thread.
//!
//! # Examples
//!
//! ```rust
//! use obsmap::worker::GridWorker;
//! use obsmap_types::{Marker, Source};
//!
//! let worker = GridWorker::spawn()?;
//! let markers = vec![Marker::new(1, Source::Fobi, -6.2, 106.8)];
//!
//! let cells = worker.call(markers, 0.2)?;
//! assert_eq!(cells.len(), 1);
//! # Ok::<(), obsmap::ObsMapError>(())
//! ```

use crate::error::{ObsMapError, Result};
use crate::grid;
use crate::types::GridCell;
use log::debug;
use obsmap_types::Marker;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;
use uuid::Uuid;

/// Identifier correlating a request with its response.
pub type RequestId = Uuid;

/// A bucketing request handed to the worker thread.
#[derive(Debug)]
pub struct GridRequest {
    pub id: RequestId,
    pub markers: Vec<Marker>,
    pub resolution: f64,
}

/// The worker's reply to a single request.
#[derive(Debug)]
pub struct GridResponse {
    /// Identifier of the request this reply answers.
    pub id: RequestId,
    /// Computed cells, or the computation error.
    pub result: Result<Vec<GridCell>>,
}

/// Handle to a background bucketing thread.
///
/// Requests are processed in submission order. Dropping the handle closes
/// the request channel and joins the thread.
pub struct GridWorker {
    requests: Option<Sender<GridRequest>>,
    responses: Receiver<GridResponse>,
    handle: Option<JoinHandle<()>>,
}

impl GridWorker {
    /// Spawn the worker thread.
    pub fn spawn() -> Result<Self> {
        let (req_tx, req_rx) = mpsc::channel::<GridRequest>();
        let (resp_tx, resp_rx) = mpsc::channel::<GridResponse>();

        let handle = std::thread::Builder::new()
            .name("obsmap-grid-worker".to_string())
            .spawn(move || {
                debug!("grid worker started");
                while let Ok(request) = req_rx.recv() {
                    let result = grid::bucket(&request.markers, request.resolution);
                    let response = GridResponse {
                        id: request.id,
                        result,
                    };
                    if resp_tx.send(response).is_err() {
                        // Host dropped its receiver; nothing left to serve.
                        break;
                    }
                }
                debug!("grid worker stopped");
            })?;

        Ok(Self {
            requests: Some(req_tx),
            responses: resp_rx,
            handle: Some(handle),
        })
    }

    /// Queue a bucketing request and return its identifier.
    ///
    /// Multiple requests may be in flight; replies arrive in submission
    /// order, each tagged with the id returned here.
    pub fn submit(&self, markers: Vec<Marker>, resolution: f64) -> Result<RequestId> {
        let id = Uuid::new_v4();
        let sender = self.requests.as_ref().ok_or(ObsMapError::WorkerDisconnected)?;
        sender
            .send(GridRequest {
                id,
                markers,
                resolution,
            })
            .map_err(|_| ObsMapError::WorkerDisconnected)?;
        Ok(id)
    }

    /// Block until the next response arrives.
    pub fn recv(&self) -> Result<GridResponse> {
        self.responses
            .recv()
            .map_err(|_| ObsMapError::WorkerDisconnected)
    }

    /// Submit a request and block until its matching response arrives.
    ///
    /// Replies to earlier requests still in the channel are discarded:
    /// a newer submission supersedes them and their partial results are
    /// never surfaced.
    pub fn call(&self, markers: Vec<Marker>, resolution: f64) -> Result<Vec<GridCell>> {
        let id = self.submit(markers, resolution)?;
        loop {
            let response = self.recv()?;
            if response.id == id {
                return response.result;
            }
            debug!("discarding superseded grid response id={}", response.id);
        }
    }
}

impl Drop for GridWorker {
    fn drop(&mut self) {
        // Closing the request channel ends the worker loop.
        self.requests.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
