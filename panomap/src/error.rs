//! Run-level error taxonomy.
//!
//! Only errors that terminate a whole run live here. Per-tile problems
//! (an empty readback, a wedged fence) are absorbed inside the sequencer:
//! the tile is logged and skipped, the run continues. The exception is
//! every tile failing, which surfaces as [`CaptureError::NoTileData`].

use crate::persist::PersistError;
use thiserror::Error;

/// Terminal failure of a capture run.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The settings cannot produce a capturable grid (overlap >= tile
    /// resolution, zero output dimensions, degenerate bounds). Detected
    /// before any renderer resource is touched.
    #[error("invalid capture grid: {0}")]
    InvalidGrid(String),

    /// Every tile failed to capture; there is nothing to stitch.
    #[error("no tile data was captured")]
    NoTileData,

    /// Compositing succeeded but the image could not be written. Reported
    /// distinctly so callers can tell "nothing to show" from "had an
    /// image, couldn't save it".
    #[error("failed to save output image: {0}")]
    Persistence(#[from] PersistError),

    /// The host aborted the run. A distinct outcome, not a defect.
    #[error("capture run cancelled")]
    Cancelled,

    /// A background task died underneath the orchestrator.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CaptureError {
    /// Returns true for the cancellation outcome, which callers usually
    /// report differently from real failures.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CaptureError::Cancelled)
    }
}
