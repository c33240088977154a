//! The capture sequencer: one tile at a time, fence by fence.
//!
//! ```text
//! for each tile (row-major):
//!     readiness gate ──► begin_capture ──► render fence ──► begin_readback
//!         ──► readback fence ──► take_pixels ──► TileStore
//! ```
//!
//! Tiles are strictly sequential; the renderer's camera and render target
//! are a single shared pair repositioned per tile, so nothing overlaps.
//! Each wait suspends on a bounded polling loop (no busy-wait, no engine
//! blocking) and every wait carries a timeout so a wedged renderer cannot
//! hang the run.
//!
//! A tile that fails (device error, fence timeout, empty readback) is
//! logged and skipped; the run continues with the remaining tiles. The
//! caller decides what an entirely empty result means. Cancellation is
//! checked at every suspension point and tears down renderer resources
//! before returning.

use crate::capture::device::{CameraPlacement, CaptureDevice, ContentGate};
use crate::error::CaptureError;
use crate::grid::{self, Grid, TileCoord};
use crate::progress::ProgressSink;
use crate::settings::CaptureSettings;
use crate::state::{FailureReason, RunPhase, RunState};
use crate::store::{TileBuffer, TileStore};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Ratio of tile world size used as the content-readiness radius.
const READINESS_RADIUS_RATIO: f64 = 0.7;

/// Timing knobs for the sequencer's suspension points.
#[derive(Debug, Clone)]
pub struct SequencerConfig {
    /// Interval between fence/readiness polls.
    pub poll_interval: Duration,
    /// Maximum wait for world content streaming per tile.
    pub readiness_timeout: Duration,
    /// Maximum wait for the render fence per tile.
    pub render_timeout: Duration,
    /// Maximum wait for the readback fence per tile.
    pub readback_timeout: Duration,
    /// Pause between finishing one tile and issuing the next, giving the
    /// renderer a frame to settle.
    pub settle_delay: Duration,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            readiness_timeout: Duration::from_secs(60),
            render_timeout: Duration::from_secs(10),
            readback_timeout: Duration::from_secs(10),
            settle_delay: Duration::from_millis(100),
        }
    }
}

/// A tile the run gave up on, with the reason it was skipped.
#[derive(Debug, Clone)]
pub struct TileFailure {
    pub coord: TileCoord,
    pub reason: String,
}

/// Result of sequencing a full grid: the captured tiles and the tiles
/// that were skipped.
#[derive(Debug)]
pub struct SequenceOutcome {
    pub store: TileStore,
    pub failures: Vec<TileFailure>,
}

/// Why a single tile did not produce a buffer.
enum TileError {
    /// Recoverable: skip this tile, keep going.
    Skipped(String),
    /// The host cancelled the run.
    Cancelled,
}

enum PollOutcome {
    Ready,
    TimedOut,
    Cancelled,
}

/// Drives the capture protocol for every tile of a run.
///
/// Owns the renderer and gate collaborators exclusively for the run's
/// duration; no other component touches them until the sequencer is done.
pub struct CaptureSequencer<D: CaptureDevice, G: ContentGate> {
    device: D,
    gate: G,
    config: SequencerConfig,
}

impl<D: CaptureDevice, G: ContentGate> CaptureSequencer<D, G> {
    pub fn new(device: D, gate: G) -> Self {
        Self::with_config(device, gate, SequencerConfig::default())
    }

    pub fn with_config(device: D, gate: G, config: SequencerConfig) -> Self {
        Self {
            device,
            gate,
            config,
        }
    }

    /// Captures every tile of `grid` in row-major order.
    ///
    /// Per-tile failures are absorbed into the outcome's `failures` list.
    /// Progress is reported after every stored tile. On cancellation the
    /// partial store is discarded, renderer resources are released and
    /// `Err(Cancelled)` is returned.
    pub async fn run(
        &mut self,
        settings: &CaptureSettings,
        grid: &Grid,
        state: &mut RunState,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<SequenceOutcome, CaptureError> {
        let total = grid.tile_count();
        let mut store = TileStore::new();
        let mut failures = Vec::new();

        info!(
            tiles_x = grid.num_tiles_x,
            tiles_y = grid.num_tiles_y,
            tile_resolution = grid.tile_resolution,
            tile_overlap = grid.tile_overlap,
            device = self.device.name(),
            "starting tiled capture"
        );

        for (index, coord) in grid.coords().enumerate() {
            if cancel.is_cancelled() {
                return Err(self.cancelled(state));
            }

            state.advance(RunPhase::CapturingTile(index));
            let (center, ortho_width) = grid::tile_world_placement(grid, coord, settings);
            let placement = placement_from(settings, center, ortho_width);

            match self
                .capture_one(
                    index,
                    &placement,
                    grid.tile_resolution,
                    grid.tile_resolution,
                    state,
                    cancel,
                )
                .await
            {
                Ok(buffer) => {
                    store.put(coord, buffer);
                    state.advance(RunPhase::TileReady(index));
                    let captured = store.len();
                    progress.on_progress(
                        &format!("Captured tile {} / {}", captured, total),
                        captured as f32 / total as f32,
                        captured,
                        total,
                    );
                }
                Err(TileError::Skipped(reason)) => {
                    warn!(tile = %coord, reason = %reason, "skipping tile");
                    failures.push(TileFailure { coord, reason });
                }
                Err(TileError::Cancelled) => {
                    return Err(self.cancelled(state));
                }
            }

            let last = index + 1 == total;
            if !last && !self.config.settle_delay.is_zero() {
                tokio::time::sleep(self.config.settle_delay).await;
            }
        }

        self.teardown();
        state.advance(RunPhase::AllTilesCaptured);
        info!(
            captured = store.len(),
            skipped = failures.len(),
            buffer_bytes = store.size_bytes(),
            "tile capture finished"
        );

        Ok(SequenceOutcome { store, failures })
    }

    /// Captures the whole area as one full-resolution image, bypassing
    /// the grid pipeline. Used when tiling is disabled.
    pub async fn run_single(
        &mut self,
        settings: &CaptureSettings,
        state: &mut RunState,
        cancel: &CancellationToken,
    ) -> Result<TileBuffer, CaptureError> {
        let (center, ortho_width) = grid::full_world_placement(settings);
        let placement = placement_from(settings, center, ortho_width);

        info!(
            width = settings.output_width,
            height = settings.output_height,
            device = self.device.name(),
            "starting single full-resolution capture"
        );

        state.advance(RunPhase::CapturingTile(0));
        let result = self
            .capture_one(
                0,
                &placement,
                settings.output_width,
                settings.output_height,
                state,
                cancel,
            )
            .await;

        match result {
            Ok(buffer) => {
                self.teardown();
                state.advance(RunPhase::TileReady(0));
                state.advance(RunPhase::AllTilesCaptured);
                Ok(buffer)
            }
            Err(TileError::Skipped(reason)) => {
                self.teardown();
                warn!(reason = %reason, "single capture produced no image");
                state.advance(RunPhase::Failed(FailureReason::NoTileData));
                Err(CaptureError::NoTileData)
            }
            Err(TileError::Cancelled) => Err(self.cancelled(state)),
        }
    }

    /// Runs the full capture protocol for one image.
    ///
    /// The readiness wait, the render fence and the readback fence are the
    /// run's only suspension points; each is a bounded polling loop.
    async fn capture_one(
        &mut self,
        index: usize,
        placement: &CameraPlacement,
        width: u32,
        height: u32,
        state: &mut RunState,
        cancel: &CancellationToken,
    ) -> Result<TileBuffer, TileError> {
        let radius = READINESS_RADIUS_RATIO * placement.ortho_width;
        self.gate.request_ready(placement.center, radius);

        let gate = &self.gate;
        let outcome = poll_until(
            cancel,
            self.config.poll_interval,
            self.config.readiness_timeout,
            || gate.is_ready(),
        )
        .await;
        match outcome {
            PollOutcome::Ready => {}
            PollOutcome::TimedOut => {
                self.gate.release();
                return Err(TileError::Skipped(format!(
                    "world content not ready within {:?}",
                    self.config.readiness_timeout
                )));
            }
            PollOutcome::Cancelled => return Err(TileError::Cancelled),
        }
        debug!(index, center = %placement.center, "content ready, submitting render");

        let render_token = match self.device.begin_capture(placement, width, height) {
            Ok(token) => token,
            Err(e) => {
                self.gate.release();
                return Err(TileError::Skipped(format!("capture request failed: {}", e)));
            }
        };

        state.advance(RunPhase::AwaitingRenderCompletion(index));
        let device = &mut self.device;
        let outcome = poll_until(
            cancel,
            self.config.poll_interval,
            self.config.render_timeout,
            || device.render_complete(&render_token),
        )
        .await;
        match outcome {
            PollOutcome::Ready => {}
            PollOutcome::TimedOut => {
                self.gate.release();
                return Err(TileError::Skipped(format!(
                    "render fence did not signal within {:?}",
                    self.config.render_timeout
                )));
            }
            PollOutcome::Cancelled => return Err(TileError::Cancelled),
        }

        let readback_token = match self.device.begin_readback(render_token) {
            Ok(token) => token,
            Err(e) => {
                self.gate.release();
                return Err(TileError::Skipped(format!("readback failed to start: {}", e)));
            }
        };

        state.advance(RunPhase::AwaitingReadback(index));
        let device = &mut self.device;
        let outcome = poll_until(
            cancel,
            self.config.poll_interval,
            self.config.readback_timeout,
            || device.readback_complete(&readback_token),
        )
        .await;
        match outcome {
            PollOutcome::Ready => {}
            PollOutcome::TimedOut => {
                self.gate.release();
                return Err(TileError::Skipped(format!(
                    "readback fence did not signal within {:?}",
                    self.config.readback_timeout
                )));
            }
            PollOutcome::Cancelled => return Err(TileError::Cancelled),
        }

        let buffer = match self.device.take_pixels(readback_token) {
            Ok(buffer) => buffer,
            Err(e) => {
                self.gate.release();
                return Err(TileError::Skipped(format!("pixel readback failed: {}", e)));
            }
        };
        self.gate.release();

        if buffer.width() == 0 || buffer.height() == 0 {
            return Err(TileError::Skipped("received empty pixel data".to_string()));
        }
        Ok(buffer)
    }

    /// Terminal cancellation: release renderer resources synchronously,
    /// mark the state, and hand back the error for the caller to return.
    fn cancelled(&mut self, state: &mut RunState) -> CaptureError {
        info!("capture run cancelled, releasing renderer resources");
        self.teardown();
        state.advance(RunPhase::Failed(FailureReason::Cancelled));
        CaptureError::Cancelled
    }

    fn teardown(&mut self) {
        self.device.release();
        self.gate.release();
    }
}

fn placement_from(
    settings: &CaptureSettings,
    center: crate::bounds::WorldPoint,
    ortho_width: f64,
) -> CameraPlacement {
    CameraPlacement {
        center,
        rotation: settings.camera_rotation,
        ortho_width,
        field_of_view: settings.field_of_view,
        orthographic: settings.orthographic,
        quality: settings.quality,
    }
}

/// Polls `condition` every `interval` until it holds, the deadline passes,
/// or the run is cancelled. Suspends between polls; never busy-waits.
async fn poll_until(
    cancel: &CancellationToken,
    interval: Duration,
    timeout: Duration,
    mut condition: impl FnMut() -> bool,
) -> PollOutcome {
    let deadline = Instant::now() + timeout;
    loop {
        if cancel.is_cancelled() {
            return PollOutcome::Cancelled;
        }
        if condition() {
            return PollOutcome::Ready;
        }
        let now = Instant::now();
        if now >= deadline {
            return PollOutcome::TimedOut;
        }
        let wait = interval.min(deadline - now);
        tokio::time::sleep(wait).await;
    }
}
