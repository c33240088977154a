//! One-call capture orchestration.
//!
//! Glues the pipeline together for a whole run:
//!
//! ```text
//! validate ──► plan grid ──► sequence tiles ──► stitch ──► save
//! ```
//!
//! All run state lives in a [`RunState`] value owned by this call, so any
//! number of runs can execute independently. The progress sink hears
//! about every stored tile and exactly one completion event; the
//! cancellation token aborts between suspension points with renderer
//! resources released.

use crate::capture::{CaptureDevice, CaptureSequencer, ContentGate, SequencerConfig};
use crate::error::CaptureError;
use crate::grid::Grid;
use crate::persist::{self, ImageSink};
use crate::progress::ProgressSink;
use crate::settings::CaptureSettings;
use crate::state::{FailureReason, RunPhase, RunState};
use crate::stitch;
use image::RgbaImage;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

/// What a successful run produced.
#[derive(Debug)]
pub struct RunReport {
    /// Where the image was written.
    pub output_path: PathBuf,
    /// Tiles that captured successfully (1 for the untiled path).
    pub tiles_captured: usize,
    /// Tiles that failed and were skipped.
    pub tiles_skipped: usize,
    /// Wall-clock duration of the whole run.
    pub duration: Duration,
    /// Final run state, including the full phase history.
    pub state: RunState,
}

/// Runs a complete capture with default sequencer timing.
///
/// See [`run_capture_with_config`].
pub async fn run_capture<D, G, S>(
    settings: &CaptureSettings,
    device: D,
    gate: G,
    sink: S,
    progress: &dyn ProgressSink,
    cancel: CancellationToken,
) -> Result<RunReport, CaptureError>
where
    D: CaptureDevice,
    G: ContentGate,
    S: ImageSink,
{
    run_capture_with_config(
        settings,
        device,
        gate,
        sink,
        SequencerConfig::default(),
        progress,
        cancel,
    )
    .await
}

/// Runs a complete capture: tiled grid pipeline or, when tiling is
/// disabled, a single full-resolution capture.
///
/// The progress sink's `on_complete` fires exactly once, on every exit
/// path. Per-tile failures do not fail the run; see [`CaptureError`] for
/// the conditions that do.
#[instrument(skip_all, fields(output_width = settings.output_width, output_height = settings.output_height, tiled = settings.use_tiling))]
pub async fn run_capture_with_config<D, G, S>(
    settings: &CaptureSettings,
    device: D,
    gate: G,
    sink: S,
    config: SequencerConfig,
    progress: &dyn ProgressSink,
    cancel: CancellationToken,
) -> Result<RunReport, CaptureError>
where
    D: CaptureDevice,
    G: ContentGate,
    S: ImageSink,
{
    let result = drive(settings, device, gate, sink, config, progress, cancel).await;

    match &result {
        Ok(report) => progress.on_complete(true, Some(&report.output_path)),
        Err(err) => {
            if err.is_cancelled() {
                info!("capture run ended by cancellation");
            } else {
                error!(error = %err, "capture run failed");
            }
            progress.on_complete(false, None);
        }
    }

    result
}

async fn drive<D, G, S>(
    settings: &CaptureSettings,
    device: D,
    gate: G,
    sink: S,
    config: SequencerConfig,
    progress: &dyn ProgressSink,
    cancel: CancellationToken,
) -> Result<RunReport, CaptureError>
where
    D: CaptureDevice,
    G: ContentGate,
    S: ImageSink,
{
    let start = Instant::now();
    let mut state = RunState::new();

    state.advance(RunPhase::Planning);
    if let Err(reason) = settings.validate() {
        state.advance(RunPhase::Failed(FailureReason::InvalidGrid));
        return Err(CaptureError::InvalidGrid(reason));
    }

    let mut sequencer = CaptureSequencer::with_config(device, gate, config);

    let (image, captured, skipped, total) = if settings.use_tiling {
        let grid = Grid::plan(
            settings.output_width,
            settings.output_height,
            settings.tile_resolution,
            settings.tile_overlap,
        );
        if grid.is_empty() {
            state.advance(RunPhase::Failed(FailureReason::InvalidGrid));
            return Err(CaptureError::InvalidGrid(format!(
                "computed an empty grid for tile resolution {} with overlap {}",
                settings.tile_resolution, settings.tile_overlap
            )));
        }

        let outcome = sequencer
            .run(settings, &grid, &mut state, progress, &cancel)
            .await?;
        let captured = outcome.store.len();
        let skipped = outcome.failures.len();
        if outcome.store.is_empty() {
            state.advance(RunPhase::Failed(FailureReason::NoTileData));
            return Err(CaptureError::NoTileData);
        }

        state.advance(RunPhase::Stitching);
        let image = stitch_blocking(outcome.store, grid, settings.clone()).await?;
        (image, captured, skipped, grid.tile_count())
    } else {
        let image = sequencer.run_single(settings, &mut state, &cancel).await?;
        progress.on_progress("Captured full-resolution image", 1.0, 1, 1);
        (image, 1, 0, 1)
    };

    state.advance(RunPhase::Saving);
    let output_path = persist::output_path(settings, &sink);
    if let Err(err) = sink.encode_and_save(&image, &output_path) {
        state.advance(RunPhase::Failed(FailureReason::Persistence));
        return Err(CaptureError::Persistence(err));
    }

    state.advance(RunPhase::Done);
    progress.on_progress("Completed! Image saved.", 1.0, total, total);
    info!(
        path = %output_path.display(),
        captured,
        skipped,
        elapsed_ms = start.elapsed().as_millis(),
        "capture run complete"
    );

    Ok(RunReport {
        output_path,
        tiles_captured: captured,
        tiles_skipped: skipped,
        duration: start.elapsed(),
        state,
    })
}

/// Runs the CPU-heavy composite off the async runtime.
async fn stitch_blocking(
    store: crate::store::TileStore,
    grid: Grid,
    settings: CaptureSettings,
) -> Result<RgbaImage, CaptureError> {
    tokio::task::spawn_blocking(move || stitch::stitch(store, &grid, &settings))
        .await
        .map_err(|e| CaptureError::Internal(format!("stitch task failed: {}", e)))
}
