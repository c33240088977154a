//! End-to-end capture pipeline tests.
//!
//! Drives the full orchestration (grid planning, fence-polled capture,
//! stitching, PNG persistence) against a fake renderer that rasterizes a
//! deterministic gradient from world coordinates. Because the gradient is
//! a pure function of world position, overlapping tile regions agree
//! exactly, and the stitched output must reproduce the gradient across
//! seams; any placement or scale inconsistency shows up as a mismatch.

use image::Rgba;
use panomap::capture::{AlwaysReady, CameraPlacement, CaptureDevice, DeviceError, SequencerConfig};
use panomap::error::CaptureError;
use panomap::orchestrator::run_capture_with_config;
use panomap::persist::PngSink;
use panomap::progress::{ChannelProgress, NullProgress, ProgressEvent, ProgressSink};
use panomap::settings::{Background, CaptureSettings};
use panomap::store::TileBuffer;
use panomap::bounds::{WorldBounds, WorldPoint};
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// World extent of the test area; chosen equal to the output size so the
/// world-to-pixel scale is exactly 1.
const WORLD_SIZE: f64 = 512.0;

/// Fake renderer: colors every pixel from its world position.
///
/// Red ramps west-to-east, green ramps north-to-south. Fences signal on
/// the first poll.
struct GradientRenderer {
    /// Captures to refuse before starting to succeed (0 = none).
    refuse_first: usize,
    captures_seen: usize,
}

impl GradientRenderer {
    fn new() -> Self {
        Self::refusing_first(0)
    }

    fn refusing_first(count: usize) -> Self {
        Self {
            refuse_first: count,
            captures_seen: 0,
        }
    }
}

fn gradient_pixel(world_x: f64, world_y: f64) -> Rgba<u8> {
    let r = ((world_x / WORLD_SIZE).clamp(0.0, 1.0) * 255.0).round() as u8;
    let g = ((world_y / WORLD_SIZE).clamp(0.0, 1.0) * 255.0).round() as u8;
    Rgba([r, g, 128, 255])
}

struct Submitted {
    placement: CameraPlacement,
    width: u32,
    height: u32,
}

impl CaptureDevice for GradientRenderer {
    type RenderToken = Submitted;
    type ReadbackToken = Submitted;

    fn begin_capture(
        &mut self,
        placement: &CameraPlacement,
        width: u32,
        height: u32,
    ) -> Result<Submitted, DeviceError> {
        self.captures_seen += 1;
        if self.captures_seen <= self.refuse_first {
            return Err(DeviceError::new("area not renderable"));
        }
        Ok(Submitted {
            placement: placement.clone(),
            width,
            height,
        })
    }

    fn render_complete(&mut self, _token: &Submitted) -> bool {
        true
    }

    fn begin_readback(&mut self, token: Submitted) -> Result<Submitted, DeviceError> {
        Ok(token)
    }

    fn readback_complete(&mut self, _token: &Submitted) -> bool {
        true
    }

    fn take_pixels(&mut self, token: Submitted) -> Result<TileBuffer, DeviceError> {
        let units_per_pixel = token.placement.ortho_width / token.width as f64;
        let left = token.placement.center.x - token.placement.ortho_width / 2.0;
        let world_height = units_per_pixel * token.height as f64;
        let top = token.placement.center.y - world_height / 2.0;

        Ok(TileBuffer::from_fn(token.width, token.height, |x, y| {
            gradient_pixel(
                left + (x as f64 + 0.5) * units_per_pixel,
                top + (y as f64 + 0.5) * units_per_pixel,
            )
        }))
    }

    fn release(&mut self) {}

    fn name(&self) -> &str {
        "gradient"
    }
}

fn test_settings(output_dir: &Path) -> CaptureSettings {
    CaptureSettings {
        capture_bounds: WorldBounds::new(
            WorldPoint::new(0.0, 0.0, 0.0),
            WorldPoint::new(WORLD_SIZE, WORLD_SIZE, 0.0),
        ),
        output_width: 512,
        output_height: 512,
        use_tiling: true,
        tile_resolution: 256,
        tile_overlap: 64,
        background: Background::SolidColor(Rgba([255, 0, 255, 255])),
        output_dir: output_dir.to_path_buf(),
        file_name: "integration_map".to_string(),
        use_auto_filename: false,
        ..Default::default()
    }
}

fn fast_config() -> SequencerConfig {
    SequencerConfig {
        poll_interval: Duration::from_millis(1),
        readiness_timeout: Duration::from_millis(100),
        render_timeout: Duration::from_millis(100),
        readback_timeout: Duration::from_millis(100),
        settle_delay: Duration::ZERO,
    }
}

fn assert_pixel_close(actual: Rgba<u8>, expected: Rgba<u8>, px: u32, py: u32) {
    for channel in 0..4 {
        let diff = (actual[channel] as i16 - expected[channel] as i16).abs();
        assert!(
            diff <= 1,
            "pixel ({}, {}): got {:?}, expected {:?}",
            px,
            py,
            actual,
            expected
        );
    }
}

#[tokio::test]
async fn full_run_reconstructs_world_gradient_across_seams() {
    let dir = tempfile::tempdir().unwrap();
    let settings = test_settings(dir.path());
    let (progress, mut events) = ChannelProgress::new();

    let report = run_capture_with_config(
        &settings,
        GradientRenderer::new(),
        AlwaysReady,
        PngSink,
        fast_config(),
        &progress,
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(report.tiles_captured, 9);
    assert_eq!(report.tiles_skipped, 0);
    assert!(report.output_path.exists());

    let stitched = image::open(&report.output_path).unwrap().to_rgba8();
    assert_eq!((stitched.width(), stitched.height()), (512, 512));

    // Sample points across the canvas, deliberately including seam
    // columns/rows (overlap bands start at multiples of 192) and the
    // clipped bottom-right corner.
    for &(px, py) in &[
        (0u32, 0u32),
        (100, 100),
        (192, 50),   // left edge of the second column's blend band
        (255, 50),   // outer edge of that band
        (200, 200),  // inside the diagonal corner blend
        (383, 120),
        (50, 192),
        (300, 300),
        (450, 450),
        (511, 511),
    ] {
        // Canvas pixel centers map to world at scale 1.
        let expected = gradient_pixel(px as f64 + 0.5, py as f64 + 0.5);
        assert_pixel_close(*stitched.get_pixel(px, py), expected, px, py);
    }

    // Nine tile events in order, then the completion line and the final
    // completion event.
    let mut tile_events = 0;
    let mut saw_complete = false;
    while let Ok(event) = events.try_recv() {
        match event {
            ProgressEvent::Progress { current, total, fraction, .. } => {
                if tile_events < 9 {
                    tile_events += 1;
                    assert_eq!(current, tile_events);
                    assert_eq!(total, 9);
                    assert!((fraction - current as f32 / 9.0).abs() < 1e-6);
                }
            }
            ProgressEvent::Complete {
                success,
                output_path,
            } => {
                assert!(success);
                assert_eq!(output_path.unwrap(), report.output_path);
                saw_complete = true;
            }
        }
    }
    assert_eq!(tile_events, 9);
    assert!(saw_complete);
}

#[tokio::test]
async fn all_tiles_failed_reports_no_tile_data_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let settings = test_settings(dir.path());

    let err = run_capture_with_config(
        &settings,
        GradientRenderer::refusing_first(9),
        AlwaysReady,
        PngSink,
        fast_config(),
        &NullProgress,
        CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, CaptureError::NoTileData));
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn one_failed_tile_leaves_background_hole() {
    let dir = tempfile::tempdir().unwrap();
    let settings = test_settings(dir.path());

    // The first capture request (tile (0,0)) fails; the other eight
    // succeed and the run completes.
    let report = run_capture_with_config(
        &settings,
        GradientRenderer::refusing_first(1),
        AlwaysReady,
        PngSink,
        fast_config(),
        &NullProgress,
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(report.tiles_captured, 8);
    assert_eq!(report.tiles_skipped, 1);

    let stitched = image::open(&report.output_path).unwrap().to_rgba8();
    // Tile (0,0)'s exclusive region (outside every neighbor's footprint,
    // which starts at 192) shows the magenta background.
    assert_eq!(*stitched.get_pixel(10, 10), Rgba([255, 0, 255, 255]));
    assert_eq!(*stitched.get_pixel(100, 150), Rgba([255, 0, 255, 255]));
    // Far corner is normal gradient.
    assert_pixel_close(
        *stitched.get_pixel(450, 450),
        gradient_pixel(450.5, 450.5),
        450,
        450,
    );
}

/// Progress sink that cancels the run token once enough tiles landed.
struct CancelAfter {
    token: CancellationToken,
    after: usize,
}

impl ProgressSink for CancelAfter {
    fn on_progress(&self, _status: &str, _fraction: f32, current: usize, _total: usize) {
        if current >= self.after {
            self.token.cancel();
        }
    }

    fn on_complete(&self, _success: bool, _output_path: Option<&Path>) {}
}

#[tokio::test]
async fn cancellation_mid_run_discards_partial_work() {
    let dir = tempfile::tempdir().unwrap();
    let settings = test_settings(dir.path());
    let cancel = CancellationToken::new();
    let progress = CancelAfter {
        token: cancel.clone(),
        after: 3,
    };

    let err = run_capture_with_config(
        &settings,
        GradientRenderer::new(),
        AlwaysReady,
        PngSink,
        fast_config(),
        &progress,
        cancel,
    )
    .await
    .unwrap_err();

    assert!(err.is_cancelled());
    // No partial image was written.
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn untiled_run_matches_gradient_at_full_resolution() {
    let dir = tempfile::tempdir().unwrap();
    let settings = CaptureSettings {
        use_tiling: false,
        ..test_settings(dir.path())
    };

    let report = run_capture_with_config(
        &settings,
        GradientRenderer::new(),
        AlwaysReady,
        PngSink,
        fast_config(),
        &NullProgress,
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(report.tiles_captured, 1);
    let stitched = image::open(&report.output_path).unwrap().to_rgba8();
    assert_eq!((stitched.width(), stitched.height()), (512, 512));
    assert_pixel_close(
        *stitched.get_pixel(256, 256),
        gradient_pixel(256.5, 256.5),
        256,
        256,
    );
}
