//! A built-in renderer so the CLI works without an engine attached.
//!
//! Rasterizes a deterministic procedural terrain (layered sine "noise"
//! banded into water, sand, grass, rock and snow) purely from world
//! coordinates. Overlapping tile captures therefore agree exactly, which
//! makes the output a quick visual check of seam blending: any visible
//! band at a tile boundary is a stitching bug, not terrain.

use image::Rgba;
use panomap::capture::{CameraPlacement, CaptureDevice, DeviceError};
use panomap::store::TileBuffer;

/// Procedural terrain renderer with instant fences.
#[derive(Debug, Default)]
pub struct SyntheticRenderer;

impl SyntheticRenderer {
    pub fn new() -> Self {
        Self
    }
}

/// Everything needed to rasterize one submitted capture.
pub struct Frame {
    placement: CameraPlacement,
    width: u32,
    height: u32,
}

impl CaptureDevice for SyntheticRenderer {
    type RenderToken = Frame;
    type ReadbackToken = Frame;

    fn begin_capture(
        &mut self,
        placement: &CameraPlacement,
        width: u32,
        height: u32,
    ) -> Result<Frame, DeviceError> {
        Ok(Frame {
            placement: placement.clone(),
            width,
            height,
        })
    }

    fn render_complete(&mut self, _token: &Frame) -> bool {
        true
    }

    fn begin_readback(&mut self, token: Frame) -> Result<Frame, DeviceError> {
        Ok(token)
    }

    fn readback_complete(&mut self, _token: &Frame) -> bool {
        true
    }

    fn take_pixels(&mut self, token: Frame) -> Result<TileBuffer, DeviceError> {
        let units_per_pixel = token.placement.ortho_width / token.width as f64;
        let left = token.placement.center.x - token.placement.ortho_width / 2.0;
        let world_height = units_per_pixel * token.height as f64;
        let top = token.placement.center.y - world_height / 2.0;

        Ok(TileBuffer::from_fn(token.width, token.height, |x, y| {
            let wx = left + (x as f64 + 0.5) * units_per_pixel;
            let wy = top + (y as f64 + 0.5) * units_per_pixel;
            terrain_pixel(wx, wy)
        }))
    }

    fn release(&mut self) {}

    fn name(&self) -> &str {
        "synthetic terrain"
    }
}

/// Layered-sine elevation in roughly [-1, 1].
fn elevation(x: f64, y: f64) -> f64 {
    let x = x * 0.002;
    let y = y * 0.002;
    0.5 * (x.sin() * y.cos())
        + 0.3 * ((2.3 * x + 1.7).sin() * (1.9 * y).cos())
        + 0.2 * ((5.1 * x).sin() + (4.7 * y + 0.5).sin()) * 0.5
}

fn terrain_pixel(x: f64, y: f64) -> Rgba<u8> {
    let h = elevation(x, y);
    let shade = ((h + 1.0) * 0.5 * 40.0) as u8;

    if h < -0.25 {
        // Deep to shallow water
        Rgba([20, 60 + shade, 140 + shade, 255])
    } else if h < -0.15 {
        // Sand
        Rgba([194, 178, 128, 255])
    } else if h < 0.35 {
        // Grass
        Rgba([60 + shade, 140 + shade, 60, 255])
    } else if h < 0.6 {
        // Rock
        Rgba([120 + shade, 110 + shade, 100 + shade, 255])
    } else {
        // Snow
        Rgba([240, 244, 250, 255])
    }
}
