//! Capture run configuration.
//!
//! [`CaptureSettings`] carries everything one capture run needs: the world
//! area to photograph, the output image dimensions, the tiling parameters,
//! and the camera description handed to the renderer. Settings are plain
//! data with no behavior beyond validation; a run never mutates them.

use crate::bounds::{WorldBounds, WorldPoint};
use image::Rgba;
use std::path::PathBuf;

/// How uncovered canvas pixels are filled.
///
/// Tiles at the canvas edge may not cover their full placement region, and
/// a run with skipped tiles leaves holes; both show this background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Background {
    /// Fully transparent canvas (alpha 0).
    Transparent,
    /// Opaque solid color.
    SolidColor(Rgba<u8>),
}

impl Default for Background {
    fn default() -> Self {
        Background::SolidColor(Rgba([0, 0, 0, 255]))
    }
}

impl Background {
    /// The pixel value the canvas is pre-filled with.
    pub fn fill_pixel(&self) -> Rgba<u8> {
        match self {
            Background::Transparent => Rgba([0, 0, 0, 0]),
            Background::SolidColor(color) => Rgba([color[0], color[1], color[2], 255]),
        }
    }
}

/// Camera orientation in degrees.
///
/// Passed through to the renderer untouched. The default looks straight
/// down with north up, which is what a minimap wants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraRotation {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Default for CameraRotation {
    fn default() -> Self {
        Self {
            pitch: -90.0,
            yaw: 0.0,
            roll: -180.0,
        }
    }
}

/// Optional render-quality overrides.
///
/// An opaque block forwarded to the renderer collaborator; the capture core
/// never interprets these values. Absent means "use whatever quality the
/// renderer is currently configured for".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityOverrides {
    /// Use the high-dynamic-range scene color as the capture source.
    pub hdr_capture_source: bool,
    pub ambient_occlusion_intensity: f32,
    pub ambient_occlusion_quality: f32,
    pub screen_space_reflection_intensity: f32,
    pub screen_space_reflection_quality: f32,
}

impl Default for QualityOverrides {
    fn default() -> Self {
        Self {
            hdr_capture_source: true,
            ambient_occlusion_intensity: 0.5,
            ambient_occlusion_quality: 100.0,
            screen_space_reflection_intensity: 100.0,
            screen_space_reflection_quality: 100.0,
        }
    }
}

/// Immutable configuration for one capture run.
#[derive(Debug, Clone)]
pub struct CaptureSettings {
    /// World-space area to photograph.
    pub capture_bounds: WorldBounds,

    /// Final image width in pixels.
    pub output_width: u32,

    /// Final image height in pixels.
    pub output_height: u32,

    /// Capture the area as a grid of overlapping tiles. When false, a
    /// single full-resolution capture is performed instead.
    pub use_tiling: bool,

    /// Pixel size of a square tile (tiling only).
    pub tile_resolution: u32,

    /// Pixel overlap between adjacent tiles, used for seam blending
    /// (tiling only). Must be smaller than `tile_resolution`.
    pub tile_overlap: u32,

    /// Camera altitude in world units.
    pub camera_height: f64,

    /// Camera orientation, forwarded to the renderer.
    pub camera_rotation: CameraRotation,

    /// Vertical field of view in degrees (perspective projection only).
    pub field_of_view: f32,

    /// Orthographic (true) or perspective (false) projection.
    pub orthographic: bool,

    /// Optional quality overrides, forwarded to the renderer untouched.
    pub quality: Option<QualityOverrides>,

    /// Canvas background for uncovered pixels.
    pub background: Background,

    /// Directory the final image is written to.
    pub output_dir: PathBuf,

    /// Output file stem (without extension).
    pub file_name: String,

    /// Append a `_DD_MM_HH_mm` timestamp to the file stem.
    pub use_auto_filename: bool,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            capture_bounds: WorldBounds::new(
                WorldPoint::new(0.0, 0.0, 0.0),
                WorldPoint::new(100_000.0, 100_000.0, 0.0),
            ),
            output_width: 4096,
            output_height: 4096,
            use_tiling: false,
            tile_resolution: 2048,
            tile_overlap: 64,
            camera_height: 50_000.0,
            camera_rotation: CameraRotation::default(),
            field_of_view: 90.0,
            orthographic: true,
            quality: None,
            background: Background::SolidColor(Rgba([0, 0, 0, 255])),
            output_dir: PathBuf::from("."),
            file_name: "Minimap_Result".to_string(),
            use_auto_filename: true,
        }
    }
}

impl CaptureSettings {
    /// Checks the settings for configuration errors.
    ///
    /// This catches everything that would otherwise surface later as an
    /// invalid grid, so callers can reject bad input before any renderer
    /// resources are touched.
    ///
    /// # Errors
    ///
    /// Returns a human-readable description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.output_width == 0 || self.output_height == 0 {
            return Err(format!(
                "output dimensions must be positive, got {}x{}",
                self.output_width, self.output_height
            ));
        }
        if self.capture_bounds.is_degenerate() {
            return Err("capture bounds have a zero-area footprint".to_string());
        }
        if self.use_tiling {
            if self.tile_resolution == 0 {
                return Err("tile resolution must be positive".to_string());
            }
            if self.tile_overlap >= self.tile_resolution {
                return Err(format!(
                    "tile overlap {} must be smaller than tile resolution {}",
                    self.tile_overlap, self.tile_resolution
                ));
            }
        }
        if self.file_name.is_empty() {
            return Err("output file name must not be empty".to_string());
        }
        Ok(())
    }
}
