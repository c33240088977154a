//! Tile grid planning.
//!
//! Pure placement math for the tiled capture: how many tiles a given
//! output size needs, where each tile lands on the output canvas, and
//! where in the world the camera has to be to photograph it.
//!
//! # Scale
//!
//! All world placement derives from a single world-units-per-pixel scale,
//! `max(bounds_x, bounds_y) / max(output_w, output_h)`, applied to both
//! axes. Using independent per-axis scales stretches tiles and misaligns
//! seams, so there is deliberately no way to ask this module for one.

use crate::bounds::WorldPoint;
use crate::settings::CaptureSettings;

/// Position of a tile in the capture grid.
///
/// `(0, 0)` is the top-left tile; `x` grows rightward (east), `y` grows
/// downward. Tiles are enumerated row-major: `index = y * num_tiles_x + x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    /// Row, counted from the top. Listed first so the derived ordering
    /// sorts `(y, x)` ascending, the order stitching requires.
    pub y: u32,
    /// Column, counted from the left.
    pub x: u32,
}

impl TileCoord {
    pub fn new(x: u32, y: u32) -> Self {
        Self { y, x }
    }
}

impl std::fmt::Display for TileCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The planned capture grid for one run.
///
/// Computed once at run start from the output size and tile parameters,
/// then treated as immutable. A grid with zero tiles signals an invalid
/// configuration; callers must check [`Grid::is_empty`] before capturing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    /// Tiles along the X axis.
    pub num_tiles_x: u32,
    /// Tiles along the Y axis.
    pub num_tiles_y: u32,
    /// Pixel size of a square tile.
    pub tile_resolution: u32,
    /// Pixel overlap between adjacent tiles.
    pub tile_overlap: u32,
}

impl Grid {
    /// Plans the grid for the given output and tile dimensions.
    ///
    /// Each axis gets one tile if the output fits inside a single tile,
    /// otherwise `1 + ceil((output - tile) / step)` tiles stepped by
    /// `tile_resolution - tile_overlap` pixels. The resulting union of
    /// tile placements always covers the full canvas; tiles past the
    /// canvas edge are clipped later, during stitching.
    ///
    /// An overlap at or above the tile resolution (step <= 0) cannot cover
    /// anything; the returned grid has zero tiles rather than dividing by
    /// zero. Zero output dimensions are treated the same way.
    pub fn plan(
        output_width: u32,
        output_height: u32,
        tile_resolution: u32,
        tile_overlap: u32,
    ) -> Self {
        let invalid = Self {
            num_tiles_x: 0,
            num_tiles_y: 0,
            tile_resolution,
            tile_overlap,
        };

        if tile_resolution == 0 || tile_overlap >= tile_resolution {
            return invalid;
        }
        if output_width == 0 || output_height == 0 {
            return invalid;
        }

        let step = (tile_resolution - tile_overlap) as u64;
        let tiles_for = |output: u32| -> u32 {
            if output <= tile_resolution {
                1
            } else {
                let remainder = (output - tile_resolution) as u64;
                // 1 + ceil(remainder / step)
                (1 + remainder.div_ceil(step)) as u32
            }
        };

        Self {
            num_tiles_x: tiles_for(output_width),
            num_tiles_y: tiles_for(output_height),
            tile_resolution,
            tile_overlap,
        }
    }

    /// Pixel distance between adjacent tile origins.
    #[inline]
    pub fn effective_step(&self) -> u32 {
        self.tile_resolution - self.tile_overlap
    }

    /// Total number of tiles in the grid.
    #[inline]
    pub fn tile_count(&self) -> usize {
        self.num_tiles_x as usize * self.num_tiles_y as usize
    }

    /// Returns true if the grid has no tiles (invalid configuration).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tile_count() == 0
    }

    /// Iterates tile coordinates in row-major order (top-to-bottom,
    /// left-to-right). This is both the capture order and the stitch order.
    pub fn coords(&self) -> impl Iterator<Item = TileCoord> + '_ {
        let nx = self.num_tiles_x;
        (0..self.num_tiles_y).flat_map(move |y| (0..nx).map(move |x| TileCoord::new(x, y)))
    }

    /// Top-left canvas pixel of a tile's placement region.
    pub fn canvas_origin(&self, coord: TileCoord) -> (u32, u32) {
        let step = self.effective_step();
        (coord.x * step, coord.y * step)
    }
}

/// The single world-units-per-pixel scale for a run.
///
/// Derived from the larger bounds dimension over the larger output
/// dimension so both axes share one scale.
pub fn world_units_per_pixel(settings: &CaptureSettings) -> f64 {
    let size = settings.capture_bounds.size();
    let world_extent = size.x.max(size.y);
    let pixel_extent = settings.output_width.max(settings.output_height) as f64;
    world_extent / pixel_extent
}

/// Camera placement for one tile: world-space center at camera height, and
/// the world width the orthographic frustum must span.
pub fn tile_world_placement(
    grid: &Grid,
    coord: TileCoord,
    settings: &CaptureSettings,
) -> (WorldPoint, f64) {
    let wupp = world_units_per_pixel(settings);
    let step = grid.effective_step() as f64;
    let half_tile = grid.tile_resolution as f64 / 2.0;
    let min = settings.capture_bounds.min;

    let center = WorldPoint::new(
        min.x + (coord.x as f64 * step + half_tile) * wupp,
        min.y + (coord.y as f64 * step + half_tile) * wupp,
        settings.camera_height,
    );
    let ortho_width = grid.tile_resolution as f64 * wupp;

    (center, ortho_width)
}

/// Camera placement for the untiled single-capture path: bounds center at
/// camera height, frustum spanning the full output width.
pub fn full_world_placement(settings: &CaptureSettings) -> (WorldPoint, f64) {
    let wupp = world_units_per_pixel(settings);
    let center = settings.capture_bounds.center();
    (
        WorldPoint::new(center.x, center.y, settings.camera_height),
        settings.output_width as f64 * wupp,
    )
}
