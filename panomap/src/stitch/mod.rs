//! Compositing captured tiles into the final image.
//!
//! The canvas is pre-filled with the configured background, then tiles
//! are laid down top-to-bottom, left-to-right at `tile * effective_step`
//! pixel offsets. Inside an overlap band the incoming tile is blended
//! over what an earlier (upper/left) neighbor already wrote, ramping from
//! weight 0 at the seam to 1 at the band's far edge; outside the bands
//! the tile overwrites directly. Tiles past the canvas edge are clipped.
//!
//! The composite order is load-bearing: the blend at a pixel reads what
//! the earlier neighbor left there, so tiles must arrive `(y, x)`
//! ascending, which is exactly how [`TileStore::drain_ordered`] yields
//! them.
//!
//! Orientation convention: tiles are captured in the output image's own
//! orientation, so placement is the same for portrait and landscape
//! outputs; no transpose or flip is applied anywhere.

pub mod color;

use crate::grid::Grid;
use crate::settings::CaptureSettings;
use crate::store::TileStore;
use image::{Rgba, RgbaImage};
use tracing::{debug, instrument};

/// Composites all captured tiles into the final output image.
///
/// Consumes the store; each tile buffer is freed as soon as it has been
/// composited, so peak memory is the canvas plus one tile. Stitching an
/// empty store yields a pure background canvas.
///
/// Pure and deterministic: identical tiles and settings produce
/// byte-identical output.
#[instrument(skip(store, grid, settings), fields(tiles = store.len()))]
pub fn stitch(store: TileStore, grid: &Grid, settings: &CaptureSettings) -> RgbaImage {
    let width = settings.output_width;
    let height = settings.output_height;
    let overlap = grid.tile_overlap;

    let mut canvas = RgbaImage::from_pixel(width, height, settings.background.fill_pixel());

    for (coord, tile) in store.drain_ordered() {
        let (origin_x, origin_y) = grid.canvas_origin(coord);
        debug!(tile = %coord, origin_x, origin_y, "compositing tile");

        for y in 0..tile.height() {
            let dst_y = origin_y + y;
            if dst_y >= height {
                break;
            }
            for x in 0..tile.width() {
                let dst_x = origin_x + x;
                if dst_x >= width {
                    break;
                }

                let incoming = *tile.get_pixel(x, y);
                // A blend ramp only exists toward an already-written
                // neighbor: left bands for tiles with a left neighbor,
                // top bands for tiles with an upper one.
                let weight_x = if coord.x > 0 && x < overlap {
                    ramp(x, overlap)
                } else {
                    1.0
                };
                let weight_y = if coord.y > 0 && y < overlap {
                    ramp(y, overlap)
                } else {
                    1.0
                };
                // min, not product: where the bands cross, the corner
                // blends along a clean diagonal.
                let factor = weight_x.min(weight_y);

                if factor < 1.0 {
                    let existing = *canvas.get_pixel(dst_x, dst_y);
                    canvas.put_pixel(dst_x, dst_y, blend_pixel(existing, incoming, factor));
                } else {
                    canvas.put_pixel(dst_x, dst_y, incoming);
                }
            }
        }
        // `tile` drops here, releasing its buffer before the next one.
    }

    canvas
}

/// Linear ramp from 0 at the seam to 1 at the far edge of the band.
fn ramp(position: u32, overlap: u32) -> f32 {
    position as f32 / overlap.saturating_sub(1).max(1) as f32
}

/// Blends `incoming` over `existing` by `factor` in linear light through
/// HSV space, then re-encodes for 8-bit storage.
fn blend_pixel(existing: Rgba<u8>, incoming: Rgba<u8>, factor: f32) -> Rgba<u8> {
    let from = decode(existing);
    let to = decode(incoming);
    encode(color::lerp_hsv(from, to, factor))
}

fn decode(pixel: Rgba<u8>) -> [f32; 4] {
    [
        color::srgb_to_linear(pixel[0]),
        color::srgb_to_linear(pixel[1]),
        color::srgb_to_linear(pixel[2]),
        pixel[3] as f32 / 255.0,
    ]
}

fn encode(rgba: [f32; 4]) -> Rgba<u8> {
    Rgba([
        color::linear_to_srgb(rgba[0]),
        color::linear_to_srgb(rgba[1]),
        color::linear_to_srgb(rgba[2]),
        (rgba[3].clamp(0.0, 1.0) * 255.0).round() as u8,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::TileCoord;
    use crate::settings::Background;

    fn solid(size: u32, rgba: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(size, size, Rgba(rgba))
    }

    fn settings(width: u32, height: u32, background: Background) -> CaptureSettings {
        CaptureSettings {
            output_width: width,
            output_height: height,
            use_tiling: true,
            tile_resolution: 256,
            tile_overlap: 64,
            background,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_store_transparent_background() {
        let grid = Grid::plan(128, 96, 256, 64);
        let out = stitch(
            TileStore::new(),
            &grid,
            &settings(128, 96, Background::Transparent),
        );

        assert_eq!((out.width(), out.height()), (128, 96));
        assert!(out.pixels().all(|p| *p == Rgba([0, 0, 0, 0])));
    }

    #[test]
    fn test_empty_store_solid_background() {
        let grid = Grid::plan(64, 64, 256, 64);
        let bg = Background::SolidColor(Rgba([20, 40, 60, 255]));
        let out = stitch(TileStore::new(), &grid, &settings(64, 64, bg));
        assert!(out.pixels().all(|p| *p == Rgba([20, 40, 60, 255])));
    }

    #[test]
    fn test_single_tile_overwrites_background() {
        let grid = Grid::plan(256, 256, 256, 64);
        let mut store = TileStore::new();
        store.put(TileCoord::new(0, 0), solid(256, [255, 0, 0, 255]));

        let out = stitch(store, &grid, &settings(256, 256, Background::Transparent));
        // Tile (0,0) has no neighbors, so no blend band anywhere.
        assert!(out.pixels().all(|p| *p == Rgba([255, 0, 0, 255])));
    }

    #[test]
    fn test_partial_tiles_are_clipped() {
        // 3x3 grid of 256px tiles on a 512px canvas: the last row and
        // column extend past the edge and must clip, not wrap or panic.
        let grid = Grid::plan(512, 512, 256, 64);
        assert_eq!(grid.tile_count(), 9);

        let mut store = TileStore::new();
        for coord in grid.coords() {
            store.put(coord, solid(256, [0, 255, 0, 255]));
        }

        let out = stitch(store, &grid, &settings(512, 512, Background::Transparent));
        assert_eq!((out.width(), out.height()), (512, 512));
        assert_eq!(*out.get_pixel(511, 511), Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn test_seam_outer_edge_equals_incoming_tile() {
        // Two horizontally adjacent tiles; at the far edge of the overlap
        // band the weight is exactly 1, so the right tile's pixel lands
        // unmodified, with no discontinuity at the band boundary.
        let grid = Grid::plan(448, 256, 256, 64);
        assert_eq!((grid.num_tiles_x, grid.num_tiles_y), (2, 1));

        let red = [255, 0, 0, 255];
        let green = [0, 255, 0, 255];
        let mut store = TileStore::new();
        store.put(TileCoord::new(0, 0), solid(256, red));
        store.put(TileCoord::new(1, 0), solid(256, green));

        let out = stitch(store, &grid, &settings(448, 256, Background::Transparent));

        // Right tile starts at canvas x = 192. Band spans x = 192..256.
        // At the seam (weight 0) the left tile's pixel survives.
        assert_eq!(*out.get_pixel(192, 100), Rgba(red));
        // At the band's outer edge (x offset 63, weight 63/63 = 1) the
        // incoming tile wins exactly.
        assert_eq!(*out.get_pixel(192 + 63, 100), Rgba(green));
        // Just past the band: plain overwrite territory.
        assert_eq!(*out.get_pixel(192 + 64, 100), Rgba(green));
        // Mid-band is a genuine mix, not either endpoint.
        let mid = *out.get_pixel(192 + 31, 100);
        assert_ne!(mid, Rgba(red));
        assert_ne!(mid, Rgba(green));
    }

    #[test]
    fn test_missing_tile_shows_background() {
        let grid = Grid::plan(512, 512, 256, 64);
        let bg = [9, 9, 9, 255];

        let mut store = TileStore::new();
        for coord in grid.coords() {
            if coord != TileCoord::new(1, 1) {
                store.put(coord, solid(256, [200, 200, 0, 255]));
            }
        }

        let out = stitch(
            store,
            &grid,
            &settings(512, 512, Background::SolidColor(Rgba(bg))),
        );
        // (300, 300) lies in tile (1,1)'s exclusive region: inside its
        // placement, outside every neighbor's footprint.
        assert_eq!(*out.get_pixel(300, 300), Rgba(bg));
        // The rest of the canvas is covered.
        assert_eq!(*out.get_pixel(10, 10), Rgba([200, 200, 0, 255]));
    }

    #[test]
    fn test_stitch_is_deterministic() {
        let grid = Grid::plan(448, 448, 256, 64);

        let build = || {
            let mut store = TileStore::new();
            for (i, coord) in grid.coords().enumerate() {
                let shade = 40 + (i as u8) * 50;
                store.put(coord, solid(256, [shade, 255 - shade, shade / 2, 255]));
            }
            store
        };

        let a = stitch(build(), &grid, &settings(448, 448, Background::Transparent));
        let b = stitch(build(), &grid, &settings(448, 448, Background::Transparent));
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn test_zero_overlap_butt_joins() {
        let grid = Grid::plan(512, 256, 256, 0);
        assert_eq!((grid.num_tiles_x, grid.num_tiles_y), (2, 1));

        let mut store = TileStore::new();
        store.put(TileCoord::new(0, 0), solid(256, [255, 0, 0, 255]));
        store.put(TileCoord::new(1, 0), solid(256, [0, 0, 255, 255]));

        let out = stitch(store, &grid, &settings(512, 256, Background::Transparent));
        // No band at all: a hard edge exactly at x = 256.
        assert_eq!(*out.get_pixel(255, 10), Rgba([255, 0, 0, 255]));
        assert_eq!(*out.get_pixel(256, 10), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_portrait_output_uses_same_placement() {
        // Portrait canvas, no transpose: tile (0,1) still lands at
        // (0, step) like it would on a landscape canvas.
        let grid = Grid::plan(256, 448, 256, 64);
        assert_eq!((grid.num_tiles_x, grid.num_tiles_y), (1, 2));

        let mut store = TileStore::new();
        store.put(TileCoord::new(0, 0), solid(256, [255, 0, 0, 255]));
        store.put(TileCoord::new(0, 1), solid(256, [0, 255, 0, 255]));

        let out = stitch(store, &grid, &settings(256, 448, Background::Transparent));
        assert_eq!(*out.get_pixel(10, 10), Rgba([255, 0, 0, 255]));
        // Below the lower tile's blend band: pure lower-tile pixels.
        assert_eq!(*out.get_pixel(10, 300), Rgba([0, 255, 0, 255]));
    }
}
