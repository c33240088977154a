//! In-memory storage for captured tile buffers.
//!
//! The sequencer inserts each tile's pixels as they arrive; the stitcher
//! drains them all at once. A full grid of tiles can outweigh the final
//! image several times over (overlap is captured once per neighbor), so
//! buffers are dropped as soon as the stitcher has consumed them and the
//! store is cleared at the end of every run.

use crate::grid::TileCoord;
use image::RgbaImage;
use std::collections::BTreeMap;

/// Pixel buffer for one captured tile, `tile_resolution` square.
pub type TileBuffer = RgbaImage;

/// Maps tile coordinates to their captured pixel buffers.
///
/// Access is strictly sequential: the sequencer writes while capturing,
/// then hands the whole store to the stitcher, which reads it in `(y, x)`
/// order. The `BTreeMap` keyed by [`TileCoord`] (which orders `(y, x)`
/// ascending) provides exactly that iteration order.
#[derive(Debug, Default)]
pub struct TileStore {
    tiles: BTreeMap<TileCoord, TileBuffer>,
}

impl TileStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a captured tile buffer.
    ///
    /// Re-capturing the same coordinate overwrites the earlier buffer;
    /// last write wins.
    pub fn put(&mut self, coord: TileCoord, buffer: TileBuffer) {
        self.tiles.insert(coord, buffer);
    }

    /// Returns true if a buffer exists for the coordinate.
    pub fn contains(&self, coord: TileCoord) -> bool {
        self.tiles.contains_key(&coord)
    }

    /// Number of stored tiles.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Returns true if no tiles are stored.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Total pixel bytes currently held, for memory diagnostics.
    pub fn size_bytes(&self) -> usize {
        self.tiles.values().map(|b| b.as_raw().len()).sum()
    }

    /// Consumes the store, yielding tiles in `(y, x)` ascending order.
    ///
    /// This is the order the stitcher composites in; each buffer is moved
    /// out so it can be freed as soon as it has been composited.
    pub fn drain_ordered(self) -> impl Iterator<Item = (TileCoord, TileBuffer)> {
        self.tiles.into_iter()
    }

    /// Releases all buffers without consuming the store.
    pub fn clear(&mut self) {
        self.tiles.clear();
    }
}
