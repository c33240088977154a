//! World-space geometry for the capture area.
//!
//! The capture pipeline only needs a small amount of 3D math: an
//! axis-aligned box describing the area to photograph and the points
//! derived from it (tile centers, camera positions). These are plain
//! value types with no renderer-specific meaning; the renderer
//! collaborator interprets them in its own coordinate system.

/// A point or vector in world space.
///
/// Units are whatever the renderer uses (e.g. centimeters for Unreal-style
/// worlds, meters elsewhere). The capture core never assumes a unit, only
/// ratios between world distance and output pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WorldPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl WorldPoint {
    /// Creates a new point.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl std::fmt::Display for WorldPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.1}, {:.1}, {:.1})", self.x, self.y, self.z)
    }
}

/// Axis-aligned world-space box defining the area to photograph.
///
/// Only the X/Y footprint drives the tile grid; Z is carried through for
/// callers that derive a camera height from the bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    /// Minimum corner (west/south/bottom).
    pub min: WorldPoint,
    /// Maximum corner (east/north/top).
    pub max: WorldPoint,
}

impl WorldBounds {
    /// Creates bounds from two corners.
    ///
    /// The corners are normalized so `min` holds the componentwise minimum,
    /// matching how an axis-aligned box behaves regardless of which corners
    /// the caller picked.
    pub fn new(a: WorldPoint, b: WorldPoint) -> Self {
        Self {
            min: WorldPoint::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: WorldPoint::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Edge lengths of the box.
    pub fn size(&self) -> WorldPoint {
        WorldPoint::new(
            self.max.x - self.min.x,
            self.max.y - self.min.y,
            self.max.z - self.min.z,
        )
    }

    /// Geometric center of the box.
    pub fn center(&self) -> WorldPoint {
        WorldPoint::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
            (self.min.z + self.max.z) * 0.5,
        )
    }

    /// Returns true if the X/Y footprint has zero (or negative) area.
    ///
    /// A degenerate footprint cannot be photographed; grid planning treats
    /// it as an invalid configuration.
    pub fn is_degenerate(&self) -> bool {
        let size = self.size();
        size.x <= 0.0 || size.y <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_point_new() {
        let p = WorldPoint::new(1.0, -2.0, 3.5);
        assert_eq!(p.x, 1.0);
        assert_eq!(p.y, -2.0);
        assert_eq!(p.z, 3.5);
    }

    #[test]
    fn test_bounds_normalizes_corners() {
        let b = WorldBounds::new(
            WorldPoint::new(100.0, -50.0, 0.0),
            WorldPoint::new(-100.0, 50.0, 10.0),
        );
        assert_eq!(b.min, WorldPoint::new(-100.0, -50.0, 0.0));
        assert_eq!(b.max, WorldPoint::new(100.0, 50.0, 10.0));
    }

    #[test]
    fn test_bounds_size_and_center() {
        let b = WorldBounds::new(
            WorldPoint::new(0.0, 0.0, 0.0),
            WorldPoint::new(200.0, 100.0, 50.0),
        );
        assert_eq!(b.size(), WorldPoint::new(200.0, 100.0, 50.0));
        assert_eq!(b.center(), WorldPoint::new(100.0, 50.0, 25.0));
    }

    #[test]
    fn test_degenerate_footprint() {
        let flat = WorldBounds::new(
            WorldPoint::new(0.0, 5.0, 0.0),
            WorldPoint::new(100.0, 5.0, 0.0),
        );
        assert!(flat.is_degenerate());

        let ok = WorldBounds::new(
            WorldPoint::new(0.0, 0.0, 0.0),
            WorldPoint::new(1.0, 1.0, 0.0),
        );
        assert!(!ok.is_degenerate());
    }

    #[test]
    fn test_world_point_display() {
        let p = WorldPoint::new(1.25, 2.0, -3.0);
        assert_eq!(format!("{}", p), "(1.2, 2.0, -3.0)");
    }
}
