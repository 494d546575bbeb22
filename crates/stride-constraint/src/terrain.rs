//! Terrain model interface and a static per-foot implementation.

use stride_core::{ContactMode, GeometryError};

use crate::halfspace::{ConvexPolygon, Halfspaces, to_halfspaces};

/// Source of foothold regions, queried once per foot per evaluation.
pub trait TerrainModel: Send + Sync {
    /// Foothold polygon for `foot` while the robot is in `mode`.
    fn polytope(&self, foot: usize, mode: ContactMode) -> ConvexPolygon;

    /// Halfspace form of the foothold.
    ///
    /// Terrains that already hold halfspaces can override this and skip the
    /// polygon conversion.
    fn halfspaces(&self, foot: usize, mode: ContactMode) -> Result<Halfspaces, GeometryError> {
        to_halfspaces(&self.polytope(foot, mode))
    }
}

/// Fixed foothold polygon per foot, independent of the contact mode.
///
/// Feet without a polygon get an empty one (no terrain rows).
#[derive(Clone, Debug, Default)]
pub struct StaticTerrain {
    polygons: Vec<ConvexPolygon>,
}

impl StaticTerrain {
    pub const fn new(polygons: Vec<ConvexPolygon>) -> Self {
        Self { polygons }
    }

    /// Replace the polygon of one foot, growing the table as needed.
    pub fn set_polygon(&mut self, foot: usize, polygon: ConvexPolygon) {
        if foot >= self.polygons.len() {
            self.polygons.resize(foot + 1, ConvexPolygon::default());
        }
        self.polygons[foot] = polygon;
    }
}

impl TerrainModel for StaticTerrain {
    fn polytope(&self, foot: usize, _mode: ContactMode) -> ConvexPolygon {
        self.polygons.get(foot).cloned().unwrap_or_default()
    }
}
