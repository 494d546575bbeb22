//! Convex foothold polygons and their halfspace form.
//!
//! A terrain patch under a foot is described by an ordered vertex list (either
//! winding). [`to_halfspaces`] converts it to `A·p <= b`, one row per edge,
//! with a zero vertical column: the polygon bounds horizontal placement only.
//!
//! Degenerate policy: fewer than three distinct vertices, or zero enclosed
//! area, produce zero rows (always satisfied). The engine then places no
//! terrain restriction on that foot.

use std::f64::consts::TAU;

use nalgebra::{DMatrix, DVector, Vector2, Vector3};
use stride_core::GeometryError;
use tracing::warn;

/// Tolerance for duplicate vertices, zero area and convexity tests.
const EPS: f64 = 1e-9;

/// Slack on the total turning angle, in radians.
const ANGLE_EPS: f64 = 1e-6;

/// Convex foothold region as an ordered list of world-frame vertices.
///
/// Only the `x`/`y` coordinates take part in the conversion.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConvexPolygon {
    vertices: Vec<Vector3<f64>>,
}

impl ConvexPolygon {
    pub const fn new(vertices: Vec<Vector3<f64>>) -> Self {
        Self { vertices }
    }

    /// Axis-aligned rectangle centered at `(cx, cy)` on height `z`.
    pub fn rectangle(cx: f64, cy: f64, half_x: f64, half_y: f64, z: f64) -> Self {
        Self::new(vec![
            Vector3::new(cx - half_x, cy - half_y, z),
            Vector3::new(cx + half_x, cy - half_y, z),
            Vector3::new(cx + half_x, cy + half_y, z),
            Vector3::new(cx - half_x, cy + half_y, z),
        ])
    }

    pub fn vertices(&self) -> &[Vector3<f64>] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Halfspace representation `{p : A·p <= b}` with `A` of shape `m×3`.
#[derive(Clone, Debug, PartialEq)]
pub struct Halfspaces {
    pub a: DMatrix<f64>,
    pub b: DVector<f64>,
}

impl Halfspaces {
    /// Zero rows: every point is feasible.
    pub fn permissive() -> Self {
        Self {
            a: DMatrix::zeros(0, 3),
            b: DVector::zeros(0),
        }
    }

    /// Single row `-p_z <= 0`: stay on or above the ground plane `z = 0`.
    pub fn flat_ground() -> Self {
        Self {
            a: DMatrix::from_row_slice(1, 3, &[0.0, 0.0, -1.0]),
            b: DVector::zeros(1),
        }
    }

    pub fn num_rows(&self) -> usize {
        self.a.nrows()
    }

    pub fn is_permissive(&self) -> bool {
        self.a.nrows() == 0
    }

    /// Signed slack `b_i - a_i·p` of row `i` (positive inside).
    pub fn slack(&self, row: usize, p: &Vector3<f64>) -> f64 {
        let a = &self.a;
        self.b[row] - (a[(row, 0)] * p.x + a[(row, 1)] * p.y + a[(row, 2)] * p.z)
    }

    /// Whether every row holds with at least `margin` to spare.
    pub fn contains(&self, p: &Vector3<f64>, margin: f64) -> bool {
        (0..self.num_rows()).all(|i| self.slack(i, p) >= margin)
    }

    /// Rows in the engine's `n·p + c >= 0` convention, scaled.
    ///
    /// Returns an `m×4` matrix `scale · [-A | b]`.
    pub fn to_constraint_rows(&self, scale: f64) -> DMatrix<f64> {
        let m = self.num_rows();
        let mut ab = DMatrix::zeros(m, 4);
        for i in 0..m {
            for k in 0..3 {
                ab[(i, k)] = -scale * self.a[(i, k)];
            }
            ab[(i, 3)] = scale * self.b[i];
        }
        ab
    }
}

/// Convert a convex polygon into halfspace form.
///
/// Rows are outward edge normals of unit length, in vertex order.
pub fn to_halfspaces(polygon: &ConvexPolygon) -> Result<Halfspaces, GeometryError> {
    for (index, v) in polygon.vertices().iter().enumerate() {
        if !v.iter().all(|c| c.is_finite()) {
            return Err(GeometryError::NonFiniteVertex { index });
        }
    }

    // Project onto the ground plane, dropping repeated vertices.
    let mut points: Vec<Vector2<f64>> = Vec::with_capacity(polygon.len());
    for v in polygon.vertices() {
        let p = Vector2::new(v.x, v.y);
        if points.last().is_none_or(|last| (p - last).norm() > EPS) {
            points.push(p);
        }
    }
    while points.len() > 1 && (points[0] - points[points.len() - 1]).norm() <= EPS {
        points.pop();
    }

    if points.len() < 3 {
        warn!(
            vertices = polygon.len(),
            "foothold polygon has fewer than 3 distinct vertices, no terrain rows"
        );
        return Ok(Halfspaces::permissive());
    }

    let n = points.len();
    let twice_area: f64 = (0..n)
        .map(|i| cross(&points[i], &points[(i + 1) % n]))
        .sum();
    if twice_area.abs() <= EPS {
        warn!(vertices = n, "foothold polygon has zero area, no terrain rows");
        return Ok(Halfspaces::permissive());
    }
    // +1 for counter-clockwise, -1 for clockwise.
    let winding = twice_area.signum();

    // Turns share the winding's sign and add up to a single revolution.
    let mut turning = 0.0;
    for i in 0..n {
        let e0 = points[(i + 1) % n] - points[i];
        let e1 = points[(i + 2) % n] - points[(i + 1) % n];
        let turn = cross(&e0, &e1);
        turning += winding * turn.atan2(e0.dot(&e1));
        if winding * turn < -EPS || turning > TAU + ANGLE_EPS {
            return Err(GeometryError::NonConvex {
                index: (i + 1) % n,
            });
        }
    }

    let mut a = DMatrix::zeros(n, 3);
    let mut b = DVector::zeros(n);
    for i in 0..n {
        let p0 = points[i];
        let d = points[(i + 1) % n] - p0;
        // Right-hand normal of a counter-clockwise edge points outward.
        let normal = Vector2::new(d.y, -d.x) * (winding / d.norm());
        a[(i, 0)] = normal.x;
        a[(i, 1)] = normal.y;
        b[i] = normal.dot(&p0);
    }

    Ok(Halfspaces { a, b })
}

fn cross(a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}
