//! Mock collaborators for the switched constraint engine.
//!
//! Simple closed-form stand-ins for the kinematics model, the terrain and the
//! swing reference, usable in any crate's test suite.

use nalgebra::{SMatrix, SVector, Vector3};
use stride_constraint::{
    ConvexPolygon, Halfspaces, KinematicsModel, SwingReferenceProvider, TerrainModel,
};
use stride_core::{ContactMode, GeometryError};

// ---------------------------------------------------------------------------
// PointFootKinematics
// ---------------------------------------------------------------------------

/// Point feet whose positions are read straight from the state.
///
/// Layout for `n` feet:
/// - foot `f` position: `x[3f..3f+3]`, with `p_z` bent by
///   `curvature · x[3f]² / 2` so position Hessians are non-trivial
/// - foot `f` contact force: `u[3f..3f+3]`
/// - foot `f` velocity: `u[3n+3f..3n+3f+3]`
#[derive(Clone, Debug)]
pub struct PointFootKinematics<const S: usize, const I: usize> {
    num_feet: usize,
    curvature: f64,
}

impl<const S: usize, const I: usize> PointFootKinematics<S, I> {
    /// # Panics
    ///
    /// Panics if `S < 3n` or `I < 6n`.
    pub fn new(num_feet: usize) -> Self {
        assert!(3 * num_feet <= S, "state too small for {num_feet} feet");
        assert!(6 * num_feet <= I, "input too small for {num_feet} feet");
        Self {
            num_feet,
            curvature: 0.0,
        }
    }

    #[must_use]
    pub const fn with_curvature(mut self, curvature: f64) -> Self {
        self.curvature = curvature;
        self
    }

    /// State with every foot at `(0, 0, height)`.
    pub fn state_at_height(&self, height: f64) -> SVector<f64, S> {
        let mut x = SVector::zeros();
        for foot in 0..self.num_feet {
            x[3 * foot + 2] = height;
        }
        x
    }

    /// Input carrying `force` on every foot and `velocity` on every foot.
    pub fn input(&self, force: Vector3<f64>, velocity: Vector3<f64>) -> SVector<f64, I> {
        let mut u = SVector::zeros();
        let n = self.num_feet;
        for foot in 0..n {
            for k in 0..3 {
                u[3 * foot + k] = force[k];
                u[3 * n + 3 * foot + k] = velocity[k];
            }
        }
        u
    }
}

impl<const S: usize, const I: usize> KinematicsModel<S, I> for PointFootKinematics<S, I> {
    fn num_feet(&self) -> usize {
        self.num_feet
    }

    fn foot_position(&self, foot: usize, x: &SVector<f64, S>) -> Vector3<f64> {
        let i = 3 * foot;
        Vector3::new(x[i], x[i + 1], x[i + 2] + 0.5 * self.curvature * x[i] * x[i])
    }

    fn foot_position_jacobian(&self, foot: usize, x: &SVector<f64, S>) -> SMatrix<f64, 3, S> {
        let i = 3 * foot;
        let mut j = SMatrix::zeros();
        for k in 0..3 {
            j[(k, i + k)] = 1.0;
        }
        j[(2, i)] = self.curvature * x[i];
        j
    }

    fn foot_position_hessians(&self, foot: usize, _x: &SVector<f64, S>) -> [SMatrix<f64, S, S>; 3] {
        let i = 3 * foot;
        let mut hz = SMatrix::zeros();
        hz[(i, i)] = self.curvature;
        [SMatrix::zeros(), SMatrix::zeros(), hz]
    }

    fn foot_velocity(
        &self,
        foot: usize,
        _x: &SVector<f64, S>,
        u: &SVector<f64, I>,
    ) -> Vector3<f64> {
        let i = 3 * self.num_feet + 3 * foot;
        Vector3::new(u[i], u[i + 1], u[i + 2])
    }

    fn foot_velocity_jacobians(
        &self,
        foot: usize,
        _x: &SVector<f64, S>,
        _u: &SVector<f64, I>,
    ) -> (SMatrix<f64, 3, S>, SMatrix<f64, 3, I>) {
        let i = 3 * self.num_feet + 3 * foot;
        let mut ju = SMatrix::zeros();
        for k in 0..3 {
            ju[(k, i + k)] = 1.0;
        }
        (SMatrix::zeros(), ju)
    }

    fn contact_force_index(&self, foot: usize) -> usize {
        3 * foot
    }
}

// ---------------------------------------------------------------------------
// FlatGround
// ---------------------------------------------------------------------------

/// Unbounded ground plane at `z = 0`: one row `p_z >= 0` per foot.
#[derive(Clone, Copy, Debug, Default)]
pub struct FlatGround;

impl TerrainModel for FlatGround {
    fn polytope(&self, _foot: usize, _mode: ContactMode) -> ConvexPolygon {
        ConvexPolygon::default()
    }

    fn halfspaces(&self, _foot: usize, _mode: ContactMode) -> Result<Halfspaces, GeometryError> {
        Ok(Halfspaces::flat_ground())
    }
}

// ---------------------------------------------------------------------------
// ConstantSwingReference
// ---------------------------------------------------------------------------

/// Same swing height and vertical velocity for every foot at every time.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConstantSwingReference {
    pub position: f64,
    pub velocity: f64,
}

impl ConstantSwingReference {
    pub const fn new(position: f64, velocity: f64) -> Self {
        Self { position, velocity }
    }
}

impl SwingReferenceProvider for ConstantSwingReference {
    fn position(&self, _foot: usize, _time: f64) -> f64 {
        self.position
    }

    fn velocity(&self, _foot: usize, _time: f64) -> f64 {
        self.velocity
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
