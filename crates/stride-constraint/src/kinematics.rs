//! Kinematic model interface.
//!
//! Forward kinematics and its Jacobians are a black box to the engine: the
//! constraint terms only consume foot positions, foot velocities and the
//! location of each foot's contact force inside the input vector.

use nalgebra::{SMatrix, SVector, Vector3};

/// World-frame foot kinematics over state `x ∈ R^S` and input `u ∈ R^I`.
pub trait KinematicsModel<const S: usize, const I: usize>: Send + Sync {
    /// Number of contact points the model describes.
    fn num_feet(&self) -> usize;

    /// Foot position `p(x)`.
    fn foot_position(&self, foot: usize, x: &SVector<f64, S>) -> Vector3<f64>;

    /// `∂p/∂x`, one row per axis.
    fn foot_position_jacobian(&self, foot: usize, x: &SVector<f64, S>) -> SMatrix<f64, 3, S>;

    /// `∂²p_k/∂x²` for `k = x, y, z`.
    ///
    /// Defaults to zero, which gives the Gauss-Newton approximation of the
    /// position-constraint Hessian.
    fn foot_position_hessians(
        &self,
        _foot: usize,
        _x: &SVector<f64, S>,
    ) -> [SMatrix<f64, S, S>; 3] {
        [SMatrix::zeros(); 3]
    }

    /// Foot velocity `v(x, u)`.
    fn foot_velocity(&self, foot: usize, x: &SVector<f64, S>, u: &SVector<f64, I>) -> Vector3<f64>;

    /// `(∂v/∂x, ∂v/∂u)`.
    fn foot_velocity_jacobians(
        &self,
        foot: usize,
        x: &SVector<f64, S>,
        u: &SVector<f64, I>,
    ) -> (SMatrix<f64, 3, S>, SMatrix<f64, 3, I>);

    /// Offset of the foot's `[F_x, F_y, F_z]` block inside `u`.
    fn contact_force_index(&self, foot: usize) -> usize;
}
