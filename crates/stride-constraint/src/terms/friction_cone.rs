//! Regularized Coulomb friction cone on one foot's contact force.
//!
//! `h = μ (F_z + F_grip) − sqrt(F_x² + F_y² + ε) ≥ 0`
//!
//! The regularization `ε` keeps the cone smooth at zero tangential force, so
//! the Hessian is bounded everywhere.

use nalgebra::{DVector, Matrix3, SMatrix, SVector, Vector3};
use stride_core::ConstraintOptions;

use super::contact_force;
use crate::approximation::{LinearApproximation, QuadraticApproximation};
use crate::kinematics::KinematicsModel;

/// Cone parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrictionConeConfig {
    /// Friction coefficient `μ`.
    pub friction_coefficient: f64,
    /// Smoothing term `ε` under the square root (N²).
    pub regularization: f64,
    /// Extra normal force the foot can pull with (N).
    pub gripper_force: f64,
}

impl Default for FrictionConeConfig {
    fn default() -> Self {
        Self::from_options(&ConstraintOptions::default())
    }
}

impl FrictionConeConfig {
    pub const fn from_options(options: &ConstraintOptions) -> Self {
        Self {
            friction_coefficient: options.friction_coefficient,
            regularization: options.friction_regularization,
            gripper_force: options.gripper_force,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FrictionCone {
    foot: usize,
    config: FrictionConeConfig,
}

impl FrictionCone {
    pub const fn new(foot: usize, config: FrictionConeConfig) -> Self {
        Self { foot, config }
    }

    pub const fn foot(&self) -> usize {
        self.foot
    }

    pub const fn config(&self) -> &FrictionConeConfig {
        &self.config
    }

    pub(crate) const fn set_config(&mut self, config: FrictionConeConfig) {
        self.config = config;
    }

    pub const fn num_constraints(&self) -> usize {
        1
    }

    /// Cone value, gradient and Hessian w.r.t. `[F_x, F_y, F_z]`.
    fn cone(&self, force: &Vector3<f64>) -> (f64, Vector3<f64>, Matrix3<f64>) {
        let FrictionConeConfig {
            friction_coefficient: mu,
            regularization: eps,
            gripper_force,
        } = self.config;
        let (fx, fy, fz) = (force.x, force.y, force.z);

        let norm = (fx * fx + fy * fy + eps).sqrt();
        let norm3 = norm * norm * norm;
        let value = mu * (fz + gripper_force) - norm;
        let gradient = Vector3::new(-fx / norm, -fy / norm, mu);

        let mut hessian = Matrix3::zeros();
        hessian[(0, 0)] = -(fy * fy + eps) / norm3;
        hessian[(0, 1)] = fx * fy / norm3;
        hessian[(1, 0)] = fx * fy / norm3;
        hessian[(1, 1)] = -(fx * fx + eps) / norm3;

        (value, gradient, hessian)
    }

    pub fn value<const S: usize, const I: usize>(
        &self,
        kinematics: &dyn KinematicsModel<S, I>,
        u: &SVector<f64, I>,
    ) -> DVector<f64> {
        let force = contact_force(u, kinematics.contact_force_index(self.foot));
        DVector::from_element(1, self.cone(&force).0)
    }

    pub fn linear_approximation<const S: usize, const I: usize>(
        &self,
        kinematics: &dyn KinematicsModel<S, I>,
        u: &SVector<f64, I>,
    ) -> LinearApproximation<S, I> {
        let index = kinematics.contact_force_index(self.foot);
        let (value, gradient, _) = self.cone(&contact_force(u, index));

        let mut linear = LinearApproximation::zeros(1);
        linear.value[0] = value;
        for k in 0..3 {
            linear.derivative_input[(0, index + k)] = gradient[k];
        }
        linear
    }

    pub fn quadratic_approximation<const S: usize, const I: usize>(
        &self,
        kinematics: &dyn KinematicsModel<S, I>,
        u: &SVector<f64, I>,
    ) -> QuadraticApproximation<S, I> {
        let index = kinematics.contact_force_index(self.foot);
        let (value, gradient, hessian) = self.cone(&contact_force(u, index));

        let mut derivative_input = SVector::<f64, I>::zeros();
        let mut second_derivatives_input = SMatrix::<f64, I, I>::zeros();
        for r in 0..3 {
            derivative_input[index + r] = gradient[r];
            for c in 0..3 {
                second_derivatives_input[(index + r, index + c)] = hessian[(r, c)];
            }
        }

        let mut quadratic = QuadraticApproximation::with_capacity(1);
        quadratic.push_first_order(value, SVector::zeros(), derivative_input);
        quadratic.second_derivatives_input[0] = second_derivatives_input;
        quadratic
    }
}
