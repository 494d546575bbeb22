//! Affine inequalities on a foot position: `h = Ab[:, 0..3] · p(x) + Ab[:, 3] ≥ 0`.

use nalgebra::{DMatrix, DVector, SMatrix, SVector, Vector3};
use stride_core::ConstraintError;

use crate::approximation::{LinearApproximation, QuadraticApproximation};
use crate::kinematics::KinematicsModel;

/// Stacked rows `[n_x, n_y, n_z, c]`.
#[derive(Clone, Debug, PartialEq)]
pub struct EndEffectorPositionConfig {
    pub ab: DMatrix<f64>,
}

impl Default for EndEffectorPositionConfig {
    fn default() -> Self {
        Self {
            ab: DMatrix::zeros(0, 4),
        }
    }
}

impl EndEffectorPositionConfig {
    pub const fn new(ab: DMatrix<f64>) -> Self {
        Self { ab }
    }

    pub fn num_rows(&self) -> usize {
        self.ab.nrows()
    }

    pub(crate) fn check_shape(&self, name: &str) -> Result<(), ConstraintError> {
        if self.ab.ncols() != 4 {
            return Err(ConstraintError::ShapeMismatch {
                name: name.to_string(),
                what: "Ab",
                got_rows: self.ab.nrows(),
                got_cols: self.ab.ncols(),
                expected: "r x 4".into(),
            });
        }
        Ok(())
    }

    fn row_value(&self, r: usize, p: &Vector3<f64>) -> f64 {
        let ab = &self.ab;
        ab[(r, 0)] * p.x + ab[(r, 1)] * p.y + ab[(r, 2)] * p.z + ab[(r, 3)]
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EndEffectorPosition {
    foot: usize,
    config: EndEffectorPositionConfig,
}

impl EndEffectorPosition {
    pub fn new(foot: usize) -> Self {
        Self {
            foot,
            config: EndEffectorPositionConfig::default(),
        }
    }

    pub const fn foot(&self) -> usize {
        self.foot
    }

    pub const fn config(&self) -> &EndEffectorPositionConfig {
        &self.config
    }

    pub(crate) fn set_config(&mut self, config: EndEffectorPositionConfig) {
        self.config = config;
    }

    pub fn num_constraints(&self) -> usize {
        self.config.num_rows()
    }

    pub fn value<const S: usize, const I: usize>(
        &self,
        kinematics: &dyn KinematicsModel<S, I>,
        x: &SVector<f64, S>,
    ) -> DVector<f64> {
        let p = kinematics.foot_position(self.foot, x);
        DVector::from_fn(self.num_constraints(), |r, _| self.config.row_value(r, &p))
    }

    pub fn linear_approximation<const S: usize, const I: usize>(
        &self,
        kinematics: &dyn KinematicsModel<S, I>,
        x: &SVector<f64, S>,
    ) -> LinearApproximation<S, I> {
        let rows = self.num_constraints();
        let p = kinematics.foot_position(self.foot, x);
        let jacobian = kinematics.foot_position_jacobian(self.foot, x);
        let ab = &self.config.ab;

        let mut linear = LinearApproximation::zeros(rows);
        for r in 0..rows {
            linear.value[r] = self.config.row_value(r, &p);
            for c in 0..S {
                linear.derivative_state[(r, c)] =
                    (0..3).map(|k| ab[(r, k)] * jacobian[(k, c)]).sum();
            }
        }
        linear
    }

    pub fn quadratic_approximation<const S: usize, const I: usize>(
        &self,
        kinematics: &dyn KinematicsModel<S, I>,
        x: &SVector<f64, S>,
    ) -> QuadraticApproximation<S, I> {
        let rows = self.num_constraints();
        let p = kinematics.foot_position(self.foot, x);
        let jacobian = kinematics.foot_position_jacobian(self.foot, x);
        let hessians = kinematics.foot_position_hessians(self.foot, x);
        let ab = &self.config.ab;

        let mut quadratic = QuadraticApproximation::with_capacity(rows);
        for r in 0..rows {
            let mut gradient = SVector::<f64, S>::zeros();
            let mut hessian = SMatrix::<f64, S, S>::zeros();
            for k in 0..3 {
                gradient += jacobian.row(k).transpose() * ab[(r, k)];
                hessian += hessians[k] * ab[(r, k)];
            }
            quadratic.push_first_order(self.config.row_value(r, &p), gradient, SVector::zeros());
            quadratic.second_derivatives_state[r] = hessian;
        }
        quadratic
    }
}
