//! Affine equalities on a foot velocity: `g = A · v(x, u) + b = 0`.

use nalgebra::{DMatrix, DVector, SVector, Vector3};
use stride_core::ConstraintError;

use crate::approximation::LinearApproximation;
use crate::kinematics::KinematicsModel;

#[derive(Clone, Debug, PartialEq)]
pub struct EndEffectorVelocityConfig {
    /// `r × 3`
    pub a: DMatrix<f64>,
    pub b: DVector<f64>,
}

impl Default for EndEffectorVelocityConfig {
    fn default() -> Self {
        Self {
            a: DMatrix::zeros(0, 3),
            b: DVector::zeros(0),
        }
    }
}

impl EndEffectorVelocityConfig {
    pub const fn new(a: DMatrix<f64>, b: DVector<f64>) -> Self {
        Self { a, b }
    }

    /// All three velocity axes pinned to zero.
    pub fn zero_velocity() -> Self {
        Self::new(DMatrix::identity(3, 3), DVector::zeros(3))
    }

    /// Vertical velocity pinned to `vz`.
    pub fn vertical(vz: f64) -> Self {
        Self::new(
            DMatrix::from_row_slice(1, 3, &[0.0, 0.0, 1.0]),
            DVector::from_element(1, -vz),
        )
    }

    pub fn num_rows(&self) -> usize {
        self.a.nrows()
    }

    pub(crate) fn check_shape(&self, name: &str) -> Result<(), ConstraintError> {
        if self.a.ncols() != 3 {
            return Err(ConstraintError::ShapeMismatch {
                name: name.to_string(),
                what: "A",
                got_rows: self.a.nrows(),
                got_cols: self.a.ncols(),
                expected: "r x 3".into(),
            });
        }
        if self.b.len() != self.a.nrows() {
            return Err(ConstraintError::ShapeMismatch {
                name: name.to_string(),
                what: "b",
                got_rows: self.b.len(),
                got_cols: 1,
                expected: format!("{} x 1", self.a.nrows()),
            });
        }
        Ok(())
    }

    fn row_value(&self, r: usize, v: &Vector3<f64>) -> f64 {
        let a = &self.a;
        a[(r, 0)] * v.x + a[(r, 1)] * v.y + a[(r, 2)] * v.z + self.b[r]
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EndEffectorVelocity {
    foot: usize,
    config: EndEffectorVelocityConfig,
}

impl EndEffectorVelocity {
    pub fn new(foot: usize) -> Self {
        Self {
            foot,
            config: EndEffectorVelocityConfig::default(),
        }
    }

    pub const fn foot(&self) -> usize {
        self.foot
    }

    pub const fn config(&self) -> &EndEffectorVelocityConfig {
        &self.config
    }

    pub(crate) fn set_config(&mut self, config: EndEffectorVelocityConfig) {
        self.config = config;
    }

    pub fn num_constraints(&self) -> usize {
        self.config.num_rows()
    }

    pub fn value<const S: usize, const I: usize>(
        &self,
        kinematics: &dyn KinematicsModel<S, I>,
        x: &SVector<f64, S>,
        u: &SVector<f64, I>,
    ) -> DVector<f64> {
        let v = kinematics.foot_velocity(self.foot, x, u);
        DVector::from_fn(self.num_constraints(), |r, _| self.config.row_value(r, &v))
    }

    pub fn linear_approximation<const S: usize, const I: usize>(
        &self,
        kinematics: &dyn KinematicsModel<S, I>,
        x: &SVector<f64, S>,
        u: &SVector<f64, I>,
    ) -> LinearApproximation<S, I> {
        let rows = self.num_constraints();
        let v = kinematics.foot_velocity(self.foot, x, u);
        let (jx, ju) = kinematics.foot_velocity_jacobians(self.foot, x, u);
        let a = &self.config.a;

        let mut linear = LinearApproximation::zeros(rows);
        for r in 0..rows {
            linear.value[r] = self.config.row_value(r, &v);
            for c in 0..S {
                linear.derivative_state[(r, c)] = (0..3).map(|k| a[(r, k)] * jx[(k, c)]).sum();
            }
            for c in 0..I {
                linear.derivative_input[(r, c)] = (0..3).map(|k| a[(r, k)] * ju[(k, c)]).sum();
            }
        }
        linear
    }
}
