//! Swing feet carry no load: `g = F_foot(u) = 0`.

use nalgebra::{DVector, SVector};

use super::contact_force;
use crate::approximation::LinearApproximation;
use crate::kinematics::KinematicsModel;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZeroForce {
    foot: usize,
}

impl ZeroForce {
    pub const fn new(foot: usize) -> Self {
        Self { foot }
    }

    pub const fn foot(&self) -> usize {
        self.foot
    }

    pub const fn num_constraints(&self) -> usize {
        3
    }

    pub fn value<const S: usize, const I: usize>(
        &self,
        kinematics: &dyn KinematicsModel<S, I>,
        u: &SVector<f64, I>,
    ) -> DVector<f64> {
        let force = contact_force(u, kinematics.contact_force_index(self.foot));
        DVector::from_column_slice(force.as_slice())
    }

    pub fn linear_approximation<const S: usize, const I: usize>(
        &self,
        kinematics: &dyn KinematicsModel<S, I>,
        u: &SVector<f64, I>,
    ) -> LinearApproximation<S, I> {
        let index = kinematics.contact_force_index(self.foot);
        let mut linear = LinearApproximation::zeros(3);
        for k in 0..3 {
            linear.value[k] = u[index + k];
            linear.derivative_input[(k, index + k)] = 1.0;
        }
        linear
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terms::test_support::leg;

    #[test]
    fn identity_block_on_force_entries() {
        let u = SVector::<f64, 6>::from_column_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let lin = ZeroForce::new(1).linear_approximation(leg(), &u);
        assert_eq!(lin.value.as_slice(), &[4.0, 5.0, 6.0]);
        for k in 0..3 {
            for c in 0..6 {
                let expected = if c == 3 + k { 1.0 } else { 0.0 };
                assert_eq!(lin.derivative_input[(k, c)], expected);
            }
        }
        assert!(lin.derivative_state.iter().all(|&d| d == 0.0));
    }

    #[test]
    fn value_matches_linear_value() {
        let u = SVector::<f64, 6>::from_column_slice(&[0.5, -0.5, 9.0, 0.0, 0.0, 0.0]);
        let term = ZeroForce::new(0);
        assert_eq!(term.value(leg(), &u), term.linear_approximation(leg(), &u).value);
    }
}
