//! Constraint terms.
//!
//! The set of terms is closed: [`TermKind`] holds one variant per constraint
//! type and every evaluation dispatches with a `match`. Each variant owns its
//! typed payload, rewritten by the engine on every evaluation through
//! [`ConstraintTerm::configure`].
//!
//! | Term | Class | Rows |
//! |---|---|---|
//! | [`FrictionCone`] | inequality | 1 |
//! | [`EndEffectorPosition`] | inequality | rows of `Ab` |
//! | [`EndEffectorVelocity`] | equality | rows of `A` |
//! | [`ZeroForce`] | equality | 3 |

mod ee_position;
mod ee_velocity;
mod friction_cone;
mod zero_force;

pub use ee_position::{EndEffectorPosition, EndEffectorPositionConfig};
pub use ee_velocity::{EndEffectorVelocity, EndEffectorVelocityConfig};
pub use friction_cone::{FrictionCone, FrictionConeConfig};
pub use zero_force::ZeroForce;

use nalgebra::{DVector, SVector, Vector3};
use stride_core::ConstraintError;

use crate::approximation::{LinearApproximation, QuadraticApproximation};
use crate::kinematics::KinematicsModel;

/// Which side of the optimization problem a term belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConstraintClass {
    /// `g(x, u) = 0`
    Equality,
    /// `h(x, u) >= 0`
    Inequality,
}

/// Per-evaluation payload, one variant per configurable term.
#[derive(Clone, Debug, PartialEq)]
pub enum TermConfig {
    FrictionCone(FrictionConeConfig),
    EndEffectorPosition(EndEffectorPositionConfig),
    EndEffectorVelocity(EndEffectorVelocityConfig),
}

impl TermConfig {
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::FrictionCone(_) => "FrictionCone",
            Self::EndEffectorPosition(_) => "EndEffectorPosition",
            Self::EndEffectorVelocity(_) => "EndEffectorVelocity",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TermKind {
    FrictionCone(FrictionCone),
    EndEffectorPosition(EndEffectorPosition),
    EndEffectorVelocity(EndEffectorVelocity),
    ZeroForce(ZeroForce),
}

impl TermKind {
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::FrictionCone(_) => "FrictionCone",
            Self::EndEffectorPosition(_) => "EndEffectorPosition",
            Self::EndEffectorVelocity(_) => "EndEffectorVelocity",
            Self::ZeroForce(_) => "ZeroForce",
        }
    }

    pub const fn class(&self) -> ConstraintClass {
        match self {
            Self::FrictionCone(_) | Self::EndEffectorPosition(_) => ConstraintClass::Inequality,
            Self::EndEffectorVelocity(_) | Self::ZeroForce(_) => ConstraintClass::Equality,
        }
    }

    pub const fn foot(&self) -> usize {
        match self {
            Self::FrictionCone(term) => term.foot(),
            Self::EndEffectorPosition(term) => term.foot(),
            Self::EndEffectorVelocity(term) => term.foot(),
            Self::ZeroForce(term) => term.foot(),
        }
    }
}

/// A named term with its activity flag.
///
/// New terms start active.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstraintTerm {
    name: String,
    active: bool,
    kind: TermKind,
}

impl ConstraintTerm {
    pub fn new(name: impl Into<String>, kind: TermKind) -> Self {
        Self {
            name: name.into(),
            active: true,
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn kind(&self) -> &TermKind {
        &self.kind
    }

    pub const fn class(&self) -> ConstraintClass {
        self.kind.class()
    }

    pub const fn is_active(&self) -> bool {
        self.active
    }

    pub const fn set_activity(&mut self, active: bool) {
        self.active = active;
    }

    /// Replace the term's payload.
    ///
    /// The payload must match the term's variant and carry well-shaped
    /// matrices; on error the previous payload is kept.
    pub fn configure(&mut self, config: TermConfig) -> Result<(), ConstraintError> {
        match (&mut self.kind, config) {
            (TermKind::FrictionCone(term), TermConfig::FrictionCone(config)) => {
                term.set_config(config);
            }
            (TermKind::EndEffectorPosition(term), TermConfig::EndEffectorPosition(config)) => {
                config.check_shape(&self.name)?;
                term.set_config(config);
            }
            (TermKind::EndEffectorVelocity(term), TermConfig::EndEffectorVelocity(config)) => {
                config.check_shape(&self.name)?;
                term.set_config(config);
            }
            (kind, config) => {
                return Err(ConstraintError::ConfigMismatch {
                    name: self.name.clone(),
                    expected: kind.kind_name(),
                    got: config.kind_name(),
                });
            }
        }
        Ok(())
    }

    pub fn num_constraints(&self) -> usize {
        match &self.kind {
            TermKind::FrictionCone(term) => term.num_constraints(),
            TermKind::EndEffectorPosition(term) => term.num_constraints(),
            TermKind::EndEffectorVelocity(term) => term.num_constraints(),
            TermKind::ZeroForce(term) => term.num_constraints(),
        }
    }

    pub fn value<const S: usize, const I: usize>(
        &self,
        kinematics: &dyn KinematicsModel<S, I>,
        x: &SVector<f64, S>,
        u: &SVector<f64, I>,
    ) -> DVector<f64> {
        match &self.kind {
            TermKind::FrictionCone(term) => term.value(kinematics, u),
            TermKind::EndEffectorPosition(term) => term.value(kinematics, x),
            TermKind::EndEffectorVelocity(term) => term.value(kinematics, x, u),
            TermKind::ZeroForce(term) => term.value(kinematics, u),
        }
    }

    pub fn linear_approximation<const S: usize, const I: usize>(
        &self,
        kinematics: &dyn KinematicsModel<S, I>,
        x: &SVector<f64, S>,
        u: &SVector<f64, I>,
    ) -> LinearApproximation<S, I> {
        match &self.kind {
            TermKind::FrictionCone(term) => term.linear_approximation(kinematics, u),
            TermKind::EndEffectorPosition(term) => term.linear_approximation(kinematics, x),
            TermKind::EndEffectorVelocity(term) => term.linear_approximation(kinematics, x, u),
            TermKind::ZeroForce(term) => term.linear_approximation(kinematics, u),
        }
    }

    /// Equality terms are affine in the velocity and force, so their second
    /// derivatives are reported as zero.
    pub fn quadratic_approximation<const S: usize, const I: usize>(
        &self,
        kinematics: &dyn KinematicsModel<S, I>,
        x: &SVector<f64, S>,
        u: &SVector<f64, I>,
    ) -> QuadraticApproximation<S, I> {
        match &self.kind {
            TermKind::FrictionCone(term) => term.quadratic_approximation(kinematics, u),
            TermKind::EndEffectorPosition(term) => term.quadratic_approximation(kinematics, x),
            TermKind::EndEffectorVelocity(term) => {
                QuadraticApproximation::from_linear(&term.linear_approximation(kinematics, x, u))
            }
            TermKind::ZeroForce(term) => {
                QuadraticApproximation::from_linear(&term.linear_approximation(kinematics, u))
            }
        }
    }
}

/// `[F_x, F_y, F_z]` block of `u` starting at `index`.
fn contact_force<const I: usize>(u: &SVector<f64, I>, index: usize) -> Vector3<f64> {
    Vector3::new(u[index], u[index + 1], u[index + 2])
}
