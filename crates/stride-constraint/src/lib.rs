//! Switched contact constraints for legged-robot model-predictive control.
//!
//! The engine sits between a contact schedule and a numerical optimizer:
//!
//! 1. **Schedule**: resolves the contact mode (which feet touch the ground)
//!    active at a time `t`
//! 2. **Terms**: friction cone, zero force, foot position and foot velocity
//!    constraints, switched on or off per foot for that mode
//! 3. **Collections**: ordered equality and inequality sets aggregating the
//!    active terms row by row
//! 4. **Engine**: evaluates values, Jacobians and Hessians at `(t, x, u)` for
//!    the solver, caching derivatives per evaluation point
//!
//! # Conventions
//!
//! Equalities read `g(x, u) = 0`, inequalities `h(x, u) >= 0`. State and
//! input dimensions are const generics `S` and `I`. Aggregated outputs have
//! exactly as many rows as there are active constraints; row `k` of a value
//! vector and of every derivative refer to the same scalar constraint.
//!
//! Kinematics, terrain and swing references are supplied through the
//! [`KinematicsModel`], [`TerrainModel`] and [`SwingReferenceProvider`] traits.

pub mod approximation;
pub mod collection;
pub mod engine;
pub mod halfspace;
pub mod kinematics;
pub mod schedule;
pub mod swing;
pub mod terms;
pub mod terrain;

pub use approximation::{LinearApproximation, QuadraticApproximation};
pub use collection::ConstraintCollection;
pub use engine::SwitchedConstraintEngine;
pub use halfspace::{ConvexPolygon, Halfspaces, to_halfspaces};
pub use kinematics::KinematicsModel;
pub use schedule::{GaitType, ModeSchedule, ModeSequence};
pub use swing::{
    BezierSwingReference, SampledSwingReference, SwingReferenceProvider, swing_height,
    swing_height_rate,
};
pub use terms::{
    ConstraintClass, ConstraintTerm, EndEffectorPosition, EndEffectorPositionConfig,
    EndEffectorVelocity, EndEffectorVelocityConfig, FrictionCone, FrictionConeConfig, TermConfig,
    TermKind, ZeroForce,
};
pub use terrain::{StaticTerrain, TerrainModel};
