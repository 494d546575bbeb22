//! Switched constraint engine.
//!
//! Once per solver evaluation, [`SwitchedConstraintEngine::set_current_state_and_control`]
//! resolves the contact mode at `t`, switches every foot's terms on or off and
//! rewrites their payloads. Afterwards the solver reads counts and values, and
//! asks for derivatives as often as it likes: approximations are computed on
//! the first request and reused until the next evaluation point is set.
//!
//! Per foot `i`, with `s` the position weight and `w` the velocity weight:
//!
//! | Term | Stance | Swing |
//! |---|---|---|
//! | `FrictionCone` | active | inactive |
//! | `ZeroForce` | inactive | active |
//! | `EEPos` (band) | terrain rows `· s` | `w·z_ref <= p_z <= z_ref / w` |
//! | `EEPos` (hard equality) | terrain rows `· s` | inactive |
//! | `EEVel` (band) | `v = 0` | inactive |
//! | `EEVel` (hard equality) | `v = 0` | `v_z = v_ref` |

use std::sync::Arc;

use nalgebra::{DMatrix, DVector, SMatrix, SVector};
use stride_core::{
    ConstraintError, ConstraintOptions, ContactFlags, ContactMode, PositionPolicy, StrideError,
};
use tracing::{debug, trace};

use crate::approximation::{LinearApproximation, QuadraticApproximation};
use crate::collection::ConstraintCollection;
use crate::kinematics::KinematicsModel;
use crate::schedule::ModeSchedule;
use crate::swing::SwingReferenceProvider;
use crate::terms::{
    ConstraintTerm, EndEffectorPosition, EndEffectorPositionConfig, EndEffectorVelocity,
    EndEffectorVelocityConfig, FrictionCone, FrictionConeConfig, TermConfig, TermKind, ZeroForce,
};
use crate::terrain::TerrainModel;

/// Term names of one foot.
#[derive(Clone, Debug)]
struct FootTermNames {
    friction_cone: String,
    position: String,
    zero_force: String,
    velocity: String,
}

impl FootTermNames {
    fn new(foot: &str) -> Self {
        Self {
            friction_cone: format!("{foot}_FrictionCone"),
            position: format!("{foot}_EEPos"),
            zero_force: format!("{foot}_ZeroForce"),
            velocity: format!("{foot}_EEVel"),
        }
    }
}

/// Everything tied to one `(t, x, u)`.
#[derive(Clone, Debug)]
struct EvaluationContext<const S: usize, const I: usize> {
    time: f64,
    state: SVector<f64, S>,
    input: SVector<f64, I>,
    mode: ContactMode,
    flags: ContactFlags,
    equality: Option<LinearApproximation<S, I>>,
    inequality: Option<QuadraticApproximation<S, I>>,
}

/// Mode-dependent equality and inequality constraints of a legged robot.
///
/// Collaborators are shared read-only; cloning an engine deep-copies its
/// collections and caches, so each solver thread can own one.
#[derive(Clone)]
pub struct SwitchedConstraintEngine<const S: usize, const I: usize> {
    options: ConstraintOptions,
    kinematics: Arc<dyn KinematicsModel<S, I>>,
    schedule: Arc<dyn ModeSchedule>,
    terrain: Arc<dyn TerrainModel>,
    swing: Arc<dyn SwingReferenceProvider>,
    term_names: Vec<FootTermNames>,
    equality: ConstraintCollection,
    inequality: ConstraintCollection,
    context: Option<EvaluationContext<S, I>>,
    last_mode: Option<ContactMode>,
}

impl<const S: usize, const I: usize> SwitchedConstraintEngine<S, I> {
    /// Build the engine and register every foot's terms.
    ///
    /// Fails on invalid options, when the kinematics model disagrees on the
    /// number of feet, or when a foot's force block does not fit in `u`.
    pub fn new(
        options: ConstraintOptions,
        kinematics: Arc<dyn KinematicsModel<S, I>>,
        schedule: Arc<dyn ModeSchedule>,
        terrain: Arc<dyn TerrainModel>,
        swing: Arc<dyn SwingReferenceProvider>,
    ) -> Result<Self, StrideError> {
        options.validate()?;
        let num_feet = options.num_feet();
        if kinematics.num_feet() != num_feet {
            return Err(ConstraintError::FootCountMismatch {
                configured: num_feet,
                reported: kinematics.num_feet(),
                source_name: "kinematics model",
            }
            .into());
        }

        let cone_config = FrictionConeConfig::from_options(&options);
        let term_names: Vec<FootTermNames> =
            options.feet.iter().map(|name| FootTermNames::new(name)).collect();
        let mut equality = ConstraintCollection::new();
        let mut inequality = ConstraintCollection::new();

        for (foot, names) in term_names.iter().enumerate() {
            let force_index = kinematics.contact_force_index(foot);
            if force_index + 3 > I {
                return Err(ConstraintError::ShapeMismatch {
                    name: names.zero_force.clone(),
                    what: "contact force block",
                    got_rows: force_index,
                    got_cols: 3,
                    expected: format!("offset + 3 <= {I}"),
                }
                .into());
            }

            inequality.add(ConstraintTerm::new(
                names.friction_cone.as_str(),
                TermKind::FrictionCone(FrictionCone::new(foot, cone_config)),
            ))?;
            inequality.add(ConstraintTerm::new(
                names.position.as_str(),
                TermKind::EndEffectorPosition(EndEffectorPosition::new(foot)),
            ))?;
            equality.add(ConstraintTerm::new(
                names.zero_force.as_str(),
                TermKind::ZeroForce(ZeroForce::new(foot)),
            ))?;
            equality.add(ConstraintTerm::new(
                names.velocity.as_str(),
                TermKind::EndEffectorVelocity(EndEffectorVelocity::new(foot)),
            ))?;
        }

        debug!(
            feet = num_feet,
            policy = ?options.position_policy,
            "switched constraint engine ready"
        );

        Ok(Self {
            options,
            kinematics,
            schedule,
            terrain,
            swing,
            term_names,
            equality,
            inequality,
            context: None,
            last_mode: None,
        })
    }

    /// Set the evaluation point and reconfigure every term for the mode
    /// active at `time`.
    ///
    /// On error the engine holds no evaluation point until the next
    /// successful call.
    pub fn set_current_state_and_control(
        &mut self,
        time: f64,
        state: &SVector<f64, S>,
        input: &SVector<f64, I>,
    ) -> Result<(), StrideError> {
        self.context = None;

        let mode = self.schedule.active_mode(time);
        let flags = self.schedule.stance_flags(mode)?;
        if flags.len() != self.num_feet() {
            return Err(ConstraintError::FootCountMismatch {
                configured: self.num_feet(),
                reported: flags.len(),
                source_name: "mode schedule",
            }
            .into());
        }

        if self.last_mode != Some(mode) {
            debug!(
                time,
                from = ?self.last_mode.map(ContactMode::value),
                to = mode.value(),
                "contact mode switch"
            );
            self.last_mode = Some(mode);
        }

        for foot in 0..self.num_feet() {
            self.update_foot(foot, time, mode, flags.is_stance(foot))?;
        }

        self.context = Some(EvaluationContext {
            time,
            state: *state,
            input: *input,
            mode,
            flags,
            equality: None,
            inequality: None,
        });
        Ok(())
    }

    fn update_foot(
        &mut self,
        foot: usize,
        time: f64,
        mode: ContactMode,
        stance: bool,
    ) -> Result<(), StrideError> {
        let policy = self.options.position_policy;
        let position_rows = self.position_rows(foot, time, mode, stance)?;
        let velocity = if stance {
            EndEffectorVelocityConfig::zero_velocity()
        } else {
            EndEffectorVelocityConfig::vertical(self.swing.velocity(foot, time))
        };
        let (position_active, velocity_active) = match policy {
            PositionPolicy::HardEquality => (stance, true),
            PositionPolicy::InequalityBand => (true, stance),
        };

        let names = &self.term_names[foot];
        self.inequality.set_activity(&names.friction_cone, stance)?;
        self.inequality.configure(
            &names.position,
            TermConfig::EndEffectorPosition(EndEffectorPositionConfig::new(position_rows)),
        )?;
        self.inequality.set_activity(&names.position, position_active)?;
        self.equality.set_activity(&names.zero_force, !stance)?;
        self.equality
            .configure(&names.velocity, TermConfig::EndEffectorVelocity(velocity))?;
        self.equality.set_activity(&names.velocity, velocity_active)?;
        Ok(())
    }

    /// `Ab` rows of the position term for one foot.
    fn position_rows(
        &self,
        foot: usize,
        time: f64,
        mode: ContactMode,
        stance: bool,
    ) -> Result<DMatrix<f64>, StrideError> {
        let s = self.options.z_direction_position_weight;
        let band = self.options.position_policy == PositionPolicy::InequalityBand;

        if stance {
            let mut ab = self.terrain.halfspaces(foot, mode)?.to_constraint_rows(s);
            if band && self.options.terrain_inequality {
                let m = ab.nrows();
                ab = ab.insert_rows(m, 2, 0.0);
                ab[(m, 2)] = s;
                ab[(m + 1, 2)] = -s;
            }
            return Ok(ab);
        }
        if !band {
            return Ok(DMatrix::zeros(0, 4));
        }

        let w = self.options.z_direction_velocity_weight;
        let z = self.swing.position(foot, time);
        Ok(DMatrix::from_row_slice(
            2,
            4,
            &[0.0, 0.0, s, -w * s * z, 0.0, 0.0, -s, s * z / w],
        ))
    }

    fn context(&self) -> Result<&EvaluationContext<S, I>, ConstraintError> {
        self.context.as_ref().ok_or(ConstraintError::NotConfigured)
    }

    // -- counts ------------------------------------------------------------

    /// Active equality rows.
    ///
    /// Counts describe the configuration of the last evaluation point; `time`
    /// is expected to match it.
    pub fn num_equality_constraints(&self, _time: f64) -> Result<usize, ConstraintError> {
        self.context()?;
        Ok(self.equality.num_constraints())
    }

    /// Active inequality rows.
    pub fn num_inequality_constraints(&self, _time: f64) -> Result<usize, ConstraintError> {
        self.context()?;
        Ok(self.inequality.num_constraints())
    }

    /// This model has no state-only constraints.
    pub const fn num_state_only_constraints(&self, _time: f64) -> usize {
        0
    }

    pub const fn num_state_only_final_constraints(&self, _time: f64) -> usize {
        0
    }

    // -- values ------------------------------------------------------------

    pub fn equality_value(&self) -> Result<DVector<f64>, ConstraintError> {
        let context = self.context()?;
        Ok(self
            .equality
            .value(self.kinematics.as_ref(), &context.state, &context.input))
    }

    pub fn inequality_value(&self) -> Result<DVector<f64>, ConstraintError> {
        let context = self.context()?;
        Ok(self
            .inequality
            .value(self.kinematics.as_ref(), &context.state, &context.input))
    }

    // -- approximations ----------------------------------------------------

    /// Equality value and Jacobians, computed once per evaluation point.
    pub fn equality_linear_approximation(
        &mut self,
    ) -> Result<&LinearApproximation<S, I>, ConstraintError> {
        let EvaluationContext {
            time,
            state,
            input,
            equality,
            ..
        } = self.context.as_mut().ok_or(ConstraintError::NotConfigured)?;
        let collection = &self.equality;
        let kinematics = self.kinematics.as_ref();
        Ok(equality.get_or_insert_with(|| {
            trace!(
                time = *time,
                rows = collection.num_constraints(),
                "computing equality linear approximation"
            );
            collection.linear_approximation(kinematics, state, input)
        }))
    }

    /// Inequality value, gradients and Hessians, computed once per evaluation point.
    pub fn inequality_quadratic_approximation(
        &mut self,
    ) -> Result<&QuadraticApproximation<S, I>, ConstraintError> {
        let EvaluationContext {
            time,
            state,
            input,
            inequality,
            ..
        } = self.context.as_mut().ok_or(ConstraintError::NotConfigured)?;
        let collection = &self.inequality;
        let kinematics = self.kinematics.as_ref();
        Ok(inequality.get_or_insert_with(|| {
            trace!(
                time = *time,
                rows = collection.num_constraints(),
                "computing inequality quadratic approximation"
            );
            collection.quadratic_approximation(kinematics, state, input)
        }))
    }

    /// `∂g/∂x`, `rows × S`.
    pub fn equality_jacobian_state(&mut self) -> Result<&DMatrix<f64>, ConstraintError> {
        Ok(&self.equality_linear_approximation()?.derivative_state)
    }

    /// `∂g/∂u`, `rows × I`.
    pub fn equality_jacobian_input(&mut self) -> Result<&DMatrix<f64>, ConstraintError> {
        Ok(&self.equality_linear_approximation()?.derivative_input)
    }

    /// Per-row `∂h/∂x`.
    pub fn inequality_jacobian_state(&mut self) -> Result<&[SVector<f64, S>], ConstraintError> {
        Ok(self.inequality_quadratic_approximation()?.derivative_state.as_slice())
    }

    /// Per-row `∂h/∂u`.
    pub fn inequality_jacobian_input(&mut self) -> Result<&[SVector<f64, I>], ConstraintError> {
        Ok(self.inequality_quadratic_approximation()?.derivative_input.as_slice())
    }

    pub fn inequality_hessian_state(
        &mut self,
    ) -> Result<&[SMatrix<f64, S, S>], ConstraintError> {
        Ok(self.inequality_quadratic_approximation()?.second_derivatives_state.as_slice())
    }

    pub fn inequality_hessian_input(
        &mut self,
    ) -> Result<&[SMatrix<f64, I, I>], ConstraintError> {
        Ok(self.inequality_quadratic_approximation()?.second_derivatives_input.as_slice())
    }

    /// Per-row `∂²h/∂u∂x`, `I × S`.
    pub fn inequality_hessian_cross(
        &mut self,
    ) -> Result<&[SMatrix<f64, I, S>], ConstraintError> {
        Ok(self.inequality_quadratic_approximation()?.derivatives_input_state.as_slice())
    }

    /// Sensitivity of the equality values to each event time of the schedule.
    ///
    /// Swing references carry no switch-time derivatives, so every vector is
    /// zero.
    pub fn equality_event_time_derivatives(&self) -> Result<Vec<DVector<f64>>, ConstraintError> {
        self.context()?;
        let rows = self.equality.num_constraints();
        Ok(vec![DVector::zeros(rows); self.schedule.num_event_times()])
    }

    // -- inspection --------------------------------------------------------

    pub fn num_feet(&self) -> usize {
        self.term_names.len()
    }

    pub const fn options(&self) -> &ConstraintOptions {
        &self.options
    }

    pub fn is_configured(&self) -> bool {
        self.context.is_some()
    }

    pub fn time(&self) -> Result<f64, ConstraintError> {
        Ok(self.context()?.time)
    }

    pub fn active_mode(&self) -> Result<ContactMode, ConstraintError> {
        Ok(self.context()?.mode)
    }

    pub fn stance_flags(&self) -> Result<&ContactFlags, ConstraintError> {
        Ok(&self.context()?.flags)
    }

    pub const fn equality_constraints(&self) -> &ConstraintCollection {
        &self.equality
    }

    pub const fn inequality_constraints(&self) -> &ConstraintCollection {
        &self.inequality
    }
}
