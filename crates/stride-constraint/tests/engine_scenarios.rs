//! Integration test: switched constraint engine against mock collaborators.
//!
//! Checks that:
//! 1. Term activity follows the contact schedule exactly at switch times
//! 2. Counts, values and derivatives always agree on the number of rows
//! 3. Derivative accessors are idempotent and order-independent
//! 4. Swing-band and velocity payloads carry the swing reference
//! 5. Analytic derivatives match finite differences of the values

use std::sync::Arc;

use approx::assert_relative_eq;
use nalgebra::{SVector, Vector3};
use rand::Rng;
use stride_constraint::{
    BezierSwingReference, ConvexPolygon, GaitType, ModeSchedule, ModeSequence, StaticTerrain,
    SwitchedConstraintEngine, TermKind, to_halfspaces,
};
use stride_core::{
    ConstraintError, ConstraintOptions, ContactFlags, ContactMode, PositionPolicy, ScheduleError,
    StrideError,
};
use stride_test_utils::{
    ConstantSwingReference, FlatGround, PointFootKinematics, init_test_tracing, random_vector,
    seeded_rng,
};

/// Quadruped: 4 feet × 3 position coordinates, 4 × (force + velocity).
const S: usize = 12;
const I: usize = 24;

type Quadruped = SwitchedConstraintEngine<S, I>;

fn quadruped(options: ConstraintOptions, schedule: Arc<dyn ModeSchedule>) -> Quadruped {
    SwitchedConstraintEngine::new(
        options,
        Arc::new(PointFootKinematics::<S, I>::new(4).with_curvature(0.5)),
        schedule,
        Arc::new(FlatGround),
        Arc::new(ConstantSwingReference::new(0.08, -0.2)),
    )
    .unwrap()
}

fn trot() -> Arc<dyn ModeSchedule> {
    Arc::new(ModeSequence::from_gait(GaitType::Trot, 0.0, 4).unwrap())
}

fn single_foot(
    options: ConstraintOptions,
    reference: ConstantSwingReference,
) -> SwitchedConstraintEngine<3, 6> {
    let schedule = ModeSequence::new(vec![0.5], vec![ContactMode(1), ContactMode(0)], 1).unwrap();
    SwitchedConstraintEngine::new(
        ConstraintOptions {
            feet: vec!["LF".into()],
            ..options
        },
        Arc::new(PointFootKinematics::<3, 6>::new(1)),
        Arc::new(schedule),
        Arc::new(FlatGround),
        Arc::new(reference),
    )
    .unwrap()
}

fn is_active(engine: &SwitchedConstraintEngine<3, 6>, name: &str) -> bool {
    engine
        .equality_constraints()
        .is_active(name)
        .or_else(|_| engine.inequality_constraints().is_active(name))
        .unwrap()
}

// ---------------------------------------------------------------------------
// Mode switching
// ---------------------------------------------------------------------------

#[test]
fn stance_to_swing_switches_exactly_at_event_time() {
    init_test_tracing();
    let mut engine = single_foot(
        ConstraintOptions {
            z_direction_position_weight: 0.0,
            ..ConstraintOptions::default()
        },
        ConstantSwingReference::new(0.1, 0.0),
    );
    let x = SVector::zeros();
    let u = SVector::zeros();

    engine.set_current_state_and_control(0.4999, &x, &u).unwrap();
    assert!(is_active(&engine, "LF_FrictionCone"));
    assert!(!is_active(&engine, "LF_ZeroForce"));
    assert_eq!(engine.num_equality_constraints(0.4999), Ok(3));

    engine.set_current_state_and_control(0.5, &x, &u).unwrap();
    assert!(!is_active(&engine, "LF_FrictionCone"));
    assert!(is_active(&engine, "LF_ZeroForce"));
    assert_eq!(engine.stance_flags().unwrap(), &ContactFlags::new(vec![false]));
    // Swing band rows only.
    assert_eq!(engine.num_inequality_constraints(0.5), Ok(2));
    assert_eq!(engine.num_equality_constraints(0.5), Ok(3));
}

#[test]
fn stance_iff_cone_iff_not_zero_force_over_trot() {
    let mut engine = quadruped(ConstraintOptions::default(), trot());
    let x = SVector::zeros();
    let u = SVector::zeros();
    let feet = ["LF", "RF", "LH", "RH"];

    for k in 0..140 {
        let t = f64::from(k) * 0.01;
        engine.set_current_state_and_control(t, &x, &u).unwrap();
        let flags = engine.stance_flags().unwrap().clone();
        for (foot, name) in feet.iter().enumerate() {
            let stance = flags.is_stance(foot);
            let cone = engine
                .inequality_constraints()
                .is_active(&format!("{name}_FrictionCone"))
                .unwrap();
            let zero_force = engine
                .equality_constraints()
                .is_active(&format!("{name}_ZeroForce"))
                .unwrap();
            assert_eq!(cone, stance, "t={t} foot={name}");
            assert_eq!(zero_force, !stance, "t={t} foot={name}");
        }
    }
}

#[test]
fn trot_keeps_diagonal_pairs_in_stance() {
    let mut engine = quadruped(ConstraintOptions::default(), trot());
    engine
        .set_current_state_and_control(0.2, &SVector::zeros(), &SVector::zeros())
        .unwrap();
    assert_eq!(engine.active_mode(), Ok(ContactMode(0b0110)));
    // Two stance feet: cone + ground row ; two swing feet: band (2 rows).
    assert_eq!(engine.num_inequality_constraints(0.2), Ok(8));
    // Two swing feet: zero force ; two stance feet: zero velocity.
    assert_eq!(engine.num_equality_constraints(0.2), Ok(12));
}

// ---------------------------------------------------------------------------
// Flat terrain and swing payloads
// ---------------------------------------------------------------------------

#[test]
fn four_feet_on_flat_terrain() {
    let schedule = Arc::new(ModeSequence::constant(ContactMode(15), 4).unwrap());
    let kin = PointFootKinematics::<S, I>::new(4);
    let mut engine = quadruped(ConstraintOptions::default(), schedule);
    let x = kin.state_at_height(0.0);
    let u = kin.input(Vector3::new(0.0, 0.0, 100.0), Vector3::zeros());

    engine.set_current_state_and_control(0.0, &x, &u).unwrap();
    assert_eq!(engine.num_inequality_constraints(0.0), Ok(8));

    let h = engine.inequality_value().unwrap();
    for foot in 0..4 {
        // Rows per foot: [cone, ground]
        assert_relative_eq!(h[2 * foot], 0.7 * 100.0 - 5.0, epsilon = 1e-12);
        assert_relative_eq!(h[2 * foot + 1], 0.0, epsilon = 1e-12);
    }

    let ab = match engine.inequality_constraints().get("RH_EEPos").unwrap().kind() {
        TermKind::EndEffectorPosition(term) => term.config().ab.clone(),
        other => panic!("unexpected kind {other:?}"),
    };
    assert_eq!(ab.shape(), (1, 4));
    assert_relative_eq!(ab[(0, 2)], 1.0);
    assert_relative_eq!(ab[(0, 3)], 0.0);
}

#[test]
fn swing_band_and_vertical_velocity_payload() {
    let z = 0.1;
    let mut engine = single_foot(
        ConstraintOptions {
            z_direction_position_weight: 1.0,
            z_direction_velocity_weight: 2.0,
            ..ConstraintOptions::default()
        },
        ConstantSwingReference::new(z, -1.0),
    );
    engine
        .set_current_state_and_control(1.0, &SVector::zeros(), &SVector::zeros())
        .unwrap();

    let TermKind::EndEffectorPosition(position) =
        engine.inequality_constraints().get("LF_EEPos").unwrap().kind()
    else {
        panic!("LF_EEPos is not a position term");
    };
    let ab = &position.config().ab;
    assert_eq!(ab.shape(), (2, 4));
    let expected = [[0.0, 0.0, 1.0, -2.0 * z], [0.0, 0.0, -1.0, z / 2.0]];
    for (r, row) in expected.iter().enumerate() {
        for (c, &value) in row.iter().enumerate() {
            assert_relative_eq!(ab[(r, c)], value, epsilon = 1e-15);
        }
    }

    let TermKind::EndEffectorVelocity(velocity) =
        engine.equality_constraints().get("LF_EEVel").unwrap().kind()
    else {
        panic!("LF_EEVel is not a velocity term");
    };
    assert_eq!(velocity.config().a.as_slice(), &[0.0, 0.0, 1.0]);
    assert_eq!(velocity.config().b.as_slice(), &[1.0]);
    // Band policy: velocity equality only in stance.
    assert!(!is_active(&engine, "LF_EEVel"));
}

#[test]
fn hard_equality_tracks_swing_velocity() {
    let mut engine = single_foot(
        ConstraintOptions {
            position_policy: PositionPolicy::HardEquality,
            ..ConstraintOptions::default()
        },
        ConstantSwingReference::new(0.1, -1.0),
    );
    let x = SVector::zeros();
    let mut u = SVector::<f64, 6>::zeros();
    u[5] = -1.0;

    engine.set_current_state_and_control(0.7, &x, &u).unwrap();
    assert!(is_active(&engine, "LF_EEVel"));
    assert!(!is_active(&engine, "LF_EEPos"));
    // Zero force (3) + vertical velocity (1)
    assert_eq!(engine.num_equality_constraints(0.7), Ok(4));
    assert_eq!(engine.num_inequality_constraints(0.7), Ok(0));

    let g = engine.equality_value().unwrap();
    assert_relative_eq!(g[3], 0.0, epsilon = 1e-12);
}

#[test]
fn terrain_polygon_restricts_stance_foot() {
    let mut terrain = StaticTerrain::default();
    for foot in 0..4 {
        terrain.set_polygon(foot, ConvexPolygon::rectangle(0.0, 0.0, 0.1, 0.2, 0.0));
    }
    let mut engine = SwitchedConstraintEngine::<S, I>::new(
        ConstraintOptions {
            terrain_inequality: true,
            ..ConstraintOptions::default()
        },
        Arc::new(PointFootKinematics::<S, I>::new(4)),
        Arc::new(ModeSequence::constant(ContactMode(15), 4).unwrap()),
        Arc::new(terrain),
        Arc::new(ConstantSwingReference::default()),
    )
    .unwrap();

    let mut x = SVector::<f64, S>::zeros();
    x[0] = 0.3; // LF outside the patch along x
    engine.set_current_state_and_control(0.0, &x, &SVector::zeros()).unwrap();
    // Per foot: cone + 4 edges + 2 vertical rows
    assert_eq!(engine.num_inequality_constraints(0.0), Ok(28));

    let h = engine.inequality_value().unwrap();
    let lf_edges = &h.as_slice()[1..5];
    assert!(lf_edges.iter().any(|&v| v < 0.0));
    let rf_edges = &h.as_slice()[8..12];
    assert!(rf_edges.iter().all(|&v| v > 0.0));
}

// ---------------------------------------------------------------------------
// Consistency
// ---------------------------------------------------------------------------

#[test]
fn rows_agree_across_counts_values_and_derivatives() {
    let mut engine = quadruped(ConstraintOptions::default(), trot());
    let mut rng = seeded_rng(7);
    let schedule = ModeSequence::from_gait(GaitType::Trot, 0.0, 4).unwrap();

    for _ in 0..50 {
        let t = rng.gen_range(-0.2..1.6);
        let x = random_vector::<S>(&mut rng, 0.3);
        let u = random_vector::<I>(&mut rng, 50.0);
        engine.set_current_state_and_control(t, &x, &u).unwrap();

        let n_eq = engine.num_equality_constraints(t).unwrap();
        let n_ineq = engine.num_inequality_constraints(t).unwrap();
        assert_eq!(engine.equality_value().unwrap().len(), n_eq);
        assert_eq!(engine.equality_jacobian_state().unwrap().shape(), (n_eq, S));
        assert_eq!(engine.equality_jacobian_input().unwrap().shape(), (n_eq, I));
        assert_eq!(engine.inequality_value().unwrap().len(), n_ineq);
        assert_eq!(engine.inequality_jacobian_state().unwrap().len(), n_ineq);
        assert_eq!(engine.inequality_jacobian_input().unwrap().len(), n_ineq);
        assert_eq!(engine.inequality_hessian_state().unwrap().len(), n_ineq);
        assert_eq!(engine.inequality_hessian_input().unwrap().len(), n_ineq);
        assert_eq!(engine.inequality_hessian_cross().unwrap().len(), n_ineq);

        let events = engine.equality_event_time_derivatives().unwrap();
        assert_eq!(events.len(), schedule.num_event_times());
        assert!(events.iter().all(|d| d.len() == n_eq && d.iter().all(|&v| v == 0.0)));

        assert_eq!(engine.num_state_only_constraints(t), 0);
        assert_eq!(engine.num_state_only_final_constraints(t), 0);
    }
}

#[test]
fn accessors_are_idempotent_and_order_independent() {
    let mut rng = seeded_rng(11);
    let x = random_vector::<S>(&mut rng, 0.3);
    let u = random_vector::<I>(&mut rng, 40.0);

    let mut first = quadruped(ConstraintOptions::default(), trot());
    first.set_current_state_and_control(0.3, &x, &u).unwrap();
    let mut second = first.clone();

    let hessian_a = first.inequality_hessian_input().unwrap().to_vec();
    let hessian_b = first.inequality_hessian_input().unwrap().to_vec();
    assert_eq!(hessian_a, hessian_b);
    let jacobian_a = first.equality_jacobian_state().unwrap().clone();
    let gradient_a = first.inequality_jacobian_input().unwrap().to_vec();

    // Reverse order on the clone.
    let gradient_b = second.inequality_jacobian_input().unwrap().to_vec();
    let jacobian_b = second.equality_jacobian_state().unwrap().clone();
    let hessian_c = second.inequality_hessian_input().unwrap().to_vec();

    assert_eq!(jacobian_a, jacobian_b);
    assert_eq!(gradient_a, gradient_b);
    assert_eq!(hessian_a, hessian_c);
    assert_eq!(first.inequality_value(), second.inequality_value());
}

#[test]
fn clones_evaluate_independently() {
    fn assert_send<T: Send>(_: &T) {}

    let mut engine = quadruped(ConstraintOptions::default(), trot());
    let x = SVector::zeros();
    let u = SVector::zeros();
    engine.set_current_state_and_control(0.0, &x, &u).unwrap();
    let mut worker = engine.clone();
    assert_send(&worker);

    worker.set_current_state_and_control(0.2, &x, &u).unwrap();
    assert_eq!(engine.active_mode(), Ok(ContactMode(0b1001)));
    assert_eq!(worker.active_mode(), Ok(ContactMode(0b0110)));
    assert_eq!(engine.time(), Ok(0.0));
}

#[test]
fn inequality_derivatives_match_finite_differences() {
    let mut rng = seeded_rng(3);
    let x = random_vector::<S>(&mut rng, 0.3);
    let u = random_vector::<I>(&mut rng, 30.0);
    let t = 0.2;

    let mut engine = quadruped(ConstraintOptions::default(), trot());
    engine.set_current_state_and_control(t, &x, &u).unwrap();
    let dx = engine.inequality_jacobian_state().unwrap().to_vec();
    let du = engine.inequality_jacobian_input().unwrap().to_vec();

    let step = 1e-6;
    let mut probe = engine.clone();
    let mut value_at = |x: &SVector<f64, S>, u: &SVector<f64, I>| {
        probe.set_current_state_and_control(t, x, u).unwrap();
        probe.inequality_value().unwrap()
    };

    for j in 0..S {
        let mut xp = x;
        let mut xn = x;
        xp[j] += step;
        xn[j] -= step;
        let fd = (value_at(&xp, &u) - value_at(&xn, &u)) / (2.0 * step);
        for (row, gradient) in dx.iter().enumerate() {
            assert_relative_eq!(gradient[j], fd[row], epsilon = 1e-5);
        }
    }
    for j in 0..I {
        let mut up = u;
        let mut un = u;
        up[j] += step;
        un[j] -= step;
        let fd = (value_at(&x, &up) - value_at(&x, &un)) / (2.0 * step);
        for (row, gradient) in du.iter().enumerate() {
            assert_relative_eq!(gradient[j], fd[row], epsilon = 1e-5);
        }
    }
}

// ---------------------------------------------------------------------------
// Errors and empty sets
// ---------------------------------------------------------------------------

#[test]
fn accessors_before_first_evaluation_fail() {
    let mut engine = quadruped(ConstraintOptions::default(), trot());
    assert_eq!(engine.equality_value(), Err(ConstraintError::NotConfigured));
    assert_eq!(
        engine.equality_jacobian_input().unwrap_err(),
        ConstraintError::NotConfigured
    );
    assert_eq!(engine.stance_flags().unwrap_err(), ConstraintError::NotConfigured);
}

/// Schedule that always reports one fixed mode, valid or not.
struct FixedMode(ContactMode);

impl ModeSchedule for FixedMode {
    fn active_mode(&self, _time: f64) -> ContactMode {
        self.0
    }

    fn stance_flags(&self, mode: ContactMode) -> Result<ContactFlags, ScheduleError> {
        mode.flags(4)
    }

    fn event_times(&self) -> &[f64] {
        &[]
    }
}

#[test]
fn out_of_range_mode_aborts_evaluation() {
    let mut engine = quadruped(ConstraintOptions::default(), Arc::new(FixedMode(ContactMode(16))));
    let err = engine
        .set_current_state_and_control(0.0, &SVector::zeros(), &SVector::zeros())
        .unwrap_err();
    assert!(matches!(
        err,
        StrideError::Schedule(ScheduleError::InvalidMode { mode: 16, num_feet: 4 })
    ));
    assert!(!engine.is_configured());
}

#[test]
fn flight_under_hard_equality_has_no_inequalities() {
    let mut engine = quadruped(
        ConstraintOptions {
            position_policy: PositionPolicy::HardEquality,
            ..ConstraintOptions::default()
        },
        Arc::new(FixedMode(ContactMode(0))),
    );
    engine
        .set_current_state_and_control(0.0, &SVector::zeros(), &SVector::zeros())
        .unwrap();
    assert_eq!(engine.num_inequality_constraints(0.0), Ok(0));
    assert_eq!(engine.inequality_value().unwrap().len(), 0);
    assert!(engine.inequality_jacobian_state().unwrap().is_empty());
    assert!(engine.inequality_hessian_state().unwrap().is_empty());
    // Zero force (3) + vertical velocity (1) per foot
    assert_eq!(engine.num_equality_constraints(0.0), Ok(16));
    assert!(engine.equality_event_time_derivatives().unwrap().is_empty());
}

#[test]
fn options_load_from_toml() {
    let options = ConstraintOptions::from_toml_str(
        r#"
        position_policy = "hard_equality"
        friction_coefficient = 0.5
        "#,
    )
    .unwrap();
    let engine = quadruped(options, trot());
    assert_eq!(engine.options().position_policy, PositionPolicy::HardEquality);
    assert_eq!(engine.num_feet(), 4);
}

// ---------------------------------------------------------------------------
// Halfspace round trip
// ---------------------------------------------------------------------------

#[test]
fn random_convex_polygons_round_trip() {
    let mut rng = seeded_rng(42);
    for _ in 0..30 {
        let n = rng.gen_range(3..9);
        let radius = rng.gen_range(0.05..0.5);
        let (cx, cy) = (rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0));

        let mut angles: Vec<f64> = (0..n)
            .map(|_| rng.gen_range(0.0..std::f64::consts::TAU))
            .collect();
        angles.sort_by(f64::total_cmp);
        angles.dedup_by(|a, b| (*a - *b).abs() < 1e-3);
        if angles.len() < 3 {
            continue;
        }
        let vertices: Vec<Vector3<f64>> = angles
            .iter()
            .map(|a| Vector3::new(cx + radius * a.cos(), cy + radius * a.sin(), 0.0))
            .collect();
        let hs = to_halfspaces(&ConvexPolygon::new(vertices.clone())).unwrap();

        // Strictly positive convex combination: strictly inside.
        let weights: Vec<f64> = vertices.iter().map(|_| rng.gen_range(0.1..1.0)).collect();
        let total: f64 = weights.iter().sum();
        let inside = vertices
            .iter()
            .zip(&weights)
            .fold(Vector3::zeros(), |acc, (v, w)| acc + v * (w / total));
        for row in 0..hs.num_rows() {
            assert!(hs.slack(row, &inside) > 0.0);
        }

        // Beyond the circumscribed circle: outside.
        let a = rng.gen_range(0.0..std::f64::consts::TAU);
        let outside = Vector3::new(cx + 2.0 * radius * a.cos(), cy + 2.0 * radius * a.sin(), 0.0);
        assert!((0..hs.num_rows()).any(|row| hs.slack(row, &outside) < 0.0));
    }
}

#[test]
fn bezier_swing_reference_drives_band() {
    let sequence = ModeSequence::from_gait(GaitType::Trot, 0.0, 2).unwrap();
    let reference = BezierSwingReference::new(sequence.clone(), 0.06);
    let mut engine = SwitchedConstraintEngine::<S, I>::new(
        ConstraintOptions::default(),
        Arc::new(PointFootKinematics::<S, I>::new(4)),
        Arc::new(sequence),
        Arc::new(FlatGround),
        Arc::new(reference),
    )
    .unwrap();

    // LF swings on [0.175, 0.35); apex at mid-swing.
    let kin = PointFootKinematics::<S, I>::new(4);
    let x = kin.state_at_height(0.06);
    engine.set_current_state_and_control(0.2625, &x, &SVector::zeros()).unwrap();
    let h = engine.inequality_value().unwrap();
    // LF rows come first: band at w = 1 is tight.
    assert_relative_eq!(h[0], 0.0, epsilon = 1e-9);
    assert_relative_eq!(h[1], 0.0, epsilon = 1e-9);
}
