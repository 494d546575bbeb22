//! Vertical swing-foot references.
//!
//! The engine reads a target height and vertical velocity per swinging foot
//! through [`SwingReferenceProvider`]. Derivatives of the reference with
//! respect to the switch times are not part of the interface: the engine
//! treats them as zero.
//!
//! Two providers are included:
//! - [`BezierSwingReference`]: liftoff and touchdown times from a
//!   [`ModeSequence`], height following a 12-point (degree-11) Bezier profile
//!   with zero velocity and acceleration at liftoff and touchdown.
//! - [`SampledSwingReference`]: per-foot sampled trajectories with linear
//!   interpolation.

use stride_core::ScheduleError;

use crate::schedule::ModeSequence;

/// Per-foot vertical reference queried while a foot is in swing.
pub trait SwingReferenceProvider: Send + Sync {
    /// Target foot height at `time`.
    fn position(&self, foot: usize, time: f64) -> f64;

    /// Target vertical foot velocity at `time`.
    fn velocity(&self, foot: usize, time: f64) -> f64;
}

// 12-point Bezier for height profile (peaks at t=0.5).
// First 3 and last 3 are 0 → zero height + zero vel/accel at endpoints.
const BEZIER_H: [f64; 12] = [
    0.0, 0.0, 0.0, // zero at liftoff
    0.9, 0.9, // rise
    1.0, 1.0, // peak
    0.9, 0.9, // descent
    0.0, 0.0, 0.0, // zero at touchdown
];

// bezier_eval(&BEZIER_H, 0.5), used to normalize the apex to step_height.
const BEZIER_H_PEAK: f64 = 0.886_230_468_75;

/// Evaluate a degree-11 Bezier curve at parameter `t` using De Casteljau's algorithm.
fn bezier_eval(points: &[f64; 12], t: f64) -> f64 {
    let mut work = *points;
    for k in 1..12 {
        for i in 0..(12 - k) {
            work[i] = work[i] * (1.0 - t) + work[i + 1] * t;
        }
    }
    work[0]
}

/// Derivative of a degree-11 Bezier curve at `t` via its hodograph.
fn bezier_derivative(points: &[f64; 12], t: f64) -> f64 {
    let mut diffs = [0.0; 11];
    for i in 0..11 {
        diffs[i] = points[i + 1] - points[i];
    }
    for k in 1..11 {
        for i in 0..(11 - k) {
            diffs[i] = diffs[i] * (1.0 - t) + diffs[i + 1] * t;
        }
    }
    11.0 * diffs[0]
}

/// Swing height profile over a normalized phase in `[0, 1]`.
pub fn swing_height(phase: f64, step_height: f64) -> f64 {
    bezier_eval(&BEZIER_H, phase.clamp(0.0, 1.0)) * (step_height / BEZIER_H_PEAK)
}

/// Time derivative of [`swing_height`] for a swing lasting `swing_duration`.
pub fn swing_height_rate(phase: f64, step_height: f64, swing_duration: f64) -> f64 {
    if swing_duration < 1e-10 {
        return 0.0;
    }
    bezier_derivative(&BEZIER_H, phase.clamp(0.0, 1.0)) * (step_height / BEZIER_H_PEAK)
        / swing_duration
}

/// Bezier height reference driven by a contact mode sequence.
///
/// Outside a swing phase bounded by two events of the sequence the reference
/// is the ground height with zero velocity.
#[derive(Clone, Debug)]
pub struct BezierSwingReference {
    sequence: ModeSequence,
    /// Apex height above the ground during swing (meters).
    pub step_height: f64,
    /// Terrain height the profile starts from and lands on (meters).
    pub ground_height: f64,
}

impl BezierSwingReference {
    pub const fn new(sequence: ModeSequence, step_height: f64) -> Self {
        Self {
            sequence,
            step_height,
            ground_height: 0.0,
        }
    }

    /// Normalized swing phase and swing duration at `time`.
    fn phase(&self, foot: usize, time: f64) -> Option<(f64, f64)> {
        let (liftoff, touchdown) = self.sequence.swing_interval(foot, time)?;
        let duration = touchdown - liftoff;
        Some(((time - liftoff) / duration, duration))
    }
}

impl SwingReferenceProvider for BezierSwingReference {
    fn position(&self, foot: usize, time: f64) -> f64 {
        self.ground_height
            + self
                .phase(foot, time)
                .map_or(0.0, |(phase, _)| swing_height(phase, self.step_height))
    }

    fn velocity(&self, foot: usize, time: f64) -> f64 {
        self.phase(foot, time).map_or(0.0, |(phase, duration)| {
            swing_height_rate(phase, self.step_height, duration)
        })
    }
}

/// One foot's sampled vertical trajectory.
#[derive(Clone, Debug, Default, PartialEq)]
struct SampledTrack {
    times: Vec<f64>,
    positions: Vec<f64>,
    velocities: Vec<f64>,
}

impl SampledTrack {
    /// Linear interpolation, clamped to the first and last sample.
    fn interpolate(&self, values: &[f64], time: f64) -> f64 {
        let n = self.times.len();
        if n == 0 {
            return 0.0;
        }
        let upper = self.times.partition_point(|&t| t <= time);
        if upper == 0 {
            return values[0];
        }
        if upper == n {
            return values[n - 1];
        }
        let (t0, t1) = (self.times[upper - 1], self.times[upper]);
        let alpha = if t1 > t0 { (time - t0) / (t1 - t0) } else { 0.0 };
        values[upper - 1] + alpha * (values[upper] - values[upper - 1])
    }
}

/// Sampled per-foot swing references with linear interpolation.
///
/// Feet without samples read zero.
#[derive(Clone, Debug, Default)]
pub struct SampledSwingReference {
    tracks: Vec<SampledTrack>,
}

impl SampledSwingReference {
    pub fn new(num_feet: usize) -> Self {
        Self {
            tracks: vec![SampledTrack::default(); num_feet],
        }
    }

    /// Set the samples of one foot.
    ///
    /// Positions and velocities must have one entry per time, times sorted.
    pub fn set_track(
        &mut self,
        foot: usize,
        times: Vec<f64>,
        positions: Vec<f64>,
        velocities: Vec<f64>,
    ) -> Result<(), ScheduleError> {
        let num_feet = self.tracks.len();
        if foot >= num_feet {
            return Err(ScheduleError::FootOutOfRange { foot, num_feet });
        }
        for values in [&positions, &velocities] {
            if values.len() != times.len() {
                return Err(ScheduleError::LengthMismatch {
                    times: times.len(),
                    values: values.len(),
                });
            }
        }
        if let Some(index) = times.iter().position(|t| !t.is_finite()) {
            return Err(ScheduleError::NonFiniteTime { index });
        }
        if let Some(index) = times.windows(2).position(|w| w[1] < w[0]) {
            return Err(ScheduleError::UnsortedTimes { index: index + 1 });
        }
        self.tracks[foot] = SampledTrack {
            times,
            positions,
            velocities,
        };
        Ok(())
    }
}

impl SwingReferenceProvider for SampledSwingReference {
    fn position(&self, foot: usize, time: f64) -> f64 {
        self.tracks
            .get(foot)
            .map_or(0.0, |track| track.interpolate(&track.positions, time))
    }

    fn velocity(&self, foot: usize, time: f64) -> f64 {
        self.tracks
            .get(foot)
            .map_or(0.0, |track| track.interpolate(&track.velocities, time))
    }
}
