//! Contact schedule: which mode is active at a given time.
//!
//! The engine only needs [`ModeSchedule`]. [`ModeSequence`] is the standard
//! implementation: a sorted list of event times splitting the horizon into
//! intervals, each with its own contact mode. Periodic sequences are
//! generated from a [`GaitType`], where each gait is defined by:
//! - Phase offsets per foot (when in the cycle each foot lifts)
//! - Duty factor (fraction of cycle spent in stance)
//! - Cycle time (total gait period)

use std::cmp::Ordering;

use stride_core::{ContactFlags, ContactMode, MAX_FEET, ScheduleError};

/// Contact schedule resolver queried by the engine.
pub trait ModeSchedule: Send + Sync {
    /// Mode active at `time`. Must be defined for every time in the horizon.
    fn active_mode(&self, time: f64) -> ContactMode;

    /// Decode a mode into per-foot stance flags.
    fn stance_flags(&self, mode: ContactMode) -> Result<ContactFlags, ScheduleError>;

    /// Switch times of the schedule, sorted.
    fn event_times(&self) -> &[f64];

    fn num_event_times(&self) -> usize {
        self.event_times().len()
    }
}

/// Supported gait patterns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GaitType {
    /// All feet on ground (static balance).
    Stand,
    /// Diagonal pairs alternate: LF+RH and RF+LH.
    Trot,
    /// One foot lifts at a time, in sequence.
    Walk,
    /// Front pair and hind pair alternate.
    Bound,
}

impl GaitType {
    /// Quadruped parameters `(offsets, duty_factor, cycle_time)` for feet
    /// ordered `[LF, RF, LH, RH]`.
    pub fn quadruped_parameters(self) -> (Vec<f64>, f64, f64) {
        match self {
            Self::Stand => (vec![0.0; 4], 1.0, 1.0),
            Self::Trot => (vec![0.0, 0.5, 0.5, 0.0], 0.5, 0.35),
            Self::Walk => (vec![0.0, 0.5, 0.25, 0.75], 0.75, 0.8),
            Self::Bound => (vec![0.0, 0.0, 0.5, 0.5], 0.5, 0.4),
        }
    }
}

/// Stance flags at gait `phase` in `[0, 1)`.
fn flags_at_phase(offsets: &[f64], duty_factor: f64, phase: f64) -> ContactFlags {
    offsets
        .iter()
        .map(|&offset| duty_factor >= 1.0 || (phase + offset).rem_euclid(1.0) < duty_factor)
        .collect::<Vec<_>>()
        .into()
}

fn check_gait(
    offsets: &[f64],
    duty_factor: f64,
    cycle_time: f64,
    start_time: f64,
) -> Result<(), ScheduleError> {
    if offsets.len() > MAX_FEET {
        return Err(ScheduleError::TooManyFeet {
            num_feet: offsets.len(),
        });
    }
    let invalid = |parameter: &'static str, reason: &'static str| {
        Err(ScheduleError::InvalidGait { parameter, reason })
    };
    if offsets.is_empty() {
        return invalid("offsets", "at least one foot required");
    }
    if !offsets.iter().all(|o| o.is_finite()) {
        return invalid("offsets", "must be finite");
    }
    if !(duty_factor > 0.0 && duty_factor <= 1.0) {
        return invalid("duty_factor", "must be in (0, 1]");
    }
    if !(cycle_time.is_finite() && cycle_time > 0.0) {
        return invalid("cycle_time", "must be finite and > 0");
    }
    if !start_time.is_finite() {
        return invalid("start_time", "must be finite");
    }
    Ok(())
}

/// Piecewise-constant contact schedule.
///
/// Mode `i` is active on `[event_times[i-1], event_times[i])`; the first mode
/// extends to `-inf` and the last to `+inf`. A switch takes effect exactly at
/// its event time.
#[derive(Clone, Debug, PartialEq)]
pub struct ModeSequence {
    event_times: Vec<f64>,
    modes: Vec<ContactMode>,
    num_feet: usize,
}

impl ModeSequence {
    /// Build from sorted event times and `event_times.len() + 1` modes.
    pub fn new(
        event_times: Vec<f64>,
        modes: Vec<ContactMode>,
        num_feet: usize,
    ) -> Result<Self, ScheduleError> {
        if modes.len() != event_times.len() + 1 {
            return Err(ScheduleError::LengthMismatch {
                times: event_times.len(),
                values: modes.len(),
            });
        }
        if let Some(index) = event_times.iter().position(|t| !t.is_finite()) {
            return Err(ScheduleError::NonFiniteTime { index });
        }
        let out_of_order = |w: &[f64]| w[0].partial_cmp(&w[1]).is_none_or(Ordering::is_gt);
        if let Some(index) = event_times.windows(2).position(out_of_order) {
            return Err(ScheduleError::UnsortedTimes { index: index + 1 });
        }
        for &mode in &modes {
            mode.flags(num_feet)?;
        }
        Ok(Self {
            event_times,
            modes,
            num_feet,
        })
    }

    /// One mode for all time.
    pub fn constant(mode: ContactMode, num_feet: usize) -> Result<Self, ScheduleError> {
        Self::new(Vec::new(), vec![mode], num_feet)
    }

    /// Periodic quadruped sequence for `gait`, starting at `start_time`.
    ///
    /// Covers `cycles` full gait cycles; the mode at the end of the last cycle
    /// persists afterwards.
    pub fn from_gait(
        gait: GaitType,
        start_time: f64,
        cycles: usize,
    ) -> Result<Self, ScheduleError> {
        let (offsets, duty_factor, cycle_time) = gait.quadruped_parameters();
        Self::periodic(&offsets, duty_factor, cycle_time, start_time, cycles)
    }

    /// Periodic sequence from explicit per-foot phase offsets.
    ///
    /// Requires `1..=MAX_FEET` finite offsets, `duty_factor` in `(0, 1]`,
    /// a positive `cycle_time` and a finite `start_time`.
    pub fn periodic(
        offsets: &[f64],
        duty_factor: f64,
        cycle_time: f64,
        start_time: f64,
        cycles: usize,
    ) -> Result<Self, ScheduleError> {
        check_gait(offsets, duty_factor, cycle_time, start_time)?;
        let num_feet = offsets.len();
        let first = ContactMode::from_flags(&flags_at_phase(offsets, duty_factor, 0.0))?;
        if duty_factor >= 1.0 || cycles == 0 {
            return Self::new(Vec::new(), vec![first], num_feet);
        }

        // Phases in [0, 1) where some foot lifts off or touches down.
        let mut boundaries: Vec<f64> = offsets
            .iter()
            .flat_map(|&o| [(duty_factor - o).rem_euclid(1.0), (-o).rem_euclid(1.0)])
            .collect();
        boundaries.sort_by(f64::total_cmp);
        boundaries.dedup_by(|a, b| (*a - *b).abs() < 1e-12);

        let mut event_times = Vec::new();
        let mut modes = vec![first];
        for cycle in 0..cycles {
            for (k, &phase) in boundaries.iter().enumerate() {
                if cycle == 0 && phase == 0.0 {
                    continue;
                }
                // Mode on the interval that starts at this boundary.
                let next_phase = boundaries.get(k + 1).copied().unwrap_or(1.0);
                let mid = 0.5 * (phase + next_phase);
                let mode = ContactMode::from_flags(&flags_at_phase(offsets, duty_factor, mid))?;
                if modes.last() != Some(&mode) {
                    event_times.push(start_time + (cycle as f64 + phase) * cycle_time);
                    modes.push(mode);
                }
            }
        }

        Self::new(event_times, modes, num_feet)
    }

    /// Index of the interval containing `time`.
    pub fn interval_index(&self, time: f64) -> usize {
        self.event_times.partition_point(|&e| e <= time)
    }

    pub fn modes(&self) -> &[ContactMode] {
        &self.modes
    }

    pub const fn num_feet(&self) -> usize {
        self.num_feet
    }

    fn is_stance_in(&self, index: usize, foot: usize) -> bool {
        // Modes were validated on construction.
        self.modes[index]
            .flags(self.num_feet)
            .is_ok_and(|flags| flags.is_stance(foot))
    }

    /// Liftoff and touchdown times of the swing phase containing `time`.
    ///
    /// `None` when the foot is in stance at `time`, or when its swing phase is
    /// not bounded on both sides by events of this sequence.
    pub fn swing_interval(&self, foot: usize, time: f64) -> Option<(f64, f64)> {
        let index = self.interval_index(time);
        if self.is_stance_in(index, foot) {
            return None;
        }
        let mut first = index;
        while first > 0 && !self.is_stance_in(first - 1, foot) {
            first -= 1;
        }
        let mut last = index;
        while last + 1 < self.modes.len() && !self.is_stance_in(last + 1, foot) {
            last += 1;
        }
        if first == 0 || last + 1 == self.modes.len() {
            return None;
        }
        Some((self.event_times[first - 1], self.event_times[last]))
    }
}

impl ModeSchedule for ModeSequence {
    fn active_mode(&self, time: f64) -> ContactMode {
        self.modes[self.interval_index(time)]
    }

    fn stance_flags(&self, mode: ContactMode) -> Result<ContactFlags, ScheduleError> {
        mode.flags(self.num_feet)
    }

    fn event_times(&self) -> &[f64] {
        &self.event_times
    }
}
