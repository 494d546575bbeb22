//! Contact-mode types shared by the schedule, terrain and constraint layers.

use serde::{Deserialize, Serialize};

use crate::config::MAX_FEET;
use crate::error::ScheduleError;

/// Discrete contact mode: which feet are in stance.
///
/// Encoded as a bit pattern over `num_feet` bits where foot `0` is the most
/// significant bit. For a quadruped `[LF, RF, LH, RH]`:
///
/// ```text
/// 15 = 0b1111  all four in stance
///  9 = 0b1001  LF + RH (trot pair)
///  6 = 0b0110  RF + LH (trot pair)
///  0 = 0b0000  flight
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContactMode(pub u32);

impl ContactMode {
    /// Encode stance flags as a mode.
    ///
    /// Fails when there are more than [`MAX_FEET`] flags.
    pub fn from_flags(flags: &ContactFlags) -> Result<Self, ScheduleError> {
        let n = flags.len();
        if n > MAX_FEET {
            return Err(ScheduleError::TooManyFeet { num_feet: n });
        }
        let mode = flags
            .iter()
            .enumerate()
            .filter(|&(_, stance)| stance)
            .fold(0_u32, |acc, (foot, _)| acc | (1 << (n - 1 - foot)));
        Ok(Self(mode))
    }

    /// All feet in stance.
    pub fn all_stance(num_feet: usize) -> Self {
        match num_feet {
            0 => Self(0),
            n => Self(u32::MAX >> (32 - n.min(32))),
        }
    }

    /// Decode into per-foot stance flags.
    ///
    /// Fails when the mode does not fit in `num_feet` bits.
    pub fn flags(self, num_feet: usize) -> Result<ContactFlags, ScheduleError> {
        if num_feet > MAX_FEET || self.0 >= (1_u32 << num_feet) {
            return Err(ScheduleError::InvalidMode {
                mode: self.0,
                num_feet,
            });
        }
        let flags = (0..num_feet)
            .map(|foot| self.0 & (1 << (num_feet - 1 - foot)) != 0)
            .collect();
        Ok(ContactFlags(flags))
    }

    /// Raw mode number.
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for ContactMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-foot stance flags: `true` iff the foot is in stance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactFlags(Vec<bool>);

impl ContactFlags {
    pub const fn new(flags: Vec<bool>) -> Self {
        Self(flags)
    }

    /// All `num_feet` feet in stance.
    pub fn all_stance(num_feet: usize) -> Self {
        Self(vec![true; num_feet])
    }

    /// Whether `foot` is in stance. Out-of-range feet are reported as swing.
    pub fn is_stance(&self, foot: usize) -> bool {
        self.0.get(foot).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of feet in stance.
    pub fn num_stance(&self) -> usize {
        self.0.iter().filter(|&&s| s).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }
}

impl From<Vec<bool>> for ContactFlags {
    fn from(flags: Vec<bool>) -> Self {
        Self(flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quadruped_mode_encoding() {
        let flags = ContactFlags::new(vec![true, false, false, true]);
        assert_eq!(ContactMode::from_flags(&flags).unwrap(), ContactMode(9));

        let flags = ContactMode(6).flags(4).unwrap();
        assert_eq!(flags.as_slice(), &[false, true, true, false]);
    }

    #[test]
    fn all_stance_is_all_ones() {
        assert_eq!(ContactMode::all_stance(4), ContactMode(15));
        let flags = ContactMode(15).flags(4).unwrap();
        assert_eq!(flags.num_stance(), 4);
    }

    #[test]
    fn flight_mode_has_no_stance() {
        let flags = ContactMode(0).flags(4).unwrap();
        assert_eq!(flags.num_stance(), 0);
        assert_eq!(flags.len(), 4);
    }

    #[test]
    fn too_many_flags_rejected() {
        let flags = ContactFlags::all_stance(40);
        assert_eq!(
            ContactMode::from_flags(&flags),
            Err(ScheduleError::TooManyFeet { num_feet: 40 })
        );
        let flags = ContactFlags::all_stance(MAX_FEET);
        assert_eq!(
            ContactMode::from_flags(&flags),
            Ok(ContactMode::all_stance(MAX_FEET))
        );
    }

    #[test]
    fn out_of_range_mode_rejected() {
        let err = ContactMode(16).flags(4).unwrap_err();
        assert_eq!(
            err,
            ScheduleError::InvalidMode {
                mode: 16,
                num_feet: 4
            }
        );
    }

    #[test]
    fn roundtrip_every_quadruped_mode() {
        for mode in 0..16 {
            let flags = ContactMode(mode).flags(4).unwrap();
            assert_eq!(ContactMode::from_flags(&flags).unwrap(), ContactMode(mode));
        }
    }

    #[test]
    fn out_of_range_foot_is_swing() {
        let flags = ContactFlags::all_stance(2);
        assert!(flags.is_stance(1));
        assert!(!flags.is_stance(2));
    }
}
