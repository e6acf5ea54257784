use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// One named interval of a workout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Prepare,
    Work,
    Rest,
    Completed,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Prepare => "prepare",
            Phase::Work => "work",
            Phase::Rest => "rest",
            Phase::Completed => "completed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Longest accepted phase: one hour.
pub const MAX_PHASE_SECS: u64 = 60 * 60;
/// Most work/rest pairs in one run.
pub const MAX_CYCLES: u32 = 1_000;

/// Phase durations and cycle count for one timer run.
///
/// Immutable for the lifetime of a run: the engine copies it at construction
/// and never hands out a mutable reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Work phase length in seconds (> 0).
    pub work_secs: u64,
    /// Rest phase length in seconds (> 0).
    pub rest_secs: u64,
    /// Lead-in before the first work phase, in seconds (may be 0).
    pub prepare_secs: u64,
    /// Number of work/rest pairs (>= 1).
    pub cycles: u32,
}

/// An entry of [`Settings::plan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedPhase {
    pub phase: Phase,
    pub cycle: u32,
    pub duration_secs: u64,
}

impl Settings {
    /// Build validated settings.
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidValue`] when a work or rest duration
    /// or the cycle count is zero, a duration exceeds [`MAX_PHASE_SECS`], or
    /// the cycle count exceeds [`MAX_CYCLES`].
    pub fn new(
        work_secs: u64,
        rest_secs: u64,
        prepare_secs: u64,
        cycles: u32,
    ) -> Result<Self, ValidationError> {
        let settings = Self {
            work_secs,
            rest_secs,
            prepare_secs,
            cycles,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Re-check invariants, e.g. after deserializing from a config file.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.work_secs == 0 {
            return Err(ValidationError::invalid(
                "work_secs",
                "must be greater than zero",
            ));
        }
        if self.rest_secs == 0 {
            return Err(ValidationError::invalid(
                "rest_secs",
                "must be greater than zero",
            ));
        }
        if self.cycles == 0 {
            return Err(ValidationError::invalid("cycles", "must be at least 1"));
        }
        for (field, secs) in [
            ("work_secs", self.work_secs),
            ("rest_secs", self.rest_secs),
            ("prepare_secs", self.prepare_secs),
        ] {
            if secs > MAX_PHASE_SECS {
                return Err(ValidationError::invalid(
                    field,
                    format!("must be at most {MAX_PHASE_SECS} seconds"),
                ));
            }
        }
        if self.cycles > MAX_CYCLES {
            return Err(ValidationError::invalid(
                "cycles",
                format!("must be at most {MAX_CYCLES}"),
            ));
        }
        Ok(())
    }

    /// Configured length of `phase`; `Completed` has none.
    pub fn phase_duration_secs(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Prepare => self.prepare_secs,
            Phase::Work => self.work_secs,
            Phase::Rest => self.rest_secs,
            Phase::Completed => 0,
        }
    }

    /// Length of the whole run. The final cycle has no rest.
    pub fn total_duration_secs(&self) -> u64 {
        let cycles = u64::from(self.cycles);
        self.prepare_secs
            .saturating_add(self.work_secs.saturating_mul(cycles))
            .saturating_add(self.rest_secs.saturating_mul(cycles.saturating_sub(1)))
    }

    /// Seconds of the run that lie before the start of `phase` in `cycle`.
    pub fn elapsed_before(&self, phase: Phase, cycle: u32) -> u64 {
        let done = u64::from(cycle.saturating_sub(1));
        let pair = self.work_secs.saturating_add(self.rest_secs);
        match phase {
            Phase::Prepare => 0,
            Phase::Work => self.prepare_secs.saturating_add(pair.saturating_mul(done)),
            Phase::Rest => self
                .prepare_secs
                .saturating_add(pair.saturating_mul(done))
                .saturating_add(self.work_secs),
            Phase::Completed => self.total_duration_secs(),
        }
    }

    /// Ordered phases of a full run. A zero-length prepare is left out.
    pub fn plan(&self) -> Vec<PlannedPhase> {
        let mut steps = Vec::with_capacity(self.cycles as usize * 2 + 1);
        if self.prepare_secs > 0 {
            steps.push(PlannedPhase {
                phase: Phase::Prepare,
                cycle: 1,
                duration_secs: self.prepare_secs,
            });
        }
        for cycle in 1..=self.cycles {
            steps.push(PlannedPhase {
                phase: Phase::Work,
                cycle,
                duration_secs: self.work_secs,
            });
            if cycle < self.cycles {
                steps.push(PlannedPhase {
                    phase: Phase::Rest,
                    cycle,
                    duration_secs: self.rest_secs,
                });
            }
        }
        steps
    }
}

impl Default for Settings {
    fn default() -> Self {
        Preset::Classic.settings()
    }
}

/// Built-in workouts selectable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// 20s work / 10s rest, 8 rounds.
    Tabata,
    /// 30s work / 15s rest, 8 rounds.
    Classic,
    /// 45s work / 15s rest, 10 rounds.
    Sprint,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Tabata, Preset::Classic, Preset::Sprint];

    pub fn settings(&self) -> Settings {
        let (work_secs, rest_secs, prepare_secs, cycles) = match self {
            Preset::Tabata => (20, 10, 10, 8),
            Preset::Classic => (30, 15, 5, 8),
            Preset::Sprint => (45, 15, 10, 10),
        };
        Settings {
            work_secs,
            rest_secs,
            prepare_secs,
            cycles,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Preset::Tabata => "tabata",
            Preset::Classic => "classic",
            Preset::Sprint => "sprint",
        }
    }
}

impl FromStr for Preset {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::UnknownPreset(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Settings {
        Settings::new(30, 15, 5, 2).unwrap()
    }

    #[test]
    fn rejects_zero_work_rest_or_cycles() {
        assert!(Settings::new(0, 15, 5, 2).is_err());
        assert!(Settings::new(30, 0, 5, 2).is_err());
        assert!(Settings::new(30, 15, 5, 0).is_err());
    }

    #[test]
    fn rejects_oversized_cycles_and_durations() {
        assert!(matches!(
            Settings::new(1, 1, 0, u32::MAX),
            Err(ValidationError::InvalidValue { ref field, .. }) if field == "cycles"
        ));
        assert!(Settings::new(1, 1, 0, MAX_CYCLES + 1).is_err());
        assert!(Settings::new(MAX_PHASE_SECS + 1, 1, 0, 1).is_err());
        assert!(Settings::new(1, u64::MAX, 0, 1).is_err());
        assert!(Settings::new(1, 1, MAX_PHASE_SECS + 1, 1).is_err());
    }

    #[test]
    fn largest_accepted_workout_plans() {
        let settings =
            Settings::new(MAX_PHASE_SECS, MAX_PHASE_SECS, MAX_PHASE_SECS, MAX_CYCLES).unwrap();
        assert_eq!(settings.plan().len(), 1 + 2 * MAX_CYCLES as usize - 1);
    }

    #[test]
    fn zero_prepare_is_allowed() {
        assert!(Settings::new(30, 15, 0, 1).is_ok());
    }

    #[test]
    fn total_duration_skips_final_rest() {
        assert_eq!(sample().total_duration_secs(), 5 + 30 + 15 + 30);
        assert_eq!(Settings::new(20, 10, 0, 1).unwrap().total_duration_secs(), 20);
    }

    #[test]
    fn plan_orders_phases() {
        let phases: Vec<(Phase, u32)> = sample().plan().iter().map(|p| (p.phase, p.cycle)).collect();
        assert_eq!(
            phases,
            vec![
                (Phase::Prepare, 1),
                (Phase::Work, 1),
                (Phase::Rest, 1),
                (Phase::Work, 2),
            ]
        );
    }

    #[test]
    fn plan_omits_empty_prepare() {
        let plan = Settings::new(20, 10, 0, 3).unwrap().plan();
        assert_eq!(plan.first().map(|p| p.phase), Some(Phase::Work));
        assert_eq!(plan.len(), 5);
    }

    #[test]
    fn elapsed_before_matches_plan() {
        let s = sample();
        assert_eq!(s.elapsed_before(Phase::Prepare, 1), 0);
        assert_eq!(s.elapsed_before(Phase::Work, 1), 5);
        assert_eq!(s.elapsed_before(Phase::Rest, 1), 35);
        assert_eq!(s.elapsed_before(Phase::Work, 2), 50);
        assert_eq!(s.elapsed_before(Phase::Completed, 2), 80);
    }

    #[test]
    fn presets_parse_case_insensitively() {
        assert_eq!("TABATA".parse::<Preset>().unwrap(), Preset::Tabata);
        assert_eq!(Preset::Tabata.settings().total_duration_secs(), 10 + 8 * 20 + 7 * 10);
        assert!(matches!(
            "yoga".parse::<Preset>(),
            Err(ValidationError::UnknownPreset(_))
        ));
    }

    #[test]
    fn presets_are_valid() {
        for preset in Preset::ALL {
            assert!(preset.settings().validate().is_ok(), "{}", preset.name());
        }
    }
}
