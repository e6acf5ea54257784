use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Phase, TimerStatus};

/// Every state change of the engine produces an Event.
/// Hosts print or log them; the CLI emits them as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        phase: Phase,
        cycle: u32,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        phase: Phase,
        remaining_secs: u64,
        /// Running time of the current phase carried into the pause.
        elapsed_ms: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// A phase ran out and the next one began.
    PhaseChanged {
        from: Phase,
        to: Phase,
        cycle: u32,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    /// The user jumped to the next phase.
    PhaseSkipped {
        from: Phase,
        to: Phase,
        cycle: u32,
        at: DateTime<Utc>,
    },
    WorkoutCompleted {
        cycles: u32,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        status: TimerStatus,
        phase: Phase,
        current_cycle: u32,
        cycles: u32,
        remaining_secs: u64,
        phase_duration_secs: u64,
        phase_progress: f64,
        workout_progress_pct: f64,
        at: DateTime<Utc>,
    },
}
