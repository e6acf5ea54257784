mod clock;
mod cue;
mod engine;
mod settings;

pub use clock::{Clock, ManualClock, MonotonicClock, SystemClock};
pub use cue::{Cue, CueError, CueSink, NullSink, RecordingSink};
pub use engine::{IntervalTimerEngine, TimerState, TimerStatus};
pub use settings::{Phase, PlannedPhase, Preset, Settings, MAX_CYCLES, MAX_PHASE_SECS};
