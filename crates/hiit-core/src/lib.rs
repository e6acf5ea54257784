//! # hiit Core Library
//!
//! Core logic for the hiit interval timer. The CLI binary is a thin host
//! over this library: it owns the clock, renders cues, and persists state.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A wall-clock-based phase state machine
//!   (prepare, work, rest) that the host drives by calling `tick(now_ms)`
//! - **Cues**: Work/rest/complete/countdown signals delivered to a
//!   host-provided [`CueSink`]
//! - **Storage**: TOML configuration and SQLite workout history
//!
//! ## Key Components
//!
//! - [`IntervalTimerEngine`]: Core timer state machine
//! - [`Settings`]: Phase durations and cycle count for one run
//! - [`Config`]: Application configuration management
//! - [`Database`]: Workout history and persisted engine state

pub mod error;
pub mod events;
pub mod format;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use format::{format_hms, format_mmss};
pub use storage::{Config, Database, WorkoutRecord, WorkoutStats};
pub use timer::{
    Clock, Cue, CueError, CueSink, IntervalTimerEngine, ManualClock, MonotonicClock, NullSink,
    Phase, PlannedPhase, Preset, RecordingSink, Settings, SystemClock, TimerState, TimerStatus,
};
