//! Cues the engine hands to the host for audio/haptic rendering.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cue {
    Work,
    Rest,
    Complete,
    Countdown,
}

impl Cue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cue::Work => "work",
            Cue::Rest => "rest",
            Cue::Complete => "complete",
            Cue::Countdown => "countdown",
        }
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Delivery failure reported by a sink. The engine logs and drops it.
#[derive(Error, Debug)]
pub enum CueError {
    #[error("cue output unavailable: {0}")]
    Unavailable(String),

    #[error("cue output failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Receives cues at phase boundaries and countdown seconds.
///
/// Implementations must return promptly; queueing or readiness handling
/// belongs to the sink, not the engine.
pub trait CueSink {
    fn emit(&mut self, cue: Cue) -> Result<(), CueError>;
}

/// Collects every cue in order.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub cues: Vec<Cue>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&mut self) -> Vec<Cue> {
        std::mem::take(&mut self.cues)
    }
}

impl CueSink for RecordingSink {
    fn emit(&mut self, cue: Cue) -> Result<(), CueError> {
        self.cues.push(cue);
        Ok(())
    }
}

/// Discards cues.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl CueSink for NullSink {
    fn emit(&mut self, _cue: Cue) -> Result<(), CueError> {
        Ok(())
    }
}
