//! Interval timer engine.
//!
//! A wall-clock-based state machine. It owns no thread and reads no clock:
//! the host passes `now_ms` into every call and is expected to call `tick()`
//! frequently while the timer is running.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!            |
//!            v
//!        Completed        (reset() returns to Idle from anywhere)
//! ```
//!
//! ## Phase Order
//!
//! ```text
//! Prepare -> Work -> Rest -> Work -> ... -> Work -> Completed
//! ```
//!
//! Prepare runs once before cycle 1; the final cycle has no Rest.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = IntervalTimerEngine::new(settings);
//! engine.start(clock.now_ms());
//! // Once per frame:
//! engine.tick(clock.now_ms(), &mut sink);
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::cue::{Cue, CueSink};
use super::settings::{Phase, Settings};
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    Idle,
    Running,
    Paused,
    Completed,
}

/// Mutable run state. Hosts read it through [`IntervalTimerEngine::state`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub status: TimerStatus,
    pub phase: Phase,
    /// 1-based index of the active work/rest pair.
    pub current_cycle: u32,
    /// Whole seconds left in the current phase, as of the last tick.
    pub remaining_secs: u64,
    /// When the current phase started running, shifted back by any time
    /// run before a pause. `None` unless running.
    pub start_ms: Option<u64>,
    /// Running time of the current phase preserved across a pause.
    pub elapsed_before_pause_ms: u64,
    /// Countdown cues fire for values below this. Set one above the phase
    /// length on entry so a 3 s phase still announces its 3.
    #[serde(default)]
    pub countdown_from_secs: u64,
}

impl TimerState {
    fn initial(settings: &Settings) -> Self {
        Self {
            status: TimerStatus::Idle,
            phase: Phase::Prepare,
            current_cycle: 1,
            remaining_secs: settings.prepare_secs,
            start_ms: None,
            elapsed_before_pause_ms: 0,
            countdown_from_secs: settings.prepare_secs.saturating_add(1),
        }
    }
}

/// Core interval timer.
///
/// Every operation is defined for every state; calls that make no sense in
/// the current state are no-ops and return `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntervalTimerEngine {
    settings: Settings,
    state: TimerState,
}

impl IntervalTimerEngine {
    /// Create an engine in `Idle`/`Prepare` with the prepare countdown loaded.
    pub fn new(settings: Settings) -> Self {
        Self {
            state: TimerState::initial(&settings),
            settings,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn status(&self) -> TimerStatus {
        self.state.status
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn current_cycle(&self) -> u32 {
        self.state.current_cycle
    }

    pub fn remaining_secs(&self) -> u64 {
        self.state.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.state.status == TimerStatus::Running
    }

    /// Work phases fully finished so far.
    pub fn cycles_completed(&self) -> u32 {
        match self.state.phase {
            Phase::Completed => self.settings.cycles,
            Phase::Rest => self.state.current_cycle,
            Phase::Prepare | Phase::Work => self.state.current_cycle - 1,
        }
    }

    pub fn phase_duration_secs(&self) -> u64 {
        self.settings.phase_duration_secs(self.state.phase)
    }

    /// 0.0 .. 1.0 progress within the current phase.
    pub fn phase_progress(&self) -> f64 {
        if self.state.phase == Phase::Completed {
            return 1.0;
        }
        let total = self.phase_duration_secs();
        if total == 0 {
            return 0.0;
        }
        1.0 - (self.state.remaining_secs as f64 / total as f64)
    }

    /// 0.0 .. 100.0 progress across the whole workout.
    pub fn workout_progress_pct(&self) -> f64 {
        let total = self.settings.total_duration_secs();
        if total == 0 {
            return 0.0;
        }
        let before = self
            .settings
            .elapsed_before(self.state.phase, self.state.current_cycle);
        let in_phase = self
            .phase_duration_secs()
            .saturating_sub(self.state.remaining_secs);
        ((before + in_phase) as f64 / total as f64 * 100.0).min(100.0)
    }

    /// Build a full state snapshot event for rendering.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            status: self.state.status,
            phase: self.state.phase,
            current_cycle: self.state.current_cycle,
            cycles: self.settings.cycles,
            remaining_secs: self.state.remaining_secs,
            phase_duration_secs: self.phase_duration_secs(),
            phase_progress: self.phase_progress(),
            workout_progress_pct: self.workout_progress_pct(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start from `Idle` or resume from `Paused`.
    pub fn start(&mut self, now_ms: u64) -> Option<Event> {
        match self.state.status {
            TimerStatus::Idle => {
                self.state.start_ms = Some(now_ms);
                self.state.elapsed_before_pause_ms = 0;
                self.state.status = TimerStatus::Running;
                debug!(phase = %self.state.phase, "timer started");
                Some(Event::TimerStarted {
                    phase: self.state.phase,
                    cycle: self.state.current_cycle,
                    remaining_secs: self.state.remaining_secs,
                    at: Utc::now(),
                })
            }
            TimerStatus::Paused => {
                self.state.start_ms =
                    Some(now_ms.saturating_sub(self.state.elapsed_before_pause_ms));
                self.state.elapsed_before_pause_ms = 0;
                self.state.status = TimerStatus::Running;
                debug!(phase = %self.state.phase, "timer resumed");
                Some(Event::TimerResumed {
                    phase: self.state.phase,
                    remaining_secs: self.state.remaining_secs,
                    at: Utc::now(),
                })
            }
            TimerStatus::Running | TimerStatus::Completed => None,
        }
    }

    /// Freeze the countdown, keeping the phase's elapsed time for `start()`.
    pub fn pause(&mut self, now_ms: u64) -> Option<Event> {
        if self.state.status != TimerStatus::Running {
            return None;
        }
        let elapsed = self
            .state
            .start_ms
            .map(|start| now_ms.saturating_sub(start))
            .unwrap_or(0);
        self.state.elapsed_before_pause_ms = elapsed;
        self.state.start_ms = None;
        self.state.status = TimerStatus::Paused;
        debug!(phase = %self.state.phase, elapsed_ms = elapsed, "timer paused");
        Some(Event::TimerPaused {
            phase: self.state.phase,
            remaining_secs: self.state.remaining_secs,
            elapsed_ms: elapsed,
            at: Utc::now(),
        })
    }

    /// Advance the countdown to `now_ms`.
    ///
    /// Moves at most one phase per call; a host that was suspended for
    /// longer than a phase catches up over successive ticks, each one
    /// emitting the cue for the phase it enters. Returns
    /// `Some(Event::PhaseChanged | Event::WorkoutCompleted)` on a transition.
    pub fn tick(&mut self, now_ms: u64, sink: &mut dyn CueSink) -> Option<Event> {
        if self.state.status != TimerStatus::Running {
            return None;
        }
        let start = self.state.start_ms?;
        let elapsed_secs = now_ms.saturating_sub(start) / 1000;
        let remaining = self.phase_duration_secs().saturating_sub(elapsed_secs);

        if remaining == 0 {
            let (event, cue) = self.transition(now_ms)?;
            emit(sink, cue);
            return Some(event);
        }

        if remaining < self.state.countdown_from_secs && (1..=3).contains(&remaining) {
            emit(sink, Cue::Countdown);
        }
        self.state.countdown_from_secs = remaining;
        self.state.remaining_secs = remaining;
        None
    }

    /// Jump straight to the next phase without emitting a cue.
    pub fn skip_to_next(&mut self, now_ms: u64) -> Option<Event> {
        match self.state.status {
            TimerStatus::Running | TimerStatus::Paused => {
                let from = self.state.phase;
                self.transition(now_ms)?;
                debug!(%from, to = %self.state.phase, "phase skipped");
                Some(Event::PhaseSkipped {
                    from,
                    to: self.state.phase,
                    cycle: self.state.current_cycle,
                    at: Utc::now(),
                })
            }
            TimerStatus::Idle | TimerStatus::Completed => None,
        }
    }

    /// Return to the freshly constructed state. Always succeeds.
    pub fn reset(&mut self) -> Option<Event> {
        self.state = TimerState::initial(&self.settings);
        debug!("timer reset");
        Some(Event::TimerReset { at: Utc::now() })
    }

    /// Swap in new settings and reset.
    pub fn set_settings(&mut self, settings: Settings) -> Option<Event> {
        self.settings = settings;
        self.reset()
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Apply the phase transition table. `None` only from `Completed`.
    fn transition(&mut self, now_ms: u64) -> Option<(Event, Cue)> {
        let from = self.state.phase;
        let (next, cue) = match from {
            Phase::Prepare => (Phase::Work, Cue::Work),
            Phase::Work if self.state.current_cycle < self.settings.cycles => {
                (Phase::Rest, Cue::Rest)
            }
            Phase::Work => (Phase::Completed, Cue::Complete),
            Phase::Rest => {
                self.state.current_cycle += 1;
                (Phase::Work, Cue::Work)
            }
            Phase::Completed => return None,
        };

        self.state.phase = next;
        self.state.elapsed_before_pause_ms = 0;

        if next == Phase::Completed {
            self.state.status = TimerStatus::Completed;
            self.state.start_ms = None;
            self.state.remaining_secs = 0;
            debug!(cycles = self.settings.cycles, "workout completed");
            return Some((
                Event::WorkoutCompleted {
                    cycles: self.settings.cycles,
                    at: Utc::now(),
                },
                cue,
            ));
        }

        let duration = self.settings.phase_duration_secs(next);
        self.state.status = TimerStatus::Running;
        self.state.start_ms = Some(now_ms);
        self.state.remaining_secs = duration;
        self.state.countdown_from_secs = duration.saturating_add(1);
        debug!(%from, to = %next, cycle = self.state.current_cycle, "phase changed");
        Some((
            Event::PhaseChanged {
                from,
                to: next,
                cycle: self.state.current_cycle,
                duration_secs: duration,
                at: Utc::now(),
            },
            cue,
        ))
    }
}

fn emit(sink: &mut dyn CueSink, cue: Cue) {
    if let Err(e) = sink.emit(cue) {
        warn!(%cue, error = %e, "cue delivery failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::cue::{CueError, RecordingSink};

    fn settings() -> Settings {
        Settings::new(30, 15, 5, 2).unwrap()
    }

    struct FailingSink;

    impl CueSink for FailingSink {
        fn emit(&mut self, _cue: Cue) -> Result<(), CueError> {
            Err(CueError::Unavailable("audio device gone".into()))
        }
    }

    #[test]
    fn new_engine_is_idle_in_prepare() {
        let engine = IntervalTimerEngine::new(settings());
        let state = engine.state();
        assert_eq!(state.status, TimerStatus::Idle);
        assert_eq!(state.phase, Phase::Prepare);
        assert_eq!(state.current_cycle, 1);
        assert_eq!(state.remaining_secs, 5);
        assert_eq!(state.start_ms, None);
        assert_eq!(state.elapsed_before_pause_ms, 0);
    }

    #[test]
    fn full_workout_scenario() {
        let mut engine = IntervalTimerEngine::new(settings());
        let mut sink = RecordingSink::new();
        let t0 = 1_000_000;

        assert!(engine.start(t0).is_some());
        assert_eq!(engine.status(), TimerStatus::Running);

        assert!(engine.tick(t0 + 5_000, &mut sink).is_some());
        assert_eq!(engine.phase(), Phase::Work);
        assert_eq!(engine.remaining_secs(), 30);
        assert_eq!(sink.take(), vec![Cue::Work]);

        engine.tick(t0 + 35_000, &mut sink);
        assert_eq!(engine.phase(), Phase::Rest);
        assert_eq!(engine.remaining_secs(), 15);
        assert_eq!(sink.take(), vec![Cue::Rest]);

        engine.tick(t0 + 50_000, &mut sink);
        assert_eq!(engine.phase(), Phase::Work);
        assert_eq!(engine.current_cycle(), 2);
        assert_eq!(sink.take(), vec![Cue::Work]);

        let event = engine.tick(t0 + 80_000, &mut sink);
        assert!(matches!(event, Some(Event::WorkoutCompleted { cycles: 2, .. })));
        assert_eq!(engine.status(), TimerStatus::Completed);
        assert_eq!(engine.phase(), Phase::Completed);
        assert_eq!(engine.remaining_secs(), 0);
        assert_eq!(engine.state().start_ms, None);
        assert_eq!(sink.take(), vec![Cue::Complete]);
    }

    #[test]
    fn start_is_noop_when_running_or_completed() {
        let mut engine = IntervalTimerEngine::new(Settings::new(1, 1, 0, 1).unwrap());
        engine.start(0);
        assert!(engine.start(10).is_none());
        assert_eq!(engine.state().start_ms, Some(0));

        let mut sink = RecordingSink::new();
        engine.tick(0, &mut sink); // prepare of 0s ends immediately
        engine.tick(1_000, &mut sink);
        assert_eq!(engine.status(), TimerStatus::Completed);
        assert!(engine.start(2_000).is_none());
        assert_eq!(sink.cues, vec![Cue::Work, Cue::Complete]);
    }

    #[test]
    fn pause_then_start_keeps_remaining() {
        let mut engine = IntervalTimerEngine::new(settings());
        let mut sink = RecordingSink::new();
        engine.start(0);
        engine.tick(5_000, &mut sink);
        engine.tick(12_400, &mut sink);
        assert_eq!(engine.remaining_secs(), 23);

        engine.pause(12_500);
        assert_eq!(engine.status(), TimerStatus::Paused);
        assert_eq!(engine.state().start_ms, None);
        assert_eq!(engine.state().elapsed_before_pause_ms, 7_500);
        // Paused ticks are frozen.
        assert!(engine.tick(60_000, &mut sink).is_none());
        assert_eq!(engine.remaining_secs(), 23);

        assert!(matches!(engine.start(100_000), Some(Event::TimerResumed { .. })));
        assert_eq!(engine.remaining_secs(), 23);
        assert_eq!(engine.state().start_ms, Some(92_500));

        engine.tick(100_600, &mut sink);
        assert_eq!(engine.remaining_secs(), 22);
    }

    #[test]
    fn pause_is_noop_unless_running() {
        let mut engine = IntervalTimerEngine::new(settings());
        assert!(engine.pause(0).is_none());
        engine.start(0);
        engine.pause(1_000);
        assert!(engine.pause(2_000).is_none());
        assert_eq!(engine.state().elapsed_before_pause_ms, 1_000);
    }

    #[test]
    fn countdown_fires_for_three_two_one() {
        let mut engine = IntervalTimerEngine::new(Settings::new(5, 5, 0, 1).unwrap());
        let mut sink = RecordingSink::new();
        engine.start(0);
        engine.tick(0, &mut sink);
        assert_eq!(sink.take(), vec![Cue::Work]);

        let mut t = 0;
        while engine.status() == TimerStatus::Running {
            t += 250;
            engine.tick(t, &mut sink);
        }
        assert_eq!(
            sink.cues,
            vec![Cue::Countdown, Cue::Countdown, Cue::Countdown, Cue::Complete]
        );
    }

    fn countdowns_until_complete(settings: Settings) -> usize {
        let mut engine = IntervalTimerEngine::new(settings);
        let mut sink = RecordingSink::new();
        engine.start(0);
        let mut t = 0;
        while engine.status() == TimerStatus::Running {
            engine.tick(t, &mut sink);
            t += 100;
        }
        sink.cues.iter().filter(|c| **c == Cue::Countdown).count()
    }

    #[test]
    fn three_second_work_phase_counts_down_three_times() {
        assert_eq!(countdowns_until_complete(Settings::new(3, 1, 0, 1).unwrap()), 3);
    }

    #[test]
    fn three_second_prepare_counts_down_three_times() {
        // Prepare 3s (3 cues) then a 10s work phase (3 cues).
        assert_eq!(countdowns_until_complete(Settings::new(10, 1, 3, 1).unwrap()), 6);
    }

    #[test]
    fn short_phase_counts_down_remaining_seconds_only() {
        assert_eq!(countdowns_until_complete(Settings::new(2, 1, 0, 1).unwrap()), 2);
    }

    #[test]
    fn countdown_not_repeated_within_same_second() {
        let mut engine = IntervalTimerEngine::new(Settings::new(5, 5, 0, 1).unwrap());
        let mut sink = RecordingSink::new();
        engine.start(0);
        engine.tick(0, &mut sink);
        sink.take();
        engine.tick(2_000, &mut sink);
        engine.tick(2_100, &mut sink);
        engine.tick(2_900, &mut sink);
        assert_eq!(engine.remaining_secs(), 3);
        assert_eq!(sink.cues, vec![Cue::Countdown]);
    }

    #[test]
    fn large_gap_advances_one_phase_per_tick() {
        let mut engine = IntervalTimerEngine::new(settings());
        let mut sink = RecordingSink::new();
        engine.start(0);
        // Backgrounded for ten minutes.
        engine.tick(600_000, &mut sink);
        assert_eq!(engine.phase(), Phase::Work);
        engine.tick(600_000, &mut sink);
        assert_eq!(engine.phase(), Phase::Work);
        assert_eq!(engine.remaining_secs(), 30);
        engine.tick(630_000, &mut sink);
        assert_eq!(engine.phase(), Phase::Rest);
        assert_eq!(sink.cues, vec![Cue::Work, Cue::Rest]);
    }

    #[test]
    fn skip_during_prepare_enters_work() {
        let mut engine = IntervalTimerEngine::new(settings());
        engine.start(0);
        let event = engine.skip_to_next(1_200);
        assert!(matches!(
            event,
            Some(Event::PhaseSkipped { from: Phase::Prepare, to: Phase::Work, .. })
        ));
        assert_eq!(engine.phase(), Phase::Work);
        assert_eq!(engine.remaining_secs(), 30);
        assert_eq!(engine.status(), TimerStatus::Running);
        assert_eq!(engine.state().start_ms, Some(1_200));
    }

    #[test]
    fn skip_from_paused_resumes_running() {
        let mut engine = IntervalTimerEngine::new(settings());
        engine.start(0);
        engine.pause(2_000);
        engine.skip_to_next(9_000);
        assert_eq!(engine.status(), TimerStatus::Running);
        assert_eq!(engine.state().elapsed_before_pause_ms, 0);
        assert_eq!(engine.state().start_ms, Some(9_000));
    }

    #[test]
    fn skip_through_last_work_completes() {
        let mut engine = IntervalTimerEngine::new(settings());
        engine.start(0);
        engine.skip_to_next(0); // -> work 1
        engine.skip_to_next(0); // -> rest 1
        engine.skip_to_next(0); // -> work 2
        assert_eq!(engine.current_cycle(), 2);
        engine.skip_to_next(0);
        assert_eq!(engine.status(), TimerStatus::Completed);
        assert_eq!(engine.state().start_ms, None);
        assert!(engine.skip_to_next(0).is_none());
    }

    #[test]
    fn skip_is_noop_when_idle() {
        let mut engine = IntervalTimerEngine::new(settings());
        assert!(engine.skip_to_next(0).is_none());
        assert_eq!(engine.phase(), Phase::Prepare);
    }

    #[test]
    fn reset_restores_initial_state() {
        let fresh = IntervalTimerEngine::new(settings());
        let mut engine = fresh.clone();
        let mut sink = RecordingSink::new();
        engine.start(0);
        engine.tick(5_000, &mut sink);
        engine.tick(35_000, &mut sink);
        engine.pause(36_000);
        engine.reset();
        assert_eq!(engine.state(), fresh.state());
    }

    #[test]
    fn failing_sink_does_not_affect_state() {
        let mut engine = IntervalTimerEngine::new(settings());
        engine.start(0);
        let event = engine.tick(5_000, &mut FailingSink);
        assert!(matches!(event, Some(Event::PhaseChanged { to: Phase::Work, .. })));
        assert_eq!(engine.remaining_secs(), 30);
    }

    #[test]
    fn progress_tracks_whole_workout() {
        let mut engine = IntervalTimerEngine::new(settings());
        assert_eq!(engine.workout_progress_pct(), 0.0);
        let mut sink = RecordingSink::new();
        engine.start(0);
        engine.tick(5_000, &mut sink);
        engine.tick(20_000, &mut sink);
        // 5s prepare + 15s work of 80s total.
        assert!((engine.workout_progress_pct() - 25.0).abs() < 1e-9);
        assert!((engine.phase_progress() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn cycles_completed_counts_finished_work() {
        let mut engine = IntervalTimerEngine::new(settings());
        engine.start(0);
        assert_eq!(engine.cycles_completed(), 0);
        engine.skip_to_next(0);
        assert_eq!(engine.cycles_completed(), 0);
        engine.skip_to_next(0);
        assert_eq!(engine.cycles_completed(), 1);
        engine.skip_to_next(0);
        engine.skip_to_next(0);
        assert_eq!(engine.cycles_completed(), 2);
    }

    #[test]
    fn snapshot_reflects_state() {
        let engine = IntervalTimerEngine::new(settings());
        match engine.snapshot() {
            Event::StateSnapshot {
                status,
                phase,
                remaining_secs,
                cycles,
                ..
            } => {
                assert_eq!(status, TimerStatus::Idle);
                assert_eq!(phase, Phase::Prepare);
                assert_eq!(remaining_secs, 5);
                assert_eq!(cycles, 2);
            }
            other => panic!("Expected StateSnapshot, got {other:?}"),
        }
    }

    #[test]
    fn engine_survives_json_roundtrip_mid_run() {
        let mut engine = IntervalTimerEngine::new(settings());
        engine.start(0);
        engine.pause(3_000);
        let json = serde_json::to_string(&engine).unwrap();
        let restored: IntervalTimerEngine = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.state(), engine.state());
        assert_eq!(restored.settings(), engine.settings());
    }
}
