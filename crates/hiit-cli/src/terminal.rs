//! Terminal rendering of cues and the live countdown line.

use std::io::{self, Write};

use hiit_core::storage::CuesConfig;
use hiit_core::{format_mmss, Cue, CueError, CueSink, IntervalTimerEngine, Phase};

const BELL: &str = "\x07";

/// Prints cues as text, ringing the terminal bell when sound is enabled.
///
/// Banners print in quiet mode too; `quiet` only hides the live status line.
/// Terminals have no haptics, so `cues.vibration` is ignored here.
pub struct TerminalSink {
    sound: bool,
    countdown: bool,
    quiet: bool,
    last_line: Option<(Phase, u32, u64)>,
}

impl TerminalSink {
    pub fn new(cues: &CuesConfig, quiet: bool) -> Self {
        Self {
            sound: cues.sound && cues.volume > 0,
            countdown: cues.countdown,
            quiet,
            last_line: None,
        }
    }

    /// Redraw the countdown line if anything visible changed.
    pub fn render_status(&mut self, engine: &IntervalTimerEngine) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let key = (engine.phase(), engine.current_cycle(), engine.remaining_secs());
        if self.last_line == Some(key) {
            return Ok(());
        }
        self.last_line = Some(key);

        let mut out = io::stdout().lock();
        write!(
            out,
            "\r{:<9} {:>2}/{:<2}  {}  {:>5.1}%   ",
            engine.phase().as_str().to_uppercase(),
            engine.current_cycle(),
            engine.settings().cycles,
            format_mmss(engine.remaining_secs()),
            engine.workout_progress_pct(),
        )?;
        out.flush()
    }
}

fn banner(cue: Cue) -> &'static str {
    match cue {
        Cue::Work => ">> WORK",
        Cue::Rest => ">> REST",
        Cue::Complete => ">> DONE",
        Cue::Countdown => "",
    }
}

impl CueSink for TerminalSink {
    fn emit(&mut self, cue: Cue) -> Result<(), CueError> {
        if cue == Cue::Countdown && !self.countdown {
            return Ok(());
        }
        let mut out = io::stdout().lock();
        if self.sound {
            out.write_all(BELL.as_bytes())?;
        }
        if cue != Cue::Countdown {
            writeln!(out, "\n{}", banner(cue))?;
            self.last_line = None;
        }
        out.flush()?;
        Ok(())
    }
}
