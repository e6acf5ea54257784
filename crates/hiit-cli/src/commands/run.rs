use std::time::Duration;

use chrono::Utc;
use clap::Args;
use hiit_core::{
    format_hms, Clock, Config, Database, IntervalTimerEngine, MonotonicClock, TimerStatus,
};
use tracing::{debug, info, warn};

use super::WorkoutArgs;
use crate::terminal::TerminalSink;

/// Frame interval of the foreground runner.
const TICK_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub workout: WorkoutArgs,
    /// Print cue banners and the summary only, no live countdown line
    #[arg(long)]
    pub quiet: bool,
    /// Do not record the workout in history
    #[arg(long)]
    pub no_record: bool,
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let settings = args.workout.resolve(&config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let mut engine = IntervalTimerEngine::new(settings);
    let mut sink = TerminalSink::new(&config.cues, args.quiet);

    let started_at = Utc::now();
    let completed = runtime.block_on(drive(&mut engine, &mut sink))?;
    let ended_at = Utc::now();

    println!();
    println!(
        "{} {}/{} cycles in {}",
        if completed { "completed" } else { "stopped" },
        engine.cycles_completed(),
        settings.cycles,
        format_hms((ended_at - started_at).num_seconds().max(0) as u64),
    );

    if !args.no_record {
        let db = Database::open()?;
        db.record_workout(
            &settings,
            engine.cycles_completed(),
            completed,
            started_at,
            ended_at,
        )?;
    }
    Ok(())
}

/// Tick the engine until the workout completes (true) or Ctrl-C (false).
async fn drive(
    engine: &mut IntervalTimerEngine,
    sink: &mut TerminalSink,
) -> Result<bool, std::io::Error> {
    let clock = MonotonicClock::new();
    let mut interval = tokio::time::interval(TICK_INTERVAL);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    engine.start(clock.now_ms());
    info!(settings = ?engine.settings(), "workout started");

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Some(event) = engine.tick(clock.now_ms(), sink) {
                    debug!(?event, "transition");
                }
                if engine.status() == TimerStatus::Completed {
                    return Ok(true);
                }
                sink.render_status(engine)?;
            }
            res = &mut ctrl_c => {
                if let Err(e) = res {
                    warn!(error = %e, "failed to listen for Ctrl-C");
                }
                engine.pause(clock.now_ms());
                info!(phase = %engine.phase(), "workout interrupted");
                return Ok(false);
            }
        }
    }
}
