use chrono::{DateTime, Utc};
use clap::Subcommand;
use hiit_core::{
    Clock, Config, Database, Event, IntervalTimerEngine, RecordingSink, SystemClock, TimerStatus,
};
use serde::{Deserialize, Serialize};

use super::WorkoutArgs;

const ENGINE_KEY: &str = "timer_engine";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a workout (or resume a paused one)
    Start {
        #[command(flatten)]
        workout: WorkoutArgs,
    },
    /// Pause the running workout
    Pause,
    /// Resume a paused workout
    Resume,
    /// Jump to the next phase
    Skip,
    /// Reset to idle state
    Reset,
    /// Advance the timer and print its state as JSON
    Status,
}

/// Engine plus bookkeeping for the history record.
#[derive(Serialize, Deserialize)]
struct PersistedRun {
    engine: IntervalTimerEngine,
    #[serde(default)]
    started_at: Option<DateTime<Utc>>,
}

fn load_run(db: &Database, config: &Config) -> Result<PersistedRun, Box<dyn std::error::Error>> {
    if let Some(json) = db.kv_get(ENGINE_KEY)? {
        match serde_json::from_str::<PersistedRun>(&json) {
            Ok(run) => return Ok(run),
            Err(e) => tracing::warn!(error = %e, "discarding unreadable timer state"),
        }
    }
    Ok(PersistedRun {
        engine: IntervalTimerEngine::new(config.settings()?),
        started_at: None,
    })
}

fn save_run(db: &Database, run: &PersistedRun) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string(run)?;
    db.kv_set(ENGINE_KEY, &json)?;
    Ok(())
}

/// Write the run to history once, completed or not.
fn record(db: &Database, run: &mut PersistedRun) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(started_at) = run.started_at.take() {
        db.record_workout(
            run.engine.settings(),
            run.engine.cycles_completed(),
            run.engine.status() == TimerStatus::Completed,
            started_at,
            Utc::now(),
        )?;
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_event_or_snapshot(
    event: Option<Event>,
    engine: &IntervalTimerEngine,
) -> Result<(), Box<dyn std::error::Error>> {
    match event {
        Some(event) => print_json(&event),
        None => print_json(&engine.snapshot()),
    }
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let db = Database::open()?;
    let mut run = load_run(&db, &config)?;
    let now = SystemClock.now_ms();

    match action {
        TimerAction::Start { workout } => {
            if run.engine.status() == TimerStatus::Completed {
                run.engine.reset();
            }
            if run.engine.status() == TimerStatus::Idle {
                if !workout.is_empty() {
                    run.engine.set_settings(workout.resolve(&config)?);
                }
                run.started_at = Some(Utc::now());
            } else if !workout.is_empty() {
                return Err(
                    "a workout is already in progress; run `timer reset` before choosing another"
                        .into(),
                );
            }
            let event = run.engine.start(now);
            print_event_or_snapshot(event, &run.engine)?;
        }
        TimerAction::Pause => {
            let event = run.engine.pause(now);
            print_event_or_snapshot(event, &run.engine)?;
        }
        TimerAction::Resume => {
            let event = match run.engine.status() {
                TimerStatus::Paused => run.engine.start(now),
                _ => None,
            };
            print_event_or_snapshot(event, &run.engine)?;
        }
        TimerAction::Skip => {
            let event = run.engine.skip_to_next(now);
            if run.engine.status() == TimerStatus::Completed {
                record(&db, &mut run)?;
            }
            print_event_or_snapshot(event, &run.engine)?;
        }
        TimerAction::Reset => {
            record(&db, &mut run)?;
            if let Some(event) = run.engine.reset() {
                print_json(&event)?;
            }
        }
        TimerAction::Status => {
            let mut cues = RecordingSink::new();
            let transition = run.engine.tick(now, &mut cues);
            print_json(&run.engine.snapshot())?;
            for cue in cues.take() {
                print_json(&serde_json::json!({ "type": "Cue", "cue": cue }))?;
            }
            if let Some(event) = transition {
                print_json(&event)?;
            }
            if run.engine.status() == TimerStatus::Completed {
                record(&db, &mut run)?;
            }
        }
    }

    save_run(&db, &run)?;
    Ok(())
}
