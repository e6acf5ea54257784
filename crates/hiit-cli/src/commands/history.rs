use clap::Subcommand;
use hiit_core::{format_hms, Database};

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List recent workouts
    List {
        /// Maximum number of workouts to show
        #[arg(long, default_value = "10")]
        limit: usize,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print workout totals as JSON
    Stats,
}

pub fn run(action: HistoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    match action {
        HistoryAction::List { limit, json } => {
            let records = db.recent_workouts(limit)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
                return Ok(());
            }
            if records.is_empty() {
                println!("no workouts recorded");
            }
            for r in records {
                println!(
                    "{}  {}s/{}s x{}  {}/{} cycles  {}  {}",
                    r.ended_at.format("%Y-%m-%d %H:%M"),
                    r.settings.work_secs,
                    r.settings.rest_secs,
                    r.settings.cycles,
                    r.cycles_completed,
                    r.settings.cycles,
                    format_hms((r.ended_at - r.started_at).num_seconds().max(0) as u64),
                    if r.completed { "done" } else { "stopped" },
                );
            }
        }
        HistoryAction::Stats => {
            let stats = db.stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }
    Ok(())
}
