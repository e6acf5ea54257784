use clap::Args;
use hiit_core::{format_hms, format_mmss, Config};

use super::WorkoutArgs;

#[derive(Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub workout: WorkoutArgs,
    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: PlanArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let settings = args.workout.resolve(&config)?;
    let plan = settings.plan();

    if args.json {
        let out = serde_json::json!({
            "settings": settings,
            "total_secs": settings.total_duration_secs(),
            "phases": plan,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{:>3}  {:<8} {:>5}  {:>8}", "#", "PHASE", "CYCLE", "DURATION");
    for (i, step) in plan.iter().enumerate() {
        println!(
            "{:>3}  {:<8} {:>5}  {:>8}",
            i + 1,
            step.phase,
            step.cycle,
            format_mmss(step.duration_secs)
        );
    }
    println!("total: {}", format_hms(settings.total_duration_secs()));
    Ok(())
}
