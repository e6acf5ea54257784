use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod terminal;

#[derive(Parser)]
#[command(name = "hiit-cli", version, about = "HIIT interval timer CLI")]
struct Cli {
    /// Log engine activity to stderr (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a workout in the foreground until it completes or Ctrl-C
    Run(commands::run::RunArgs),
    /// Step-by-step timer control with state kept between invocations
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Show the phase plan of a workout
    Plan(commands::plan::PlanArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Workout history
    History {
        #[command(subcommand)]
        action: commands::history::HistoryAction,
    },
    /// Print shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("hiit_core=debug,hiit_cli=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args),
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Plan(args) => commands::plan::run(args),
        Commands::Config { action } => commands::config::run(action),
        Commands::History { action } => commands::history::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "hiit-cli",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
