use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "habitflow", version, about = "Habitflow CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Current goal selection
    Goal {
        #[command(subcommand)]
        action: commands::goal::GoalAction,
    },
    /// Daily task management
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Multi-day challenges
    Challenge {
        #[command(subcommand)]
        action: commands::challenge::ChallengeAction,
    },
    /// Streak and weekly progress
    Streak {
        #[command(subcommand)]
        action: commands::streak::StreakAction,
    },
    /// Guided breathing sessions
    Breathe {
        #[command(subcommand)]
        action: commands::breathe::BreatheAction,
    },
    /// Reward catalog and unlocks
    Rewards {
        #[command(subcommand)]
        action: commands::rewards::RewardsAction,
    },
    /// Journal entries and reflections
    Journal {
        #[command(subcommand)]
        action: commands::journal::JournalAction,
    },
    /// Premium and trial status
    Access {
        #[command(subcommand)]
        action: commands::access::AccessAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("HABITFLOW_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Goal { action } => commands::goal::run(action),
        Commands::Task { action } => commands::task::run(action),
        Commands::Challenge { action } => commands::challenge::run(action),
        Commands::Streak { action } => commands::streak::run(action),
        Commands::Breathe { action } => commands::breathe::run(action),
        Commands::Rewards { action } => commands::rewards::run(action),
        Commands::Journal { action } => commands::journal::run(action),
        Commands::Access { action } => commands::access::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
