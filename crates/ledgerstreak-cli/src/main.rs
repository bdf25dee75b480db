use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "ledgerstreak", version, about = "Ledgerstreak CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record expenses, income and check-ins
    Activity {
        #[command(subcommand)]
        action: commands::activity::ActivityAction,
    },
    /// Award (or re-award) a day's score
    Award(commands::award::AwardArgs),
    /// Inspect stored daily scores
    Score {
        #[command(subcommand)]
        action: commands::score::ScoreAction,
    },
    /// Per-user and per-group totals over a date range
    Leaderboard(commands::leaderboard::LeaderboardArgs),
    /// Group membership management
    Group {
        #[command(subcommand)]
        action: commands::group::GroupAction,
    },
    /// Milestone catalog
    Milestones {
        #[command(subcommand)]
        action: commands::milestones::MilestonesAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("LEDGERSTREAK_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Activity { action } => commands::activity::run(action),
        Commands::Award(args) => commands::award::run(args),
        Commands::Score { action } => commands::score::run(action),
        Commands::Leaderboard(args) => commands::leaderboard::run(args),
        Commands::Group { action } => commands::group::run(action),
        Commands::Milestones { action } => commands::milestones::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "ledgerstreak",
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
