use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod bell;
mod commands;
mod common;

#[derive(Parser)]
#[command(name = "examroom", version, about = "Exam tracker with study timers")]
struct Cli {
    /// Answer yes to every confirmation prompt
    #[arg(long, short = 'y', global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Exam management
    Exam {
        #[command(subcommand)]
        action: commands::exam::ExamAction,
    },
    /// Study timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Print recorded study sessions for an exam as JSON
    History {
        /// Exam ID
        id: String,
    },
    /// Sound preferences
    Prefs {
        #[command(subcommand)]
        action: commands::prefs::PrefsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Live view: tick every exam until interrupted
    Watch {
        /// Stop after this many ticks
        #[arg(long)]
        ticks: Option<u64>,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("EXAMROOM_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();
    let yes = cli.yes;
    let result = match cli.command {
        Commands::Exam { action } => commands::exam::run(action, yes),
        Commands::Timer { action } => commands::timer::run(action, yes),
        Commands::History { id } => commands::timer::history(&id, yes),
        Commands::Prefs { action } => commands::prefs::run(action, yes),
        Commands::Config { action } => commands::config::run(action),
        Commands::Watch { ticks } => commands::watch::run(ticks, yes),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
