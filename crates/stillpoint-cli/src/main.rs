use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "stillpoint-cli", version, about = "Stillpoint CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Breathing practices
    Practice {
        #[command(subcommand)]
        action: commands::practice::PracticeAction,
    },
    /// Saved draft of an unfinished practice
    Draft {
        #[command(subcommand)]
        action: commands::draft::DraftAction,
    },
    /// Account management
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
    /// Daily mood record
    Mood {
        #[command(subcommand)]
        action: commands::mood::MoodAction,
    },
    /// Emotion diary
    Diary {
        #[command(subcommand)]
        action: commands::diary::DiaryAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Local practice statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Practice { action } => commands::practice::run(action),
        Commands::Draft { action } => commands::draft::run(action),
        Commands::Auth { action } => commands::auth::run(action),
        Commands::Mood { action } => commands::mood::run(action),
        Commands::Diary { action } => commands::diary::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Stats { action } => commands::stats::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
