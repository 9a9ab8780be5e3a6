use clap::Subcommand;
use stillpoint_core::Database;

use super::CmdResult;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Totals for today and all time
    All,
    /// Most recent practices
    Recent {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

pub fn run(action: StatsAction) -> CmdResult {
    let db = Database::open()?;

    match action {
        StatsAction::All => {
            let stats = db.stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::Recent { limit } => {
            let records = db.recent_practice(limit)?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
    }
    Ok(())
}
