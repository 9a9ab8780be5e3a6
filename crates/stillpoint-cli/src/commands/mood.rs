use clap::Subcommand;
use stillpoint_core::api::types::MoodEntry;
use stillpoint_core::Config;

use super::{api_client, runtime, CmdResult};

#[derive(Subcommand)]
pub enum MoodAction {
    /// Record today's mood (1-5)
    Record {
        score: u8,
        #[arg(long)]
        note: Option<String>,
    },
    /// Show today's mood
    Today,
    /// Mood history
    History {
        #[arg(long, default_value_t = 7)]
        days: u32,
    },
}

pub fn run(action: MoodAction) -> CmdResult {
    if let MoodAction::Record { score, .. } = &action {
        // Reject before touching the network.
        MoodEntry::new(*score, None)?;
    }

    let config = Config::load_or_default();
    let api = api_client(&config)?;
    let rt = runtime()?;

    match action {
        MoodAction::Record { score, note } => {
            rt.block_on(api.record_mood(&MoodEntry::new(score, note)?))?;
            println!("mood recorded");
        }
        MoodAction::Today => match rt.block_on(api.mood_today())? {
            Some(record) => println!("{} ({})", record.mood_score, record.recorded_at),
            None => println!("no mood recorded today"),
        },
        MoodAction::History { days } => {
            for record in rt.block_on(api.mood_history(days))? {
                match &record.note {
                    Some(note) => println!("{}  {}  {note}", record.recorded_at, record.mood_score),
                    None => println!("{}  {}", record.recorded_at, record.mood_score),
                }
            }
        }
    }
    Ok(())
}
