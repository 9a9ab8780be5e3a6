use clap::Subcommand;
use stillpoint_core::api::types::EmotionDiaryEntry;
use stillpoint_core::{Config, Emotion};

use super::{api_client, runtime, CmdResult};

#[derive(Subcommand)]
pub enum DiaryAction {
    /// Save an emotion diary entry
    Save {
        /// calm, happy, anxious, stressed, sad, angry or tired
        emotion: Emotion,
        /// Intensity 1-10
        intensity: u8,
        #[arg(long)]
        trigger: Option<String>,
        #[arg(long)]
        note: Option<String>,
    },
    /// Today's entries
    Today {
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: DiaryAction) -> CmdResult {
    match action {
        DiaryAction::Save {
            emotion,
            intensity,
            trigger,
            note,
        } => {
            let entry = EmotionDiaryEntry::new(emotion, intensity, trigger, note)?;
            let api = api_client(&Config::load_or_default())?;
            runtime()?.block_on(api.save_diary(&entry))?;
            println!("diary entry saved");
        }
        DiaryAction::Today { json } => {
            let api = api_client(&Config::load_or_default())?;
            let entries = runtime()?.block_on(api.diary_today())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
                return Ok(());
            }
            if entries.is_empty() {
                println!("no entries today");
            }
            for e in entries {
                println!("{} {}/10", e.emotion, e.intensity);
            }
        }
    }
    Ok(())
}
