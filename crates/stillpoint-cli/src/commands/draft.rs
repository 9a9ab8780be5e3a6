use clap::Subcommand;
use stillpoint_core::{DraftStore, SqliteDraftStore};

use super::CmdResult;

#[derive(Subcommand)]
pub enum DraftAction {
    /// Show the saved draft, if any
    Show,
    /// Discard the saved draft
    Clear,
}

pub fn run(action: DraftAction) -> CmdResult {
    let store = SqliteDraftStore::open()?;

    match action {
        DraftAction::Show => match store.load()? {
            Some(draft) => println!("{}", serde_json::to_string_pretty(&draft)?),
            None => println!("no draft"),
        },
        DraftAction::Clear => {
            store.clear()?;
            println!("draft cleared");
        }
    }
    Ok(())
}
