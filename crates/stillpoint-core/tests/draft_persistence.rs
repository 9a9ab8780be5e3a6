//! Draft slot and practice log on a real SQLite file.

use chrono::Utc;
use stillpoint_core::api::OfflineSync;
use stillpoint_core::storage::PracticeRecord;
use stillpoint_core::{
    Database, Draft, DraftStore, Emotion, FlowKind, FlowStep, Page, PracticeController,
    PracticeSession, PracticeVariant, SessionDeps, SilentBackend, SqliteDraftStore,
};
use tempfile::TempDir;

fn store_at(dir: &TempDir) -> SqliteDraftStore {
    SqliteDraftStore::new(Database::open_at(&dir.path().join("stillpoint.db")).unwrap())
}

fn deps(dir: &TempDir) -> SessionDeps<OfflineSync> {
    SessionDeps {
        sync: OfflineSync,
        drafts: Box::new(store_at(dir)),
        audio: Box::new(SilentBackend::new(300_000)),
        autosave_interval_secs: 5,
    }
}

#[test]
fn test_draft_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let mut session = PracticeSession::new("4-4-4-breathing", FlowKind::Quick);
    session.page_index = 2;
    session.elapsed_secs = 61;
    session.answers.set("intention", "slow down");
    let draft = Draft::of(&session);

    store_at(&dir).save(&draft).unwrap();

    let reopened = store_at(&dir).load().unwrap().unwrap();
    assert_eq!(reopened, draft);
    assert_eq!(reopened.session.answers.get("intention"), Some("slow down"));
}

#[test]
fn test_second_save_overwrites_slot() {
    let dir = TempDir::new().unwrap();
    let store = store_at(&dir);
    let first = PracticeSession::new("4-6-breathing", FlowKind::Guided);
    let second = PracticeSession::new("4-7-8-breathing", FlowKind::Quick);
    store.save(&Draft::of(&first)).unwrap();
    store.save(&Draft::of(&second)).unwrap();

    let loaded = store.load().unwrap().unwrap();
    assert_eq!(loaded.session.id, second.id);
}

#[test]
fn test_interrupted_session_restores_after_restart() {
    let dir = TempDir::new().unwrap();
    {
        let mut ctl =
            PracticeController::start(PracticeVariant::four_six(), FlowKind::Guided, deps(&dir));
        ctl.next().unwrap();
        ctl.select_emotion(Emotion::Happy).unwrap();
        ctl.next().unwrap();
        ctl.next().unwrap();
        for _ in 0..12 {
            ctl.tick();
        }
        // Process killed here: no teardown, only the last autosave survives.
        std::mem::forget(ctl);
    }

    let ctl = PracticeController::launch(
        PracticeVariant::four_six(),
        FlowKind::Guided,
        deps(&dir),
        |_| true,
    )
    .unwrap();
    assert_eq!(ctl.page(), Page::Practice);
    assert_eq!(ctl.session().elapsed_secs, 10);
    assert_eq!(ctl.session().emotion, Some(Emotion::Happy));
}

#[test]
fn test_completed_session_leaves_no_draft() {
    let dir = TempDir::new().unwrap();
    let mut ctl =
        PracticeController::start(PracticeVariant::four_six(), FlowKind::Quick, deps(&dir));
    ctl.next().unwrap();
    ctl.next().unwrap();
    ctl.tick();
    ctl.next().unwrap();
    let FlowStep::Completed(record) = ctl.next().unwrap() else {
        panic!("expected completion");
    };
    drop(ctl);

    assert!(store_at(&dir).load().unwrap().is_none());

    let db = Database::open_at(&dir.path().join("stillpoint.db")).unwrap();
    db.record_practice(&record).unwrap();
    db.record_practice(&record).unwrap();
    let stats = db.stats().unwrap();
    assert_eq!(stats.total_sessions, 1);
    assert_eq!(stats.today_sessions, 1);
    assert_eq!(stats.by_variant.get("4-6-breathing"), Some(&1));
}

#[test]
fn test_recent_practice_newest_first() {
    let dir = TempDir::new().unwrap();
    let db = Database::open_at(&dir.path().join("stillpoint.db")).unwrap();
    let now = Utc::now();
    for (i, variant) in ["4-6-breathing", "4-4-4-breathing"].iter().enumerate() {
        db.record_practice(&PracticeRecord {
            session_id: format!("s-{i}"),
            variant_id: variant.to_string(),
            duration_secs: 60,
            started_at: now,
            completed_at: now + chrono::Duration::seconds(i as i64),
        })
        .unwrap();
    }
    let recent = db.recent_practice(10).unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].session_id, "s-1");
}
