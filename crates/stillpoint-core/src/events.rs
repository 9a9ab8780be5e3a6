use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::practice::PhaseKind;
use crate::session::Page;

/// Every state change in a practice session produces an Event.
/// The host drains them to drive animation, audio and display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SessionStarted {
        session_id: String,
        variant_id: String,
        at: DateTime<Utc>,
    },
    /// Session rebuilt from a saved draft.
    SessionRestored {
        session_id: String,
        page: Page,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    PageChanged {
        from: Page,
        to: Page,
        at: DateTime<Utc>,
    },
    /// A guarded transition was refused.
    TransitionBlocked {
        page: Page,
        reason: String,
        at: DateTime<Utc>,
    },
    PhaseChanged {
        from: PhaseKind,
        to: PhaseKind,
        cycle_index: u64,
        seconds_remaining: u64,
        at: DateTime<Utc>,
    },
    /// Host should animate towards `target_scale` over `duration_secs`.
    AnimationStarted {
        animation_id: u64,
        target_scale: f32,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    /// Host should stop the animation with this id.
    AnimationCancelled {
        animation_id: u64,
        at: DateTime<Utc>,
    },
    PracticePaused {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    PracticeResumed {
        elapsed_secs: u64,
        seconds_remaining: u64,
        at: DateTime<Utc>,
    },
    /// Target practice length reached.
    PracticeFinished {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    DraftSaved {
        session_id: String,
        page: Page,
        at: DateTime<Utc>,
    },
    DraftCleared {
        at: DateTime<Utc>,
    },
    SessionCompleted {
        session_id: String,
        total_secs: u64,
        at: DateTime<Utc>,
    },
    FlowExited {
        at: DateTime<Utc>,
    },
}
