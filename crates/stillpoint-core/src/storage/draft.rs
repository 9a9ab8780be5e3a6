//! Single-slot draft persistence.
//!
//! A draft is the last saved snapshot of an in-progress practice. There is
//! at most one per installation and every save overwrites it.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::database::Database;
use crate::error::StorageError;
use crate::session::PracticeSession;

const DRAFT_KEY: &str = "practice_draft";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub session: PracticeSession,
    pub saved_at: DateTime<Utc>,
}

impl Draft {
    pub fn of(session: &PracticeSession) -> Self {
        Self {
            session: session.clone(),
            saved_at: Utc::now(),
        }
    }
}

pub trait DraftStore: Send {
    /// Overwrite the slot.
    fn save(&self, draft: &Draft) -> Result<(), StorageError>;
    fn load(&self) -> Result<Option<Draft>, StorageError>;
    /// Empty the slot. Clearing an empty slot is not an error.
    fn clear(&self) -> Result<(), StorageError>;
}

/// Draft slot backed by the application database's kv table.
pub struct SqliteDraftStore {
    db: Database,
}

impl SqliteDraftStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open the default application database.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened.
    pub fn open() -> Result<Self, StorageError> {
        Ok(Self::new(Database::open()?))
    }
}

impl DraftStore for SqliteDraftStore {
    fn save(&self, draft: &Draft) -> Result<(), StorageError> {
        let json = serde_json::to_string(draft).map_err(|e| StorageError::Corrupt {
            key: DRAFT_KEY.into(),
            message: e.to_string(),
        })?;
        self.db.kv_set(DRAFT_KEY, &json)
    }

    fn load(&self) -> Result<Option<Draft>, StorageError> {
        let Some(json) = self.db.kv_get(DRAFT_KEY)? else {
            return Ok(None);
        };
        serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| StorageError::Corrupt {
                key: DRAFT_KEY.into(),
                message: e.to_string(),
            })
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.db.kv_delete(DRAFT_KEY)
    }
}

/// Process-local draft slot. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryDraftStore {
    slot: Arc<Mutex<Option<Draft>>>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<Draft>>, StorageError> {
        self.slot
            .lock()
            .map_err(|_| StorageError::QueryFailed("draft slot poisoned".into()))
    }
}

impl DraftStore for MemoryDraftStore {
    fn save(&self, draft: &Draft) -> Result<(), StorageError> {
        *self.lock()? = Some(draft.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<Draft>, StorageError> {
        Ok(self.lock()?.clone())
    }

    fn clear(&self) -> Result<(), StorageError> {
        *self.lock()? = None;
        Ok(())
    }
}

/// Draft waiting to be offered on launch, if any.
///
/// A corrupt or unreadable slot is logged and treated as empty, as is a
/// draft whose session already completed.
pub fn pending_draft(store: &dyn DraftStore) -> Option<Draft> {
    match store.load() {
        Ok(Some(draft)) if !draft.session.is_completed() => Some(draft),
        Ok(Some(_)) => {
            tracing::warn!("discarding draft of an already completed session");
            if let Err(e) = store.clear() {
                tracing::warn!(error = %e, "failed to clear stale draft");
            }
            None
        }
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(error = %e, "draft unreadable, starting fresh");
            None
        }
    }
}
