//! Guided practice sessions.
//!
//! - [`PracticeSession`]: the mutable, persisted record of one run
//! - [`PageFlow`]: ordered page sequence per flow kind
//! - [`PracticeController`]: ties pages, phase driver, audio, drafts and
//!   remote sync together

mod controller;
mod page;

pub use controller::{
    CompletionReceipt, ControllerState, FlowStep, PracticeController,
    SessionDeps,
};
pub use page::{FlowKind, Page, PageFlow, Transition};

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Free-text reflection fields keyed by semantic name.
///
/// Blank values are never stored, so "present" always means non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormAnswers(BTreeMap<String, String>);

impl FormAnswers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        let field = field.into();
        let value = value.into();
        if value.trim().is_empty() {
            self.0.remove(&field);
        } else {
            self.0.insert(field, value);
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormAnswers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut answers = FormAnswers::new();
        for (k, v) in iter {
            answers.set(k, v);
        }
        answers
    }
}

/// Emotion picked on the emotion-check page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Calm,
    Happy,
    Anxious,
    Stressed,
    Sad,
    Angry,
    Tired,
}

impl Emotion {
    pub const ALL: [Emotion; 7] = [
        Emotion::Calm,
        Emotion::Happy,
        Emotion::Anxious,
        Emotion::Stressed,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Tired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Calm => "calm",
            Emotion::Happy => "happy",
            Emotion::Anxious => "anxious",
            Emotion::Stressed => "stressed",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Tired => "tired",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Emotion::ALL
            .into_iter()
            .find(|e| e.as_str() == needle)
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "emotion".into(),
                message: format!("unknown emotion '{s}'"),
            })
    }
}

/// One guided practice run. This is exactly what a draft persists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeSession {
    pub id: String,
    pub variant_id: String,
    #[serde(default)]
    pub flow: FlowKind,
    pub page_index: usize,
    pub elapsed_secs: u64,
    #[serde(default)]
    pub answers: FormAnswers,
    #[serde(default)]
    pub emotion: Option<Emotion>,
    /// Identifier returned by the remote start-session call.
    #[serde(default)]
    pub remote_id: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl PracticeSession {
    pub fn new(variant_id: impl Into<String>, flow: FlowKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            variant_id: variant_id.into(),
            flow,
            page_index: 0,
            elapsed_secs: 0,
            answers: FormAnswers::new(),
            emotion: None,
            remote_id: None,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}
