//! Request and response bodies for the remote API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;
use crate::session::{Emotion, FormAnswers};

/// The backend sends ids as either JSON numbers or strings.
fn string_or_number<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        S(String),
        N(i64),
    }
    Ok(match Id::deserialize(de)? {
        Id::S(s) => s,
        Id::N(n) => n.to_string(),
    })
}

// ── Auth ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub code: String,
    pub password: String,
}

/// Body of endpoints that only acknowledge.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
}

// ── Practice ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct StartPracticeRequest {
    pub practice_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartPracticeResponse {
    #[serde(deserialize_with = "string_or_number")]
    pub session_id: String,
}

/// Idempotent upsert of in-progress state, keyed by `session_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressUpdate {
    pub session_id: String,
    pub current_page: String,
    pub page_index: usize,
    pub elapsed_secs: u64,
    pub answers: FormAnswers,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionPayload {
    pub session_id: String,
    pub practice_type: String,
    pub total_duration_secs: u64,
    pub answers: FormAnswers,
    pub emotion: Option<Emotion>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeHistoryEntry {
    #[serde(deserialize_with = "string_or_number")]
    pub session_id: String,
    pub practice_type: String,
    #[serde(default)]
    pub total_duration_secs: u64,
    #[serde(default)]
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TodayStatus {
    #[serde(default)]
    pub completed_today: bool,
    #[serde(default)]
    pub sessions_today: u32,
    #[serde(default)]
    pub total_secs_today: u64,
}

/// Pre-migration progress body, sent to `practice/save-progress.php`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct LegacyProgress<'a> {
    pub session_id: &'a str,
    pub step: usize,
    pub seconds: u64,
    pub data: &'a FormAnswers,
}

/// Pre-migration completion body, sent to `practice/finish.php`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct LegacyFinish<'a> {
    pub session_id: &'a str,
    pub duration: u64,
    pub reflection: &'a FormAnswers,
}

// ── Mood & emotion diary ─────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodEntry {
    pub mood_score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl MoodEntry {
    /// # Errors
    /// Returns `OutOfRange` unless `mood_score` is 1 ..= 5.
    pub fn new(mood_score: u8, note: Option<String>) -> Result<Self, ValidationError> {
        if !(1..=5).contains(&mood_score) {
            return Err(ValidationError::OutOfRange {
                field: "mood_score".into(),
                message: format!("{mood_score} is not within 1-5"),
            });
        }
        Ok(Self { mood_score, note })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodRecord {
    pub mood_score: u8,
    #[serde(default)]
    pub note: Option<String>,
    pub recorded_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionDiaryEntry {
    pub emotion: Emotion,
    pub intensity: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl EmotionDiaryEntry {
    /// # Errors
    /// Returns `OutOfRange` unless `intensity` is 1 ..= 10.
    pub fn new(
        emotion: Emotion,
        intensity: u8,
        trigger: Option<String>,
        note: Option<String>,
    ) -> Result<Self, ValidationError> {
        if !(1..=10).contains(&intensity) {
            return Err(ValidationError::OutOfRange {
                field: "intensity".into(),
                message: format!("{intensity} is not within 1-10"),
            });
        }
        Ok(Self {
            emotion,
            intensity,
            trigger,
            note,
        })
    }
}
