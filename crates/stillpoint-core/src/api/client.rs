//! Thin JSON client for the remote Stillpoint API.
//!
//! Constructed explicitly from an [`ApiConfig`] and a [`TokenStore`]; there
//! is no global instance. Every failure is logged and returned to the
//! caller. Nothing is retried or queued here.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use super::token::TokenStore;
use super::types::*;
use crate::error::ApiError;
use crate::storage::ApiConfig;

/// Endpoint paths, relative to the configured base URL.
pub mod endpoints {
    pub const REGISTER: &str = "auth/register.php";
    pub const LOGIN: &str = "auth/login.php";
    pub const LOGOUT: &str = "auth/logout.php";
    pub const FORGOT_PASSWORD: &str = "auth/forgot-password.php";
    pub const RESET_PASSWORD: &str = "auth/reset-password.php";
    pub const PROFILE: &str = "user/profile.php";
    pub const PRACTICE_START: &str = "practice/start.php";
    pub const PRACTICE_UPDATE_PROGRESS: &str = "practice/update-progress.php";
    pub const PRACTICE_COMPLETE: &str = "practice/complete.php";
    pub const PRACTICE_HISTORY: &str = "practice/history.php";
    pub const PRACTICE_TODAY_STATUS: &str = "practice/today-status.php";
    pub const PRACTICE_SAVE_PROGRESS_LEGACY: &str = "practice/save-progress.php";
    pub const PRACTICE_FINISH_LEGACY: &str = "practice/finish.php";
    pub const MOOD_RECORD: &str = "mood/record.php";
    pub const MOOD_TODAY: &str = "mood/today.php";
    pub const MOOD_HISTORY: &str = "mood/history.php";
    pub const DIARY_SAVE: &str = "emotion-diary/save.php";
    pub const DIARY_TODAY: &str = "emotion-diary/today.php";
}

use endpoints as ep;

/// Client for the remote API.
#[derive(Clone)]
pub struct ApiClient {
    base_url: Url,
    http_client: Client,
    tokens: Arc<dyn TokenStore>,
}

impl ApiClient {
    /// Build a client.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the HTTP client
    /// cannot be constructed.
    pub fn new(config: &ApiConfig, tokens: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let mut base = config.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|_| ApiError::InvalidUrl(base.clone()))?;
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|source| ApiError::Transport {
                endpoint: base.clone(),
                source,
            })?;
        Ok(Self {
            base_url,
            http_client,
            tokens,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn tokens(&self) -> &dyn TokenStore {
        self.tokens.as_ref()
    }

    // ── Auth ─────────────────────────────────────────────────────────

    pub async fn register(&self, req: &RegisterRequest) -> Result<UserProfile, ApiError> {
        let resp: AuthResponse = self.post(ep::REGISTER, req).await?;
        self.tokens.set(&resp.token)?;
        Ok(resp.user)
    }

    /// Log in and store the returned token.
    pub async fn login(&self, req: &LoginRequest) -> Result<UserProfile, ApiError> {
        let resp: AuthResponse = self.post(ep::LOGIN, req).await?;
        self.tokens.set(&resp.token)?;
        tracing::info!(user = %resp.user.email, "logged in");
        Ok(resp.user)
    }

    /// Log out. The local token is cleared even when the remote call fails;
    /// the remote error is still returned.
    pub async fn logout(&self) -> Result<(), ApiError> {
        if !self.tokens.is_logged_in() {
            return Ok(());
        }
        let remote: Result<Ack, ApiError> = self.post(ep::LOGOUT, &serde_json::json!({})).await;
        self.tokens.clear()?;
        remote.map(|_| ())
    }

    pub async fn forgot_password(&self, req: &ForgotPasswordRequest) -> Result<Ack, ApiError> {
        self.post(ep::FORGOT_PASSWORD, req).await
    }

    pub async fn reset_password(&self, req: &ResetPasswordRequest) -> Result<Ack, ApiError> {
        self.post(ep::RESET_PASSWORD, req).await
    }

    pub async fn profile(&self) -> Result<UserProfile, ApiError> {
        self.get(ep::PROFILE, &[]).await
    }

    // ── Practice ─────────────────────────────────────────────────────

    pub async fn start_practice(&self, variant_id: &str) -> Result<String, ApiError> {
        let req = StartPracticeRequest {
            practice_type: variant_id.to_string(),
        };
        let resp: StartPracticeResponse = self.post(ep::PRACTICE_START, &req).await?;
        Ok(resp.session_id)
    }

    pub async fn update_progress(&self, update: &ProgressUpdate) -> Result<(), ApiError> {
        let _: Ack = self.post(ep::PRACTICE_UPDATE_PROGRESS, update).await?;
        Ok(())
    }

    pub async fn complete_practice(&self, payload: &CompletionPayload) -> Result<(), ApiError> {
        let _: Ack = self.post(ep::PRACTICE_COMPLETE, payload).await?;
        Ok(())
    }

    pub async fn practice_history(
        &self,
        limit: usize,
    ) -> Result<Vec<PracticeHistoryEntry>, ApiError> {
        self.get(ep::PRACTICE_HISTORY, &[("limit", limit.to_string())])
            .await
    }

    pub async fn today_status(&self) -> Result<TodayStatus, ApiError> {
        self.get(ep::PRACTICE_TODAY_STATUS, &[]).await
    }

    /// Pre-migration progress endpoint.
    #[deprecated(note = "use `update_progress`")]
    pub async fn save_progress(&self, update: &ProgressUpdate) -> Result<(), ApiError> {
        let body = LegacyProgress {
            session_id: &update.session_id,
            step: update.page_index,
            seconds: update.elapsed_secs,
            data: &update.answers,
        };
        let _: Ack = self.post(ep::PRACTICE_SAVE_PROGRESS_LEGACY, &body).await?;
        Ok(())
    }

    /// Pre-migration completion endpoint.
    #[deprecated(note = "use `complete_practice`")]
    pub async fn finish_practice(&self, payload: &CompletionPayload) -> Result<(), ApiError> {
        let body = LegacyFinish {
            session_id: &payload.session_id,
            duration: payload.total_duration_secs,
            reflection: &payload.answers,
        };
        let _: Ack = self.post(ep::PRACTICE_FINISH_LEGACY, &body).await?;
        Ok(())
    }

    // ── Mood & emotion diary ─────────────────────────────────────────

    pub async fn record_mood(&self, entry: &MoodEntry) -> Result<(), ApiError> {
        let _: Ack = self.post(ep::MOOD_RECORD, entry).await?;
        Ok(())
    }

    pub async fn mood_today(&self) -> Result<Option<MoodRecord>, ApiError> {
        self.get(ep::MOOD_TODAY, &[]).await
    }

    pub async fn mood_history(&self, days: u32) -> Result<Vec<MoodRecord>, ApiError> {
        self.get(ep::MOOD_HISTORY, &[("days", days.to_string())])
            .await
    }

    pub async fn save_diary(&self, entry: &EmotionDiaryEntry) -> Result<(), ApiError> {
        let _: Ack = self.post(ep::DIARY_SAVE, entry).await?;
        Ok(())
    }

    pub async fn diary_today(&self) -> Result<Vec<EmotionDiaryEntry>, ApiError> {
        self.get(ep::DIARY_TODAY, &[]).await
    }

    // ── Internal ─────────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        self.send::<(), T>(Method::GET, path, None, query).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(Method::POST, path, Some(body), &[]).await
    }

    async fn send<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|_| ApiError::InvalidUrl(format!("{}{path}", self.base_url)))?;

        let mut request = self
            .http_client
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json");
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = self.tokens.get()? {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let result = async {
            let resp = request.send().await.map_err(|source| ApiError::Transport {
                endpoint: path.to_string(),
                source,
            })?;
            let status = resp.status();
            let text = resp.text().await.map_err(|source| ApiError::Transport {
                endpoint: path.to_string(),
                source,
            })?;
            decode(path, status.as_u16(), status.is_success(), &text)
        }
        .await;

        if let Err(e) = &result {
            tracing::warn!(endpoint = path, error = %e, "API request failed");
        }
        result
    }
}

/// Turn a raw response into `T`.
///
/// Bodies may wrap their payload as `{"success": ..., "data": ...}`; a
/// `success: false` body is an application error even with a 2xx status.
fn decode<T: DeserializeOwned>(
    endpoint: &str,
    status: u16,
    is_success: bool,
    text: &str,
) -> Result<T, ApiError> {
    let parsed: Result<Value, _> = serde_json::from_str(text);

    if !is_success {
        let message = parsed
            .ok()
            .as_ref()
            .and_then(error_message)
            .unwrap_or_else(|| truncate(text, 200));
        return Err(ApiError::Status {
            endpoint: endpoint.to_string(),
            status,
            message,
        });
    }

    let value = parsed.map_err(|e| ApiError::MalformedBody {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })?;

    if value.get("success") == Some(&Value::Bool(false)) {
        return Err(ApiError::Status {
            endpoint: endpoint.to_string(),
            status,
            message: error_message(&value).unwrap_or_else(|| "request rejected".into()),
        });
    }

    let payload = match value {
        Value::Object(mut map) => match map.remove("data") {
            Some(data) => data,
            None => Value::Object(map),
        },
        other => other,
    };

    serde_json::from_value(payload).map_err(|e| ApiError::MalformedBody {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })
}

fn error_message(value: &Value) -> Option<String> {
    ["message", "error"]
        .iter()
        .find_map(|k| value.get(*k).and_then(Value::as_str))
        .map(str::to_string)
}

fn truncate(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return "empty response".into();
    }
    trimmed.chars().take(max_chars).collect()
}
