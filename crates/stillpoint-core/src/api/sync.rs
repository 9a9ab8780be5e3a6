//! The remote sync seam used by the practice controller.

use uuid::Uuid;

use super::client::ApiClient;
use super::types::{CompletionPayload, ProgressUpdate};
use crate::error::ApiError;

/// Start / update-progress / complete, consumed by [`crate::PracticeController`].
///
/// Implementations surface every failure; retrying is the caller's call.
#[allow(async_fn_in_trait)]
pub trait PracticeSync {
    /// Returns the remote session identifier.
    async fn start_session(&self, variant_id: &str) -> Result<String, ApiError>;
    /// Idempotent upsert keyed by `update.session_id`.
    async fn update_progress(&self, update: &ProgressUpdate) -> Result<(), ApiError>;
    async fn complete_session(&self, payload: &CompletionPayload) -> Result<(), ApiError>;
}

impl PracticeSync for ApiClient {
    async fn start_session(&self, variant_id: &str) -> Result<String, ApiError> {
        self.start_practice(variant_id).await
    }

    async fn update_progress(&self, update: &ProgressUpdate) -> Result<(), ApiError> {
        ApiClient::update_progress(self, update).await
    }

    async fn complete_session(&self, payload: &CompletionPayload) -> Result<(), ApiError> {
        self.complete_practice(payload).await
    }
}

/// Accepts everything locally. Used when nobody is logged in.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineSync;

impl PracticeSync for OfflineSync {
    async fn start_session(&self, variant_id: &str) -> Result<String, ApiError> {
        let id = format!("local-{}", Uuid::new_v4());
        tracing::debug!(variant_id, id = %id, "offline session started");
        Ok(id)
    }

    async fn update_progress(&self, update: &ProgressUpdate) -> Result<(), ApiError> {
        tracing::debug!(session_id = %update.session_id, "offline progress dropped");
        Ok(())
    }

    async fn complete_session(&self, payload: &CompletionPayload) -> Result<(), ApiError> {
        tracing::debug!(session_id = %payload.session_id, "offline completion dropped");
        Ok(())
    }
}
