//! Practice session controller.
//!
//! Owns one [`PracticeSession`] from launch to teardown. The host drives it
//! with a 1 s `tick()`, a 100 ms `poll_audio()` and user navigation, and
//! drains [`Event`]s to update the screen.
//!
//! Draft policy:
//! - saved on entering a resumable page
//! - saved every `autosave_interval_secs` while active
//! - saved on teardown unless completed or still on the first page
//! - cleared only on completion, explicit discard or backing out of the
//!   first page

use chrono::Utc;

use super::page::{FlowKind, Page, PageFlow, Transition};
use super::{Emotion, PracticeSession};
use crate::api::types::{CompletionPayload, ProgressUpdate};
use crate::api::PracticeSync;
use crate::audio::{AudioBackend, AudioSession, PlaybackStatus};
use crate::error::{ApiError, CoreError, ValidationError};
use crate::events::Event;
use crate::practice::{find_variant, Animation, DriverState, PhaseDriver, PhaseInfo, PracticeVariant};
use crate::storage::draft::pending_draft;
use crate::storage::{Draft, DraftStore, PracticeRecord};

/// Collaborators handed to a controller.
pub struct SessionDeps<S> {
    pub sync: S,
    pub drafts: Box<dyn DraftStore>,
    pub audio: Box<dyn AudioBackend>,
    pub autosave_interval_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Active,
    /// Success page reached.
    Completed,
    /// User backed out of the flow or discarded it.
    Exited,
    /// Torn down; no further effects.
    Closed,
}

/// Outcome of a navigation command.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowStep {
    Moved { from: Page, to: Page },
    Blocked { page: Page, reason: String },
    Exited,
    /// Success reached. The draft is cleared; the record is ready for the
    /// local practice log.
    Completed(PracticeRecord),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionReceipt {
    pub remote_id: String,
    pub payload: CompletionPayload,
}

pub struct PracticeController<S: PracticeSync> {
    session: PracticeSession,
    variant: PracticeVariant,
    flow: PageFlow,
    driver: PhaseDriver,
    audio: AudioSession,
    drafts: Box<dyn DraftStore>,
    sync: S,
    autosave_interval_secs: u64,
    secs_since_save: u64,
    state: ControllerState,
    receipt: Option<CompletionReceipt>,
    events: Vec<Event>,
    on_exit: Option<Box<dyn FnMut() + Send>>,
}

impl<S: PracticeSync> PracticeController<S> {
    /// Start a fresh session on the first page of `flow`.
    pub fn start(variant: PracticeVariant, flow: FlowKind, deps: SessionDeps<S>) -> Self {
        let session = PracticeSession::new(variant.id.clone(), flow);
        tracing::info!(session_id = %session.id, variant = %variant.id, "practice session started");
        let mut ctl = Self::assemble(session, variant, PageFlow::new(flow), deps);
        ctl.events.push(Event::SessionStarted {
            session_id: ctl.session.id.clone(),
            variant_id: ctl.variant.id.clone(),
            at: Utc::now(),
        });
        ctl
    }

    /// Rebuild a session from a saved draft, at its recorded page and time.
    ///
    /// # Errors
    /// Returns an error if the draft names an unknown variant or a page
    /// index past the end of its flow.
    pub fn restore(draft: Draft, deps: SessionDeps<S>) -> Result<Self, CoreError> {
        let session = draft.session;
        let variant = find_variant(&session.variant_id)?;
        let flow = PageFlow::at(session.flow, session.page_index)?;
        tracing::info!(
            session_id = %session.id,
            page = flow.current().as_str(),
            elapsed = session.elapsed_secs,
            "practice session restored"
        );

        let mut ctl = Self::assemble(session, variant, flow, deps);
        ctl.events.push(Event::SessionRestored {
            session_id: ctl.session.id.clone(),
            page: flow.current(),
            elapsed_secs: ctl.session.elapsed_secs,
            at: Utc::now(),
        });
        ctl.enter_page(flow.current());
        Ok(ctl)
    }

    /// Offer the pending draft (if any) to `accept`. Accepted drafts are
    /// restored; declined ones are discarded and a fresh session starts.
    /// A draft that can no longer be restored (retired variant, page past
    /// the end of its flow) is discarded without being offered.
    ///
    /// # Errors
    /// Returns an error if an accepted draft cannot be restored.
    pub fn launch(
        variant: PracticeVariant,
        flow: FlowKind,
        deps: SessionDeps<S>,
        accept: impl FnOnce(&Draft) -> bool,
    ) -> Result<Self, CoreError> {
        let pending = pending_draft(deps.drafts.as_ref()).filter(|draft| {
            match restorable(draft) {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(error = %e, "draft cannot be restored, starting fresh");
                    false
                }
            }
        });
        match pending {
            Some(draft) if accept(&draft) => Self::restore(draft, deps),
            _ => {
                if let Err(e) = deps.drafts.clear() {
                    tracing::warn!(error = %e, "failed to discard draft");
                }
                Ok(Self::start(variant, flow, deps))
            }
        }
    }

    /// Called when the user backs out of the first page.
    pub fn with_exit_hook(mut self, hook: impl FnMut() + Send + 'static) -> Self {
        self.on_exit = Some(Box::new(hook));
        self
    }

    fn assemble(
        session: PracticeSession,
        variant: PracticeVariant,
        flow: PageFlow,
        deps: SessionDeps<S>,
    ) -> Self {
        let driver = PhaseDriver::resume_from(variant.clone(), session.elapsed_secs);
        Self {
            session,
            variant,
            flow,
            driver,
            audio: AudioSession::new(deps.audio),
            drafts: deps.drafts,
            sync: deps.sync,
            autosave_interval_secs: deps.autosave_interval_secs.max(1),
            secs_since_save: 0,
            state: ControllerState::Active,
            receipt: None,
            events: Vec::new(),
            on_exit: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn session(&self) -> &PracticeSession {
        &self.session
    }

    pub fn variant(&self) -> &PracticeVariant {
        &self.variant
    }

    pub fn page(&self) -> Page {
        self.flow.current()
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn phase(&self) -> Option<PhaseInfo> {
        self.driver.current_phase()
    }

    pub fn driver_state(&self) -> DriverState {
        self.driver.state()
    }

    pub fn active_animation(&self) -> Option<&Animation> {
        self.driver.active_animation()
    }

    pub fn audio(&self) -> &AudioSession {
        &self.audio
    }

    /// Events produced since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Swap the variant. Only allowed on the selection page.
    pub fn choose_variant(&mut self, variant: PracticeVariant) -> Result<(), CoreError> {
        self.require_active()?;
        self.require_page(Page::Selection, "choose_variant")?;
        self.session.variant_id = variant.id.clone();
        self.session.elapsed_secs = 0;
        self.driver = PhaseDriver::new(variant.clone());
        self.variant = variant;
        Ok(())
    }

    pub fn select_emotion(&mut self, emotion: Emotion) -> Result<(), CoreError> {
        self.require_active()?;
        self.require_page(Page::EmotionCheck, "select_emotion")?;
        self.session.emotion = Some(emotion);
        Ok(())
    }

    /// Record a free-text answer. Blank values remove the field.
    pub fn set_answer(&mut self, field: &str, value: &str) -> Result<(), CoreError> {
        self.require_active()?;
        self.session.answers.set(field, value);
        Ok(())
    }

    pub fn next(&mut self) -> Result<FlowStep, CoreError> {
        self.require_active()?;
        let t = self.flow.next(&self.session);
        Ok(self.apply(t))
    }

    /// Step back one page. Once the practice has run to its end it cannot
    /// be re-entered from the completion page.
    pub fn back(&mut self) -> Result<FlowStep, CoreError> {
        self.require_active()?;
        if self.page() == Page::Completion && self.driver.state() == DriverState::Finished {
            return Ok(self.apply(Transition::Blocked {
                page: Page::Completion,
                reason: "practice already finished".into(),
            }));
        }
        let t = self.flow.back();
        Ok(self.apply(t))
    }

    pub fn skip_mood_record(&mut self) -> Result<FlowStep, CoreError> {
        self.require_active()?;
        let t = self.flow.skip_mood_record();
        Ok(self.apply(t))
    }

    /// Host's one-second tick. Returns the automatic step to the next page
    /// when the practice reaches its target length.
    pub fn tick(&mut self) -> Option<FlowStep> {
        if self.state != ControllerState::Active {
            return None;
        }

        let mut finished = false;
        if self.page() == Page::Practice {
            let events = self.driver.tick();
            finished = events
                .iter()
                .any(|e| matches!(e, Event::PracticeFinished { .. }));
            self.events.extend(events);
            self.session.elapsed_secs = self.driver.elapsed_secs();
        }

        self.secs_since_save += 1;
        if self.secs_since_save >= self.autosave_interval_secs && self.flow.is_resumable() {
            self.save_draft();
        }

        if finished {
            let t = self.flow.next(&self.session);
            return Some(self.apply(t));
        }
        None
    }

    pub fn pause(&mut self) -> Result<(), CoreError> {
        self.require_active()?;
        self.require_page(Page::Practice, "pause")?;
        let events = self.driver.pause();
        if !events.is_empty() {
            if let Err(e) = self.audio.pause() {
                tracing::warn!(error = %e, "audio pause failed");
            }
        }
        self.events.extend(events);
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), CoreError> {
        self.require_active()?;
        self.require_page(Page::Practice, "resume")?;
        let events = self.driver.resume();
        if !events.is_empty() {
            self.sync_audio_position();
            if let Err(e) = self.audio.play() {
                tracing::warn!(error = %e, "audio resume failed");
            }
        }
        self.events.extend(events);
        Ok(())
    }

    pub fn set_volume(&mut self, percent: u8) -> Result<(), CoreError> {
        Ok(self.audio.set_volume(percent)?)
    }

    pub fn set_muted(&mut self, muted: bool) -> Result<(), CoreError> {
        Ok(self.audio.set_muted(muted)?)
    }

    pub fn toggle_mute(&mut self) -> Result<bool, CoreError> {
        Ok(self.audio.toggle_mute()?)
    }

    /// Host's 100 ms audio status poll.
    pub fn poll_audio(&self) -> Option<PlaybackStatus> {
        self.audio.poll()
    }

    /// Explicit user discard: drop the draft and leave the flow.
    pub fn discard(&mut self) {
        if self.state == ControllerState::Closed {
            return;
        }
        let page = self.page();
        self.leave_page(page);
        self.clear_draft();
        self.state = ControllerState::Exited;
        tracing::info!(session_id = %self.session.id, "practice session discarded");
    }

    /// Release the audio handle and timers. A still-active session is saved
    /// so it can be offered again on next launch. Idempotent.
    pub fn teardown(&mut self) {
        if self.state == ControllerState::Closed {
            return;
        }
        if self.state == ControllerState::Active && !self.flow.is_first() {
            self.save_draft();
        }
        let page = self.page();
        self.leave_page(page);
        self.state = ControllerState::Closed;
    }

    // ── Remote sync ──────────────────────────────────────────────────

    /// Remote session id, creating the remote session on first use.
    pub async fn ensure_remote(&mut self) -> Result<String, ApiError> {
        if let Some(id) = &self.session.remote_id {
            return Ok(id.clone());
        }
        let id = self.sync.start_session(&self.variant.id).await?;
        self.session.remote_id = Some(id.clone());
        if self.state == ControllerState::Active && self.flow.is_resumable() {
            self.save_draft();
        }
        Ok(id)
    }

    /// Push current page, time and answers. Safe to repeat.
    pub async fn sync_progress(&mut self) -> Result<(), ApiError> {
        let session_id = self.ensure_remote().await?;
        let update = ProgressUpdate {
            session_id,
            current_page: self.page().as_str().to_string(),
            page_index: self.flow.index(),
            elapsed_secs: self.session.elapsed_secs,
            answers: self.session.answers.clone(),
        };
        self.sync.update_progress(&update).await
    }

    /// Send the completion payload. Only valid once the flow has completed.
    /// A failed call can be retried; a successful one is not repeated.
    pub async fn submit_completion(&mut self) -> Result<CompletionReceipt, CoreError> {
        if self.state != ControllerState::Completed {
            return Err(ValidationError::WrongPage {
                operation: "submit_completion".into(),
                page: self.page().as_str().into(),
            }
            .into());
        }
        if let Some(receipt) = &self.receipt {
            return Ok(receipt.clone());
        }

        let remote_id = self.ensure_remote().await?;
        let payload = CompletionPayload {
            session_id: remote_id.clone(),
            practice_type: self.variant.id.clone(),
            total_duration_secs: self.session.elapsed_secs,
            answers: self.session.answers.clone(),
            emotion: self.session.emotion,
            started_at: self.session.started_at,
            completed_at: self.session.completed_at.unwrap_or_else(Utc::now),
        };
        self.sync.complete_session(&payload).await?;
        tracing::info!(session_id = %self.session.id, remote_id = %remote_id, "completion synced");

        let receipt = CompletionReceipt { remote_id, payload };
        self.receipt = Some(receipt.clone());
        Ok(receipt)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn apply(&mut self, transition: Transition) -> FlowStep {
        match transition {
            Transition::Moved { from, to } => {
                tracing::debug!(from = from.as_str(), to = to.as_str(), "page changed");
                self.leave_page(from);
                self.session.page_index = self.flow.index();
                self.events.push(Event::PageChanged {
                    from,
                    to,
                    at: Utc::now(),
                });
                if self.flow.is_terminal() {
                    return FlowStep::Completed(self.complete_locally());
                }
                self.enter_page(to);
                FlowStep::Moved { from, to }
            }
            Transition::Blocked { page, reason } => {
                self.events.push(Event::TransitionBlocked {
                    page,
                    reason: reason.clone(),
                    at: Utc::now(),
                });
                FlowStep::Blocked { page, reason }
            }
            Transition::Exit => {
                let page = self.page();
                self.leave_page(page);
                // Backing out of the flow abandons the session.
                self.clear_draft();
                self.state = ControllerState::Exited;
                self.events.push(Event::FlowExited { at: Utc::now() });
                if let Some(hook) = self.on_exit.as_mut() {
                    hook();
                }
                FlowStep::Exited
            }
        }
    }

    fn enter_page(&mut self, page: Page) {
        if page == Page::Practice {
            match self.audio.load(&self.variant.audio_asset) {
                Ok(()) => {
                    self.sync_audio_position();
                    if let Err(e) = self.audio.play() {
                        tracing::warn!(error = %e, "audio play failed");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "practice continues without audio"),
            }
            let events = self.driver.start();
            self.events.extend(events);
        }
        if self.flow.is_resumable() {
            self.save_draft();
        }
    }

    fn leave_page(&mut self, page: Page) {
        if page == Page::Practice {
            let events = self.driver.stop();
            self.events.extend(events);
            self.audio.stop();
        }
    }

    fn sync_audio_position(&mut self) {
        if !self.audio.is_loaded() {
            return;
        }
        let position_ms = self.driver.elapsed_secs().saturating_mul(1000);
        if let Err(e) = self.audio.seek(position_ms) {
            tracing::warn!(error = %e, "audio seek failed");
        }
    }

    fn complete_locally(&mut self) -> PracticeRecord {
        let completed_at = Utc::now();
        self.session.completed_at = Some(completed_at);
        self.state = ControllerState::Completed;
        self.clear_draft();
        self.events.push(Event::SessionCompleted {
            session_id: self.session.id.clone(),
            total_secs: self.session.elapsed_secs,
            at: completed_at,
        });
        tracing::info!(
            session_id = %self.session.id,
            total_secs = self.session.elapsed_secs,
            "practice session completed"
        );
        PracticeRecord {
            session_id: self.session.id.clone(),
            variant_id: self.variant.id.clone(),
            duration_secs: self.session.elapsed_secs,
            started_at: self.session.started_at,
            completed_at,
        }
    }

    fn save_draft(&mut self) {
        self.secs_since_save = 0;
        match self.drafts.save(&Draft::of(&self.session)) {
            Ok(()) => {
                tracing::debug!(session_id = %self.session.id, page = self.page().as_str(), "draft saved");
                self.events.push(Event::DraftSaved {
                    session_id: self.session.id.clone(),
                    page: self.page(),
                    at: Utc::now(),
                });
            }
            Err(e) => tracing::warn!(error = %e, "draft save failed, continuing in memory"),
        }
    }

    fn clear_draft(&mut self) {
        match self.drafts.clear() {
            Ok(()) => self.events.push(Event::DraftCleared { at: Utc::now() }),
            Err(e) => tracing::warn!(error = %e, "draft clear failed"),
        }
    }

    fn require_active(&self) -> Result<(), ValidationError> {
        if self.state != ControllerState::Active {
            return Err(ValidationError::NoActiveSession);
        }
        Ok(())
    }

    fn require_page(&self, page: Page, operation: &str) -> Result<(), ValidationError> {
        if self.page() != page {
            return Err(ValidationError::WrongPage {
                operation: operation.into(),
                page: self.page().as_str().into(),
            });
        }
        Ok(())
    }
}

/// Whether `draft` still names a known variant and a page inside its flow.
fn restorable(draft: &Draft) -> Result<(), ValidationError> {
    find_variant(&draft.session.variant_id)?;
    PageFlow::at(draft.session.flow, draft.session.page_index)?;
    Ok(())
}

impl<S: PracticeSync> Drop for PracticeController<S> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SilentBackend;
    use crate::error::StorageError;
    use crate::storage::MemoryDraftStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct NoSync;

    impl PracticeSync for NoSync {
        async fn start_session(&self, _variant_id: &str) -> Result<String, ApiError> {
            Ok("r-1".into())
        }
        async fn update_progress(&self, _update: &ProgressUpdate) -> Result<(), ApiError> {
            Ok(())
        }
        async fn complete_session(&self, _payload: &CompletionPayload) -> Result<(), ApiError> {
            Ok(())
        }
    }

    struct BrokenDrafts;

    impl DraftStore for BrokenDrafts {
        fn save(&self, _draft: &Draft) -> Result<(), StorageError> {
            Err(StorageError::Locked)
        }
        fn load(&self) -> Result<Option<Draft>, StorageError> {
            Err(StorageError::Locked)
        }
        fn clear(&self) -> Result<(), StorageError> {
            Err(StorageError::Locked)
        }
    }

    fn deps(drafts: Box<dyn DraftStore>) -> SessionDeps<NoSync> {
        SessionDeps {
            sync: NoSync,
            drafts,
            audio: Box::new(SilentBackend::new(300_000)),
            autosave_interval_secs: 10,
        }
    }

    fn to_practice(ctl: &mut PracticeController<NoSync>) {
        ctl.next().unwrap();
        ctl.select_emotion(Emotion::Stressed).unwrap();
        ctl.next().unwrap();
        ctl.next().unwrap();
        assert_eq!(ctl.page(), Page::Practice);
    }

    #[test]
    fn blocked_without_emotion() {
        let store = MemoryDraftStore::new();
        let mut ctl = PracticeController::start(
            PracticeVariant::four_six(),
            FlowKind::Guided,
            deps(Box::new(store)),
        );
        ctl.next().unwrap();
        let step = ctl.next().unwrap();
        assert!(matches!(step, FlowStep::Blocked { page: Page::EmotionCheck, .. }));
        assert_eq!(ctl.session().page_index, 1);
    }

    #[test]
    fn entering_resumable_page_saves_draft() {
        let store = MemoryDraftStore::new();
        let mut ctl = PracticeController::start(
            PracticeVariant::four_six(),
            FlowKind::Guided,
            deps(Box::new(store.clone())),
        );
        assert!(store.load().unwrap().is_none());
        ctl.next().unwrap();
        let saved = store.load().unwrap().unwrap();
        assert_eq!(saved.session.page_index, 1);
    }

    #[test]
    fn practice_page_owns_audio() {
        let mut ctl = PracticeController::start(
            PracticeVariant::four_six(),
            FlowKind::Guided,
            deps(Box::new(MemoryDraftStore::new())),
        );
        to_practice(&mut ctl);
        assert_eq!(ctl.audio().loaded_asset(), Some("audio/breathing_4_6.mp3"));
        ctl.back().unwrap();
        assert!(!ctl.audio().is_loaded());
        assert!(ctl.active_animation().is_none());
    }

    #[test]
    fn autosave_every_interval() {
        let store = MemoryDraftStore::new();
        let mut ctl = PracticeController::start(
            PracticeVariant::four_six(),
            FlowKind::Guided,
            deps(Box::new(store.clone())),
        );
        to_practice(&mut ctl);
        ctl.drain_events();
        for _ in 0..25 {
            ctl.tick();
        }
        let saves = ctl
            .drain_events()
            .iter()
            .filter(|e| matches!(e, Event::DraftSaved { .. }))
            .count();
        assert_eq!(saves, 2);
        assert_eq!(store.load().unwrap().unwrap().session.elapsed_secs, 20);
    }

    #[test]
    fn storage_failure_does_not_abort() {
        let mut ctl = PracticeController::start(
            PracticeVariant::four_six(),
            FlowKind::Guided,
            deps(Box::new(BrokenDrafts)),
        );
        to_practice(&mut ctl);
        for _ in 0..12 {
            ctl.tick();
        }
        assert_eq!(ctl.session().elapsed_secs, 12);
        assert_eq!(ctl.state(), ControllerState::Active);
    }

    #[test]
    fn back_from_first_page_calls_exit_hook() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let mut ctl = PracticeController::start(
            PracticeVariant::four_six(),
            FlowKind::Guided,
            deps(Box::new(MemoryDraftStore::new())),
        )
        .with_exit_hook(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(ctl.back().unwrap(), FlowStep::Exited);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(ctl.state(), ControllerState::Exited);
        assert!(ctl.next().is_err());
    }

    #[test]
    fn teardown_saves_active_session() {
        let store = MemoryDraftStore::new();
        {
            let mut ctl = PracticeController::start(
                PracticeVariant::four_six(),
                FlowKind::Guided,
                deps(Box::new(store.clone())),
            );
            to_practice(&mut ctl);
            for _ in 0..7 {
                ctl.tick();
            }
        }
        let draft = store.load().unwrap().unwrap();
        assert_eq!(draft.session.elapsed_secs, 7);
        assert_eq!(draft.session.page_index, 3);
    }

    #[test]
    fn discard_clears_draft() {
        let store = MemoryDraftStore::new();
        let mut ctl = PracticeController::start(
            PracticeVariant::four_six(),
            FlowKind::Guided,
            deps(Box::new(store.clone())),
        );
        ctl.next().unwrap();
        assert!(store.load().unwrap().is_some());
        ctl.discard();
        drop(ctl);
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn declined_draft_is_discarded_on_launch() {
        let store = MemoryDraftStore::new();
        let mut old = PracticeSession::new("4-6-breathing", FlowKind::Guided);
        old.page_index = 3;
        old.elapsed_secs = 30;
        store.save(&Draft::of(&old)).unwrap();

        let ctl = PracticeController::launch(
            PracticeVariant::four_four_four(),
            FlowKind::Quick,
            deps(Box::new(store.clone())),
            |_| false,
        )
        .unwrap();
        assert_ne!(ctl.session().id, old.id);
        assert_eq!(ctl.page(), Page::Selection);
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn finishing_practice_advances_to_completion() {
        let mut v = PracticeVariant::four_six();
        v.session_secs = 20;
        let mut ctl = PracticeController::start(
            v,
            FlowKind::Quick,
            deps(Box::new(MemoryDraftStore::new())),
        );
        // Quick flow: selection -> preparation -> practice
        ctl.next().unwrap();
        ctl.next().unwrap();
        assert_eq!(ctl.page(), Page::Practice);

        let mut auto = None;
        for _ in 0..20 {
            if let Some(step) = ctl.tick() {
                auto = Some(step);
            }
        }
        assert_eq!(
            auto,
            Some(FlowStep::Moved {
                from: Page::Practice,
                to: Page::Completion
            })
        );
        assert!(!ctl.audio().is_loaded());
    }

    #[test]
    fn unrestorable_draft_is_dropped_on_launch() {
        let store = MemoryDraftStore::new();
        let mut old = PracticeSession::new("retired-variant", FlowKind::Guided);
        old.page_index = 3;
        store.save(&Draft::of(&old)).unwrap();

        for _ in 0..2 {
            let ctl = PracticeController::launch(
                PracticeVariant::four_six(),
                FlowKind::Guided,
                deps(Box::new(store.clone())),
                |_| true,
            )
            .unwrap();
            assert_ne!(ctl.session().id, old.id);
            assert_eq!(ctl.page(), Page::Selection);
            assert!(store.load().unwrap().is_none());
        }

        let mut past_end = PracticeSession::new("4-6-breathing", FlowKind::Quick);
        past_end.page_index = 42;
        store.save(&Draft::of(&past_end)).unwrap();
        let ctl = PracticeController::launch(
            PracticeVariant::four_six(),
            FlowKind::Quick,
            deps(Box::new(store.clone())),
            |_| panic!("unrestorable draft offered"),
        )
        .unwrap();
        assert_eq!(ctl.page(), Page::Selection);
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn back_after_finished_practice_is_blocked() {
        let mut v = PracticeVariant::four_six();
        v.session_secs = 10;
        let mut ctl = PracticeController::start(
            v,
            FlowKind::Quick,
            deps(Box::new(MemoryDraftStore::new())),
        );
        ctl.next().unwrap();
        ctl.next().unwrap();
        for _ in 0..10 {
            ctl.tick();
        }
        assert_eq!(ctl.page(), Page::Completion);
        assert_eq!(ctl.driver_state(), DriverState::Finished);

        let step = ctl.back().unwrap();
        assert!(matches!(step, FlowStep::Blocked { page: Page::Completion, .. }));
        assert_eq!(ctl.page(), Page::Completion);
        assert!(!ctl.audio().is_loaded());
        assert!(ctl.active_animation().is_none());
    }

    #[test]
    fn backing_out_of_flow_clears_draft() {
        let store = MemoryDraftStore::new();
        let mut ctl = PracticeController::start(
            PracticeVariant::four_six(),
            FlowKind::Guided,
            deps(Box::new(store.clone())),
        );
        ctl.next().unwrap();
        assert!(store.load().unwrap().is_some());
        ctl.back().unwrap();
        assert_eq!(ctl.back().unwrap(), FlowStep::Exited);
        drop(ctl);
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn choose_variant_only_on_selection() {
        let mut ctl = PracticeController::start(
            PracticeVariant::four_six(),
            FlowKind::Guided,
            deps(Box::new(MemoryDraftStore::new())),
        );
        ctl.choose_variant(PracticeVariant::four_seven_eight()).unwrap();
        assert_eq!(ctl.session().variant_id, "4-7-8-breathing");
        ctl.next().unwrap();
        assert!(ctl.choose_variant(PracticeVariant::four_six()).is_err());
    }
}
