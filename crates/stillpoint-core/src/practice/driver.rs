//! Phase timer driver.
//!
//! Tick-driven like the rest of the engine: no internal thread, the host
//! calls `tick()` once per second while the practice page is running.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!            |
//!            v
//!         Finished
//! ```
//!
//! At most one animation is in flight. A new one always retires the
//! previous handle first.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::phase::{phase_at, PhaseInfo};
use super::variant::{PracticeVariant, VisualTarget};
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverState {
    Idle,
    Running,
    Paused,
    Finished,
}

/// An animation the host is currently running on our behalf.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    pub id: u64,
    pub target: VisualTarget,
    pub duration_secs: u64,
    /// Elapsed second at which the animation was started.
    pub started_at_secs: u64,
}

impl Animation {
    fn ends_at(&self) -> u64 {
        self.started_at_secs + self.duration_secs
    }
}

#[derive(Debug, Clone)]
pub struct PhaseDriver {
    variant: PracticeVariant,
    state: DriverState,
    elapsed_secs: u64,
    animation: Option<Animation>,
    next_animation_id: u64,
}

impl PhaseDriver {
    pub fn new(variant: PracticeVariant) -> Self {
        Self::resume_from(variant, 0)
    }

    /// Build a driver positioned at `elapsed_secs`, e.g. from a restored draft.
    pub fn resume_from(variant: PracticeVariant, elapsed_secs: u64) -> Self {
        Self {
            variant,
            state: DriverState::Idle,
            elapsed_secs,
            animation: None,
            next_animation_id: 1,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn variant(&self) -> &PracticeVariant {
        &self.variant
    }

    pub fn current_phase(&self) -> Option<PhaseInfo> {
        phase_at(self.elapsed_secs, &self.variant)
    }

    pub fn active_animation(&self) -> Option<&Animation> {
        self.animation.as_ref()
    }

    /// Seconds left until the variant's target length, 0 when unbounded.
    pub fn session_remaining_secs(&self) -> u64 {
        self.variant.session_secs.saturating_sub(self.elapsed_secs)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start (or restart from a restored offset). No-op unless idle.
    pub fn start(&mut self) -> Vec<Event> {
        if self.state != DriverState::Idle {
            return Vec::new();
        }
        self.state = DriverState::Running;
        self.begin_phase_animation()
    }

    /// Advance one second.
    pub fn tick(&mut self) -> Vec<Event> {
        if self.state != DriverState::Running {
            return Vec::new();
        }
        let before = self.current_phase();
        self.elapsed_secs += 1;

        if self.variant.session_secs > 0 && self.elapsed_secs >= self.variant.session_secs {
            let mut events = self.cancel_animation();
            self.state = DriverState::Finished;
            events.push(Event::PracticeFinished {
                elapsed_secs: self.elapsed_secs,
                at: Utc::now(),
            });
            return events;
        }

        let Some(now) = self.current_phase() else {
            return Vec::new();
        };
        if now.offset_in_phase != 0 {
            return Vec::new();
        }

        let mut events = Vec::new();
        if let Some(before) = before {
            tracing::debug!(
                from = before.kind.as_str(),
                to = now.kind.as_str(),
                elapsed = self.elapsed_secs,
                "phase changed"
            );
            events.push(Event::PhaseChanged {
                from: before.kind,
                to: now.kind,
                cycle_index: now.cycle_index,
                seconds_remaining: now.seconds_remaining,
                at: Utc::now(),
            });
        }
        events.extend(self.begin_phase_animation());
        events
    }

    pub fn pause(&mut self) -> Vec<Event> {
        if self.state != DriverState::Running {
            return Vec::new();
        }
        let mut events = self.cancel_animation();
        self.state = DriverState::Paused;
        events.push(Event::PracticePaused {
            elapsed_secs: self.elapsed_secs,
            at: Utc::now(),
        });
        events
    }

    /// Resume mid-phase. The animation gets only the remaining seconds of
    /// the current phase.
    pub fn resume(&mut self) -> Vec<Event> {
        if self.state != DriverState::Paused {
            return Vec::new();
        }
        self.state = DriverState::Running;
        let remaining = self
            .current_phase()
            .map(|p| p.seconds_remaining)
            .unwrap_or(0);
        let mut events = vec![Event::PracticeResumed {
            elapsed_secs: self.elapsed_secs,
            seconds_remaining: remaining,
            at: Utc::now(),
        }];
        events.extend(self.begin_phase_animation());
        events
    }

    /// Drop every outstanding animation and go back to idle (page exit,
    /// teardown). Elapsed time is kept.
    pub fn stop(&mut self) -> Vec<Event> {
        let events = self.cancel_animation();
        if self.state != DriverState::Finished {
            self.state = DriverState::Idle;
        }
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn cancel_animation(&mut self) -> Vec<Event> {
        match self.animation.take() {
            Some(anim) => vec![Event::AnimationCancelled {
                animation_id: anim.id,
                at: Utc::now(),
            }],
            None => Vec::new(),
        }
    }

    /// Retire the previous animation and start one for the current phase.
    fn begin_phase_animation(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        if let Some(prev) = self.animation {
            if prev.ends_at() > self.elapsed_secs {
                events.extend(self.cancel_animation());
            } else {
                self.animation = None;
            }
        }

        let Some(phase) = self.current_phase() else {
            return events;
        };
        let Some(target) = phase.visual else {
            return events;
        };

        let anim = Animation {
            id: self.next_animation_id,
            target,
            duration_secs: phase.seconds_remaining,
            started_at_secs: self.elapsed_secs,
        };
        self.next_animation_id += 1;
        self.animation = Some(anim);
        events.push(Event::AnimationStarted {
            animation_id: anim.id,
            target_scale: target.scale,
            duration_secs: anim.duration_secs,
            at: Utc::now(),
        });
        events
    }
}
