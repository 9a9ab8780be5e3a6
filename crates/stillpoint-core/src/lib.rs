//! # Stillpoint Core Library
//!
//! Session engine for Stillpoint guided breathing practices. The core holds
//! every rule of a practice; hosts (the CLI, a mobile shell) only render
//! events and forward user input.
//!
//! ## Architecture
//!
//! - **Phase driver**: a tick-driven state machine. The caller invokes
//!   `tick()` once per second; phase boundaries and animation requests come
//!   back as [`Event`]s
//! - **Session flow**: an ordered page sequence with guarded transitions
//! - **Storage**: SQLite for the draft slot and local practice log, TOML for
//!   configuration
//! - **API**: async HTTP client for the remote practice, mood and diary
//!   services
//!
//! ## Key Components
//!
//! - [`PracticeController`]: owns one session from launch to teardown
//! - [`PhaseDriver`]: breathing phase timer
//! - [`DraftStore`]: single-slot persistence of an unfinished session
//! - [`ApiClient`]: remote service client

pub mod api;
pub mod audio;
pub mod error;
pub mod events;
pub mod practice;
pub mod session;
pub mod storage;

pub use api::{ApiClient, KeyringTokenStore, MemoryTokenStore, OfflineSync, PracticeSync, TokenStore};
pub use audio::{AudioBackend, AudioSession, PlaybackStatus, SilentBackend};
pub use error::{
    ApiError, AudioError, ConfigError, CoreError, Result, StorageError, ValidationError,
};
pub use events::Event;
pub use practice::{builtin_variants, find_variant, phase_at, PhaseDriver, PhaseInfo, PhaseKind, PracticeVariant};
pub use session::{
    Emotion, FlowKind, FlowStep, Page, PracticeController, PracticeSession, SessionDeps,
};
pub use storage::{Config, Database, Draft, DraftStore, MemoryDraftStore, SqliteDraftStore};
