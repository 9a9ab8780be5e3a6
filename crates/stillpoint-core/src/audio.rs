//! Audio player adapter.
//!
//! A practice owns exactly one [`AudioSession`]. It loads the variant's asset
//! once on entering the practice page and unloads it on stop, page exit or
//! teardown. Playback itself is delegated to an [`AudioBackend`] supplied by
//! the host.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::AudioError;

/// How often the host should call [`AudioSession::poll`].
pub const POLL_INTERVAL_MS: u64 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackStatus {
    pub position_ms: u64,
    pub duration_ms: u64,
    pub is_playing: bool,
    pub did_finish: bool,
}

/// Platform playback. Implemented by the host (native player, web audio...).
pub trait AudioBackend: Send {
    /// Load an asset, returning its duration in milliseconds.
    fn load(&mut self, asset: &str) -> Result<u64, AudioError>;
    fn play(&mut self) -> Result<(), AudioError>;
    fn pause(&mut self) -> Result<(), AudioError>;
    fn seek(&mut self, position_ms: u64) -> Result<(), AudioError>;
    /// `volume` is 0.0 ..= 1.0.
    fn set_volume(&mut self, volume: f32) -> Result<(), AudioError>;
    fn set_muted(&mut self, muted: bool) -> Result<(), AudioError>;
    fn status(&self) -> PlaybackStatus;
    fn unload(&mut self);
}

/// Exclusive owner of the audio handle for one practice.
pub struct AudioSession {
    backend: Box<dyn AudioBackend>,
    loaded: Option<String>,
    volume: u8,
    muted: bool,
}

impl AudioSession {
    pub fn new(backend: Box<dyn AudioBackend>) -> Self {
        Self {
            backend,
            loaded: None,
            volume: 100,
            muted: false,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    pub fn loaded_asset(&self) -> Option<&str> {
        self.loaded.as_deref()
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Load `asset` unless it is already loaded. Loading a different asset
    /// unloads the current one first.
    pub fn load(&mut self, asset: &str) -> Result<(), AudioError> {
        if self.loaded.as_deref() == Some(asset) {
            return Ok(());
        }
        if self.loaded.is_some() {
            self.stop();
        }
        let duration_ms = self.backend.load(asset)?;
        let applied = self
            .backend
            .set_volume(f32::from(self.volume) / 100.0)
            .and_then(|()| self.backend.set_muted(self.muted));
        if let Err(e) = applied {
            self.backend.unload();
            return Err(e);
        }
        tracing::debug!(asset, duration_ms, "audio loaded");
        self.loaded = Some(asset.to_string());
        Ok(())
    }

    pub fn play(&mut self) -> Result<(), AudioError> {
        self.require_loaded()?;
        self.backend.play()
    }

    pub fn pause(&mut self) -> Result<(), AudioError> {
        self.require_loaded()?;
        self.backend.pause()
    }

    pub fn seek(&mut self, position_ms: u64) -> Result<(), AudioError> {
        self.require_loaded()?;
        self.backend.seek(position_ms)
    }

    /// Stop playback and release the handle. Safe to call when nothing is loaded.
    pub fn stop(&mut self) {
        if let Some(asset) = self.loaded.take() {
            if let Err(e) = self.backend.pause() {
                tracing::warn!(asset = %asset, error = %e, "pause before unload failed");
            }
            self.backend.unload();
            tracing::debug!(asset = %asset, "audio unloaded");
        }
    }

    /// Set volume in percent. Values above 100 are clamped.
    pub fn set_volume(&mut self, percent: u8) -> Result<(), AudioError> {
        self.volume = percent.min(100);
        if self.is_loaded() {
            self.backend.set_volume(f32::from(self.volume) / 100.0)?;
        }
        Ok(())
    }

    pub fn set_muted(&mut self, muted: bool) -> Result<(), AudioError> {
        self.muted = muted;
        if self.is_loaded() {
            self.backend.set_muted(muted)?;
        }
        Ok(())
    }

    pub fn toggle_mute(&mut self) -> Result<bool, AudioError> {
        self.set_muted(!self.muted)?;
        Ok(self.muted)
    }

    /// Current playback status, `None` while unloaded.
    pub fn poll(&self) -> Option<PlaybackStatus> {
        self.loaded.as_ref().map(|_| self.backend.status())
    }

    fn require_loaded(&self) -> Result<(), AudioError> {
        if self.loaded.is_none() {
            return Err(AudioError::NotLoaded);
        }
        Ok(())
    }
}

impl Drop for AudioSession {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Wall-clock backend with no sound output. Used by headless hosts.
#[derive(Debug)]
pub struct SilentBackend {
    duration_ms: u64,
    base_position_ms: u64,
    playing_since: Option<Instant>,
    loaded: bool,
}

impl SilentBackend {
    pub fn new(duration_ms: u64) -> Self {
        Self {
            duration_ms,
            base_position_ms: 0,
            playing_since: None,
            loaded: false,
        }
    }

    fn position_ms(&self) -> u64 {
        let running = self
            .playing_since
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or(0);
        (self.base_position_ms + running).min(self.duration_ms)
    }
}

impl AudioBackend for SilentBackend {
    fn load(&mut self, _asset: &str) -> Result<u64, AudioError> {
        self.loaded = true;
        self.base_position_ms = 0;
        self.playing_since = None;
        Ok(self.duration_ms)
    }

    fn play(&mut self) -> Result<(), AudioError> {
        if !self.loaded {
            return Err(AudioError::NotLoaded);
        }
        if self.playing_since.is_none() {
            self.playing_since = Some(Instant::now());
        }
        Ok(())
    }

    fn pause(&mut self) -> Result<(), AudioError> {
        self.base_position_ms = self.position_ms();
        self.playing_since = None;
        Ok(())
    }

    fn seek(&mut self, position_ms: u64) -> Result<(), AudioError> {
        self.base_position_ms = position_ms.min(self.duration_ms);
        if self.playing_since.is_some() {
            self.playing_since = Some(Instant::now());
        }
        Ok(())
    }

    fn set_volume(&mut self, _volume: f32) -> Result<(), AudioError> {
        Ok(())
    }

    fn set_muted(&mut self, _muted: bool) -> Result<(), AudioError> {
        Ok(())
    }

    fn status(&self) -> PlaybackStatus {
        let position_ms = self.position_ms();
        let did_finish = self.loaded && self.duration_ms > 0 && position_ms >= self.duration_ms;
        PlaybackStatus {
            position_ms,
            duration_ms: self.duration_ms,
            is_playing: self.playing_since.is_some() && !did_finish,
            did_finish,
        }
    }

    fn unload(&mut self) {
        self.loaded = false;
        self.base_position_ms = 0;
        self.playing_since = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Calls {
        loads: Vec<String>,
        unloads: usize,
        volumes: Vec<f32>,
        reject_volume: bool,
    }

    struct Recording(Arc<Mutex<Calls>>);

    impl AudioBackend for Recording {
        fn load(&mut self, asset: &str) -> Result<u64, AudioError> {
            self.0.lock().unwrap().loads.push(asset.into());
            Ok(60_000)
        }
        fn play(&mut self) -> Result<(), AudioError> {
            Ok(())
        }
        fn pause(&mut self) -> Result<(), AudioError> {
            Ok(())
        }
        fn seek(&mut self, _position_ms: u64) -> Result<(), AudioError> {
            Ok(())
        }
        fn set_volume(&mut self, volume: f32) -> Result<(), AudioError> {
            let mut calls = self.0.lock().unwrap();
            if calls.reject_volume {
                return Err(AudioError::Backend("mixer unavailable".into()));
            }
            calls.volumes.push(volume);
            Ok(())
        }
        fn set_muted(&mut self, _muted: bool) -> Result<(), AudioError> {
            Ok(())
        }
        fn status(&self) -> PlaybackStatus {
            PlaybackStatus::default()
        }
        fn unload(&mut self) {
            self.0.lock().unwrap().unloads += 1;
        }
    }

    #[test]
    fn loads_once_per_asset() {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let mut audio = AudioSession::new(Box::new(Recording(calls.clone())));
        audio.load("a.mp3").unwrap();
        audio.load("a.mp3").unwrap();
        assert_eq!(calls.lock().unwrap().loads.len(), 1);

        audio.load("b.mp3").unwrap();
        let c = calls.lock().unwrap();
        assert_eq!(c.loads, vec!["a.mp3".to_string(), "b.mp3".to_string()]);
        assert_eq!(c.unloads, 1);
    }

    #[test]
    fn commands_require_loaded_asset() {
        let mut audio = AudioSession::new(Box::new(SilentBackend::new(1_000)));
        assert_eq!(audio.play(), Err(AudioError::NotLoaded));
        assert!(audio.poll().is_none());
        audio.load("x.mp3").unwrap();
        assert!(audio.play().is_ok());
        assert!(audio.poll().is_some());
    }

    #[test]
    fn volume_is_clamped_and_applied() {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let mut audio = AudioSession::new(Box::new(Recording(calls.clone())));
        audio.set_volume(150).unwrap();
        assert_eq!(audio.volume(), 100);
        audio.load("a.mp3").unwrap();
        audio.set_volume(40).unwrap();
        assert_eq!(calls.lock().unwrap().volumes, vec![1.0, 0.4]);
    }

    #[test]
    fn failed_volume_setup_releases_asset() {
        let calls = Arc::new(Mutex::new(Calls {
            reject_volume: true,
            ..Calls::default()
        }));
        {
            let mut audio = AudioSession::new(Box::new(Recording(calls.clone())));
            assert!(matches!(audio.load("a.mp3"), Err(AudioError::Backend(_))));
            assert!(!audio.is_loaded());
            assert_eq!(calls.lock().unwrap().unloads, 1);
        }
        assert_eq!(calls.lock().unwrap().unloads, 1);
    }

    #[test]
    fn drop_unloads() {
        let calls = Arc::new(Mutex::new(Calls::default()));
        {
            let mut audio = AudioSession::new(Box::new(Recording(calls.clone())));
            audio.load("a.mp3").unwrap();
        }
        assert_eq!(calls.lock().unwrap().unloads, 1);
    }

    #[test]
    fn silent_backend_seek_and_pause() {
        let mut b = SilentBackend::new(10_000);
        b.load("x").unwrap();
        b.seek(4_000).unwrap();
        assert_eq!(b.status().position_ms, 4_000);
        assert!(!b.status().is_playing);
        b.seek(20_000).unwrap();
        assert!(b.status().did_finish);
    }
}
