use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::audio::backend::{AudioBackend, CpalBackend};
use crate::config::Config;
use crate::device::{AudioDevice, DeviceCatalog};
use crate::recording::store::{read_transcript_body, transcript_path_for};
use crate::recording::{Recording, RecordingSession, RecordingStore, SessionState};
use crate::transcribe::Transcriber;

/// Facade composing the device catalog, recording session, recording
/// store, and transcriber behind one stateful object.
///
/// `state()` mirrors the session state and additionally reports
/// `Processing` while a transcription is in flight. That value is
/// informational only; it gates nothing.
pub struct App {
    state: SessionState,
    catalog: DeviceCatalog,
    session: RecordingSession,
    store: RecordingStore,
    transcriber: Transcriber,
}

impl App {
    /// Build the facade with the production cpal backend.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_backend(config, Arc::new(CpalBackend))
    }

    /// Build the facade with an injected backend (used by tests).
    pub fn with_backend(config: Config, backend: Arc<dyn AudioBackend>) -> Result<Self> {
        let catalog = DeviceCatalog::new(
            Arc::clone(&backend),
            config.devices.loopback_driver_marker.clone(),
        );
        let session = RecordingSession::new(
            backend,
            config.storage.output_dir.clone(),
            config.audio.sample_rate,
        )?;
        let store = RecordingStore::new(config.storage.output_dir.clone());
        let transcriber = Transcriber::new(config.whisper.clone());

        Ok(Self {
            state: SessionState::Idle,
            catalog,
            session,
            store,
            transcriber,
        })
    }

    pub fn state(&self) -> SessionState {
        if self.session.is_recording() {
            SessionState::Recording
        } else {
            self.state
        }
    }

    pub fn is_recording(&self) -> bool {
        self.state() == SessionState::Recording
    }

    pub fn devices(&mut self, force_refresh: bool) -> Result<Vec<AudioDevice>> {
        self.catalog.list(force_refresh)
    }

    pub fn input_devices(&mut self) -> Result<Vec<AudioDevice>> {
        self.catalog.input_devices()
    }

    /// Select a device by catalog id.
    pub fn set_device(&mut self, id: usize) -> Result<AudioDevice> {
        let device = self.catalog.get_by_id(id)?;
        self.session.set_device(device.clone())?;
        Ok(device)
    }

    /// Select the default input device.
    pub fn use_default_device(&mut self) -> Result<AudioDevice> {
        let device = self
            .catalog
            .default_input_device()?
            .context("No audio input devices found")?;
        self.session.set_device(device.clone())?;
        Ok(device)
    }

    pub fn selected_device(&self) -> Option<&AudioDevice> {
        self.session.device()
    }

    pub fn set_level_callback(&mut self, callback: impl Fn(f32) + Send + Sync + 'static) {
        self.session.set_level_callback(callback);
    }

    pub fn start_recording(&mut self) -> Result<String> {
        let filename = self.session.start_recording()?;
        // A new recording clears a stale error state
        self.state = SessionState::Idle;
        Ok(filename)
    }

    pub fn stop_recording(&mut self) -> Result<PathBuf> {
        self.session.stop_recording()
    }

    /// Transcribe an audio file; the facade reports `Processing` for the
    /// duration of the call.
    pub fn transcribe(&mut self, audio_path: &Path) -> Result<PathBuf> {
        self.state = SessionState::Processing;
        info!("transcribing: {}", audio_path.display());
        let result = self.transcriber.transcribe(audio_path);
        self.state = match &result {
            Ok(_) => SessionState::Idle,
            Err(_) => SessionState::Error,
        };
        result
    }

    pub fn recordings(&self) -> Result<Vec<Recording>> {
        self.store.list()
    }

    /// Transcript body for an audio file or transcript path, header
    /// stripped.
    pub fn transcript_body(&self, path: &Path) -> Result<String> {
        let transcript_path = if path.extension().is_some_and(|e| e == "wav") {
            transcript_path_for(path)
        } else {
            path.to_path_buf()
        };
        read_transcript_body(&transcript_path)
    }
}
