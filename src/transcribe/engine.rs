use anyhow::{anyhow, bail, Context, Result};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::audio::file::AudioFile;
use crate::config::WhisperSettings;
use crate::recording::store::transcript_path_for;

const HEADER_SEPARATOR_WIDTH: usize = 50;

/// Whisper transcription adapter.
///
/// The model is loaded at most once, behind a lock: the first caller
/// pays the load cost, concurrent callers block until it is available.
/// Every failure (missing model, inference error, file I/O) comes back
/// as an error result; nothing here panics.
pub struct Transcriber {
    settings: WhisperSettings,
    model: Mutex<Option<Arc<WhisperContext>>>,
}

impl Transcriber {
    pub fn new(settings: WhisperSettings) -> Self {
        Self {
            settings,
            model: Mutex::new(None),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.model
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    /// Load the model if it is not loaded yet.
    pub fn ensure_loaded(&self) -> Result<Arc<WhisperContext>> {
        let mut guard = self.model.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(ctx) = guard.as_ref() {
            return Ok(Arc::clone(ctx));
        }

        let model_path = &self.settings.model_path;
        if !model_path.exists() {
            bail!("Whisper model not found: {}", model_path.display());
        }

        info!("loading whisper model: {}", model_path.display());
        let ctx = WhisperContext::new_with_params(
            model_path
                .to_str()
                .context("Model path is not valid UTF-8")?,
            WhisperContextParameters::default(),
        )
        .map_err(|e| anyhow!("Failed to load whisper model: {}", e))?;
        info!("whisper model loaded");

        let ctx = Arc::new(ctx);
        *guard = Some(Arc::clone(&ctx));
        Ok(ctx)
    }

    /// Transcribe a recording and write the transcript beside it.
    /// Returns the transcript path.
    pub fn transcribe(&self, audio_path: &Path) -> Result<PathBuf> {
        let ctx = self.ensure_loaded()?;

        let audio = AudioFile::open(audio_path)?;
        let samples = audio.to_whisper_samples();
        if samples.is_empty() {
            bail!("Audio file contains no samples");
        }
        debug!(
            "transcribing {:.1}s of audio ({} samples)",
            audio.duration_seconds,
            samples.len()
        );

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_n_threads(self.settings.threads as i32);
        params.set_language(Some(&self.settings.language));
        params.set_translate(false);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        let mut state = ctx
            .create_state()
            .map_err(|e| anyhow!("Failed to create whisper state: {}", e))?;
        state
            .full(params, &samples)
            .map_err(|e| anyhow!("Whisper inference failed: {}", e))?;

        let num_segments = state
            .full_n_segments()
            .map_err(|e| anyhow!("Whisper inference failed: {}", e))?;

        let mut text = String::new();
        for i in 0..num_segments {
            // The model can split a multibyte sequence across segment
            // boundaries; decode with replacement rather than failing
            let segment = state
                .full_get_segment_text_lossy(i)
                .map_err(|e| anyhow!("Failed to read segment {}: {}", i, e))?;
            text.push_str(&segment);
        }

        let transcript_path = transcript_path_for(audio_path);
        write_transcript(&transcript_path, audio_path, text.trim())?;
        info!("transcript saved: {}", transcript_path.display());

        Ok(transcript_path)
    }
}

/// Write a transcript file: a 3-line header (source filename, generation
/// timestamp, separator), a blank line, then the text.
pub fn write_transcript(path: &Path, audio_path: &Path, text: &str) -> Result<()> {
    let source = audio_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut content = String::new();
    content.push_str(&format!("Transcript for: {}\n", source));
    content.push_str(&format!(
        "Generated: {}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    content.push_str(&"-".repeat(HEADER_SEPARATOR_WIDTH));
    content.push_str("\n\n");
    content.push_str(text);

    fs::write(path, content)
        .with_context(|| format!("Failed to write transcript: {}", path.display()))
}
