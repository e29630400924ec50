use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Where a recording came from, inferred from the filename suffix
/// convention (`_system` for loopback capture, `_app` for app-virtual).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingSource {
    Microphone,
    SystemAudio,
    AppAudio,
}

impl RecordingSource {
    pub fn label(&self) -> &'static str {
        match self {
            RecordingSource::Microphone => "Microphone",
            RecordingSource::SystemAudio => "System Audio",
            RecordingSource::AppAudio => "App Audio",
        }
    }

    fn from_filename(filename: &str) -> Self {
        if filename.contains("_system") {
            RecordingSource::SystemAudio
        } else if filename.contains("_app") {
            RecordingSource::AppAudio
        } else {
            RecordingSource::Microphone
        }
    }
}

/// Recording metadata, reconstructed from the filesystem on demand.
#[derive(Debug, Clone, Serialize)]
pub struct Recording {
    pub filename: String,
    pub path: PathBuf,
    /// Duration in seconds, computed from the WAV header (0.0 when the
    /// file cannot be read)
    pub duration_secs: f64,
    pub modified: DateTime<Local>,
    pub source: RecordingSource,
    pub has_transcript: bool,
    pub transcript_path: Option<PathBuf>,
}

/// View over the recordings directory. Holds no state beyond the path;
/// every listing re-reads the filesystem.
pub struct RecordingStore {
    dir: PathBuf,
}

impl RecordingStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// All recordings, newest first.
    pub fn list(&self) -> Result<Vec<Recording>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut filenames: Vec<String> = fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read directory: {}", self.dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.ends_with(".wav"))
            .collect();
        // Timestamped names sort chronologically; reverse for newest first
        filenames.sort();
        filenames.reverse();

        let mut recordings = Vec::with_capacity(filenames.len());
        for filename in filenames {
            let path = self.dir.join(&filename);

            let modified = fs::metadata(&path)
                .and_then(|m| m.modified())
                .map(DateTime::<Local>::from)
                .unwrap_or_else(|_| Local::now());

            let duration_secs = wav_duration_secs(&path).unwrap_or_else(|e| {
                warn!("failed to read duration of {}: {:#}", path.display(), e);
                0.0
            });

            let transcript_path = transcript_path_for(&path);
            let has_transcript = transcript_path.exists();

            recordings.push(Recording {
                source: RecordingSource::from_filename(&filename),
                filename,
                path,
                duration_secs,
                modified,
                has_transcript,
                transcript_path: has_transcript.then_some(transcript_path),
            });
        }

        Ok(recordings)
    }
}

/// Sibling transcript path for an audio file: extension swapped for
/// `_transcript.txt`.
pub fn transcript_path_for(audio_path: &Path) -> PathBuf {
    let stem = audio_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    audio_path.with_file_name(format!("{}_transcript.txt", stem))
}

/// Read a transcript file and return its body with the 3-line header
/// stripped. Non-UTF-8 bytes are replaced rather than failing the read.
pub fn read_transcript_body(path: &Path) -> Result<String> {
    let raw = fs::read(path)
        .with_context(|| format!("Transcript not found: {}", path.display()))?;
    let content = String::from_utf8_lossy(&raw);

    let separator = "-".repeat(50);
    let body = match content.split_once(separator.as_str()) {
        Some((_, rest)) => rest.trim_start_matches('\n'),
        None => content.as_ref(),
    };
    Ok(body.to_string())
}

fn wav_duration_secs(path: &Path) -> Result<f64> {
    let reader = hound::WavReader::open(path).context("Failed to open WAV file")?;
    let spec = reader.spec();
    Ok(reader.len() as f64 / (spec.sample_rate as f64 * spec.channels as f64))
}
