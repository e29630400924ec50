use anyhow::{bail, Context, Result};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use crate::audio::backend::{AudioBackend, ChunkCallback, InputStream, StreamSpec};
use crate::audio::level;
use crate::device::AudioDevice;

/// Overall session state. `Processing` and `Error` are only ever set by
/// the facade around transcription; the session itself moves between
/// `Idle` and `Recording`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Idle,
    Recording,
    Processing,
    Error,
}

type LevelCallback = Arc<dyn Fn(f32) + Send + Sync>;

/// A recording session: owns the selected device, the open stream, and
/// the in-memory capture buffer.
///
/// The chunk callback runs on the OS audio thread; the buffer lives
/// behind a mutex and appends are gated on the `capturing` flag so a
/// late callback after stop is dropped rather than racing the drain.
pub struct RecordingSession {
    backend: Arc<dyn AudioBackend>,
    output_dir: PathBuf,
    sample_rate: u32,
    state: SessionState,
    device: Option<AudioDevice>,
    current_filename: Option<String>,
    stream: Option<Box<dyn InputStream>>,
    captured: Arc<Mutex<Vec<Vec<i16>>>>,
    capturing: Arc<AtomicBool>,
    level_callback: Option<LevelCallback>,
}

impl RecordingSession {
    /// Create a session writing into `output_dir` (created if missing).
    pub fn new(
        backend: Arc<dyn AudioBackend>,
        output_dir: impl Into<PathBuf>,
        sample_rate: u32,
    ) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir).context("Failed to create output directory")?;

        Ok(Self {
            backend,
            output_dir,
            sample_rate,
            state: SessionState::Idle,
            device: None,
            current_filename: None,
            stream: None,
            captured: Arc::new(Mutex::new(Vec::new())),
            capturing: Arc::new(AtomicBool::new(false)),
            level_callback: None,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == SessionState::Recording
    }

    pub fn device(&self) -> Option<&AudioDevice> {
        self.device.as_ref()
    }

    pub fn current_filename(&self) -> Option<&str> {
        self.current_filename.as_deref()
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Select the capture device. Rejected mid-capture.
    pub fn set_device(&mut self, device: AudioDevice) -> Result<()> {
        if self.is_recording() {
            bail!("Cannot change device while recording");
        }
        info!("device selected: {} ({:?})", device.name, device.class);
        self.device = Some(device);
        Ok(())
    }

    /// Register a callback receiving per-chunk RMS levels in dB.
    pub fn set_level_callback(&mut self, callback: impl Fn(f32) + Send + Sync + 'static) {
        self.level_callback = Some(Arc::new(callback));
    }

    /// Start capturing. Returns the generated filename.
    pub fn start_recording(&mut self) -> Result<String> {
        if self.is_recording() {
            bail!("Already recording");
        }
        let device = self.device.clone().context("No device selected")?;

        // Filename timestamp is fixed at start, not at stop
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let filename = format!("meeting_{}{}.wav", timestamp, device.class.filename_suffix());

        self.captured
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        self.capturing.store(true, Ordering::SeqCst);

        let captured = Arc::clone(&self.captured);
        let capturing = Arc::clone(&self.capturing);
        let level_callback = self.level_callback.clone();

        let on_chunk: ChunkCallback = Box::new(move |chunk: &[f32]| {
            // Empty chunks carry no audio and must not defeat the
            // empty-buffer check at stop
            if !capturing.load(Ordering::SeqCst) || chunk.is_empty() {
                return;
            }
            let pcm: Vec<i16> = chunk.iter().map(|&s| pcm_sample(s)).collect();
            captured
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(pcm);
            if let Some(callback) = &level_callback {
                callback(level::rms_db(chunk));
            }
        });

        let spec = StreamSpec {
            sample_rate: self.sample_rate,
            channels: 1,
        };

        match self.backend.open_input(&device.name, spec, on_chunk) {
            Ok(stream) => {
                self.stream = Some(stream);
                self.current_filename = Some(filename.clone());
                self.state = SessionState::Recording;
                info!("recording started: {}", filename);
                Ok(filename)
            }
            Err(e) => {
                self.capturing.store(false, Ordering::SeqCst);
                Err(e).with_context(|| format!("Failed to open input stream on {}", device.name))
            }
        }
    }

    /// Stop capturing, flush the buffer to disk, and return the path.
    ///
    /// The stream is released and the session returns to idle before the
    /// buffer is examined, so a failed write never leaves the session
    /// stuck in the recording state.
    pub fn stop_recording(&mut self) -> Result<PathBuf> {
        if !self.is_recording() {
            bail!("Not recording");
        }

        self.capturing.store(false, Ordering::SeqCst);
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
        }
        self.state = SessionState::Idle;

        let chunks = std::mem::take(
            &mut *self.captured.lock().unwrap_or_else(|e| e.into_inner()),
        );
        let filename = self
            .current_filename
            .clone()
            .context("No output filename for this session")?;

        if chunks.is_empty() {
            warn!("stream produced no audio");
            bail!("No audio data recorded");
        }

        let total_samples: usize = chunks.iter().map(Vec::len).sum();
        let path = self.output_dir.join(&filename);

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec)
            .with_context(|| format!("Failed to create WAV file: {}", path.display()))?;
        for chunk in &chunks {
            for &sample in chunk {
                writer
                    .write_sample(sample)
                    .context("Failed to write audio data")?;
            }
        }
        writer.finalize().context("Failed to finalize WAV file")?;

        info!(
            "recording saved: {} ({:.1}s, {} chunks)",
            path.display(),
            total_samples as f64 / self.sample_rate as f64,
            chunks.len()
        );
        Ok(path)
    }
}

/// f32 in [-1.0, 1.0] to 16-bit PCM.
fn pcm_sample(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}
