use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Application settings, layered from built-in defaults plus an optional
/// TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub audio: AudioSettings,
    pub storage: StorageSettings,
    pub whisper: WhisperSettings,
    pub devices: DeviceSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioSettings {
    /// Capture sample rate in Hz
    pub sample_rate: u32,
    /// Capture channel count (1 = mono)
    pub channels: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Directory where recordings and transcripts are written
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WhisperSettings {
    /// Path to a ggml Whisper model file
    pub model_path: PathBuf,
    /// Language hint for transcription (e.g. "en")
    pub language: String,
    /// Inference thread count
    pub threads: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceSettings {
    /// Marker path whose presence means the loopback driver is installed
    pub loopback_driver_marker: PathBuf,
}

impl Config {
    /// Load settings, overlaying `path` (if given) on top of the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("meetrec");
        let home_dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("/"));

        let mut builder = config::Config::builder()
            .set_default("audio.sample_rate", 44100_i64)?
            .set_default("audio.channels", 1_i64)?
            .set_default("storage.output_dir", path_str(data_dir.join("recordings")))?
            .set_default(
                "whisper.model_path",
                path_str(data_dir.join("models").join("ggml-base.en.bin")),
            )?
            .set_default("whisper.language", "en")?
            .set_default("whisper.threads", 4_i64)?
            .set_default(
                "devices.loopback_driver_marker",
                path_str(home_dir.join("Library/Audio/Plug-Ins/HAL/BlackHole.driver")),
            )?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path.to_path_buf()));
        }

        let settings = builder.build().context("Failed to load configuration")?;
        settings
            .try_deserialize()
            .context("Invalid configuration values")
    }
}

fn path_str(path: PathBuf) -> String {
    path.to_string_lossy().into_owned()
}
