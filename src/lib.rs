pub mod app;
pub mod audio;
pub mod cli;
pub mod config;
pub mod device;
pub mod recording;
pub mod transcribe;

pub use app::App;
pub use audio::{
    AudioBackend, AudioFile, ChunkCallback, CpalBackend, InputStream, RawDeviceDescriptor,
    StreamSpec,
};
pub use cli::{Cli, Commands, OutputFormat};
pub use config::{AudioSettings, Config, DeviceSettings, StorageSettings, WhisperSettings};
pub use device::{classify, AudioDevice, DeviceCatalog, DeviceClass};
pub use recording::{Recording, RecordingSession, RecordingSource, RecordingStore, SessionState};
pub use transcribe::Transcriber;
