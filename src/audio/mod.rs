pub mod backend;
pub mod file;
pub mod level;

pub use backend::{
    AudioBackend, ChunkCallback, CpalBackend, InputStream, RawDeviceDescriptor, StreamSpec,
};
pub use file::{AudioFile, WHISPER_SAMPLE_RATE};
