pub mod engine;

pub use engine::{write_transcript, Transcriber};
