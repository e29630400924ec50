#![allow(dead_code)]

use anyhow::Result;
use meetrec::{AudioBackend, ChunkCallback, InputStream, RawDeviceDescriptor, StreamSpec};
use std::sync::{Arc, Mutex};

/// Scripted audio backend: hands out a fixed device list and lets tests
/// drive the capture callback by hand, standing in for the OS audio
/// thread.
pub struct MockBackend {
    descriptors: Mutex<Vec<RawDeviceDescriptor>>,
    callback: Arc<Mutex<Option<ChunkCallback>>>,
}

impl MockBackend {
    pub fn new(descriptors: Vec<RawDeviceDescriptor>) -> Arc<Self> {
        Arc::new(Self {
            descriptors: Mutex::new(descriptors),
            callback: Arc::new(Mutex::new(None)),
        })
    }

    pub fn set_descriptors(&self, descriptors: Vec<RawDeviceDescriptor>) {
        *self.descriptors.lock().unwrap() = descriptors;
    }

    /// Deliver a chunk as the audio callback would. Returns false when
    /// no stream is open.
    pub fn push_chunk(&self, chunk: &[f32]) -> bool {
        match self.callback.lock().unwrap().as_mut() {
            Some(callback) => {
                callback(chunk);
                true
            }
            None => false,
        }
    }

    pub fn stream_open(&self) -> bool {
        self.callback.lock().unwrap().is_some()
    }
}

impl AudioBackend for MockBackend {
    fn describe_devices(&self) -> Result<Vec<RawDeviceDescriptor>> {
        Ok(self.descriptors.lock().unwrap().clone())
    }

    fn open_input(
        &self,
        _device_name: &str,
        _spec: StreamSpec,
        on_chunk: ChunkCallback,
    ) -> Result<Box<dyn InputStream>> {
        *self.callback.lock().unwrap() = Some(on_chunk);
        Ok(Box::new(MockStream {
            callback: Arc::clone(&self.callback),
        }))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

struct MockStream {
    callback: Arc<Mutex<Option<ChunkCallback>>>,
}

impl InputStream for MockStream {
    fn stop(&mut self) {
        self.callback.lock().unwrap().take();
    }
}

pub fn mic_descriptor() -> RawDeviceDescriptor {
    RawDeviceDescriptor {
        name: "MacBook Microphone".to_string(),
        channels_in: 1,
        channels_out: 0,
        sample_rate: 44100,
        is_default: true,
    }
}

pub fn loopback_descriptor() -> RawDeviceDescriptor {
    RawDeviceDescriptor {
        name: "BlackHole 2ch".to_string(),
        channels_in: 2,
        channels_out: 2,
        sample_rate: 44100,
        is_default: false,
    }
}

pub fn zoom_descriptor() -> RawDeviceDescriptor {
    RawDeviceDescriptor {
        name: "ZoomAudioDevice".to_string(),
        channels_in: 2,
        channels_out: 2,
        sample_rate: 48000,
        is_default: false,
    }
}

pub fn speakers_descriptor() -> RawDeviceDescriptor {
    RawDeviceDescriptor {
        name: "External Headphones".to_string(),
        channels_in: 0,
        channels_out: 2,
        sample_rate: 44100,
        is_default: false,
    }
}

/// The session's f32 -> 16-bit PCM conversion, replicated for
/// expected-output checks.
pub fn pcm(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
        .collect()
}
