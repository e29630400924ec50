use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Sample, SizedSample};
use tracing::{error, info};

/// Raw device descriptor as reported by the OS enumeration.
#[derive(Debug, Clone)]
pub struct RawDeviceDescriptor {
    pub name: String,
    pub channels_in: u16,
    pub channels_out: u16,
    pub sample_rate: u32,
    pub is_default: bool,
}

/// Requested capture format.
#[derive(Debug, Clone, Copy)]
pub struct StreamSpec {
    pub sample_rate: u32,
    pub channels: u16,
}

/// Per-buffer capture callback. Invoked on the OS audio thread with
/// samples normalized to f32 in [-1.0, 1.0].
pub type ChunkCallback = Box<dyn FnMut(&[f32]) + Send + 'static>;

/// Handle to an open capture stream.
pub trait InputStream {
    /// Stop and release the stream. Safe to call more than once; drop
    /// also releases.
    fn stop(&mut self);
}

/// Audio capture backend
///
/// The one seam between the core and the OS audio subsystem: device
/// enumeration in, stream handle out. Production uses [`CpalBackend`];
/// tests supply a scripted implementation.
pub trait AudioBackend: Send + Sync {
    /// One enumeration snapshot, in OS order.
    fn describe_devices(&self) -> Result<Vec<RawDeviceDescriptor>>;

    /// Open an input stream on the named device and start delivering
    /// chunks to `on_chunk`.
    fn open_input(
        &self,
        device_name: &str,
        spec: StreamSpec,
        on_chunk: ChunkCallback,
    ) -> Result<Box<dyn InputStream>>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// cpal-based backend used in production.
pub struct CpalBackend;

impl AudioBackend for CpalBackend {
    fn describe_devices(&self) -> Result<Vec<RawDeviceDescriptor>> {
        let host = cpal::default_host();
        let default_name = host.default_input_device().and_then(|d| d.name().ok());

        let mut descriptors = Vec::new();
        for device in host.devices().context("Failed to enumerate audio devices")? {
            let Ok(name) = device.name() else {
                continue;
            };
            let channels_in = max_channels(device.supported_input_configs().ok());
            let channels_out = max_channels(device.supported_output_configs().ok());
            let sample_rate = device
                .default_input_config()
                .map(|c| c.sample_rate().0)
                .or_else(|_| device.default_output_config().map(|c| c.sample_rate().0))
                .unwrap_or(0);
            let is_default = default_name.as_deref() == Some(name.as_str());

            descriptors.push(RawDeviceDescriptor {
                name,
                channels_in,
                channels_out,
                sample_rate,
                is_default,
            });
        }
        Ok(descriptors)
    }

    fn open_input(
        &self,
        device_name: &str,
        spec: StreamSpec,
        on_chunk: ChunkCallback,
    ) -> Result<Box<dyn InputStream>> {
        let host = cpal::default_host();
        let device = host
            .devices()
            .context("Failed to enumerate audio devices")?
            .find(|d| d.name().map(|n| n == device_name).unwrap_or(false))
            .with_context(|| format!("Audio device not found: {}", device_name))?;

        let default_config = device
            .default_input_config()
            .context("Device has no input configuration")?;

        let config = cpal::StreamConfig {
            channels: spec.channels,
            sample_rate: cpal::SampleRate(spec.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let stream = match default_config.sample_format() {
            cpal::SampleFormat::F32 => build_input::<f32>(&device, &config, on_chunk)?,
            cpal::SampleFormat::I16 => build_input::<i16>(&device, &config, on_chunk)?,
            cpal::SampleFormat::U16 => build_input::<u16>(&device, &config, on_chunk)?,
            cpal::SampleFormat::I32 => build_input::<i32>(&device, &config, on_chunk)?,
            other => anyhow::bail!("Unsupported sample format: {:?}", other),
        };

        stream.play().context("Failed to start input stream")?;
        info!(
            "input stream opened: {} ({}ch @ {}Hz)",
            device_name, spec.channels, spec.sample_rate
        );

        Ok(Box::new(CpalStream {
            stream: Some(stream),
        }))
    }

    fn name(&self) -> &str {
        "cpal"
    }
}

fn max_channels<I>(configs: Option<I>) -> u16
where
    I: Iterator<Item = cpal::SupportedStreamConfigRange>,
{
    configs
        .map(|it| it.map(|c| c.channels()).max().unwrap_or(0))
        .unwrap_or(0)
}

fn build_input<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut on_chunk: ChunkCallback,
) -> Result<cpal::Stream>
where
    T: SizedSample + Sample + Send + 'static,
    <T as Sample>::Float: Into<f32>,
{
    let mut scratch: Vec<f32> = Vec::new();

    let data_callback = move |data: &[T], _: &cpal::InputCallbackInfo| {
        scratch.clear();
        scratch.extend(data.iter().map(|s| {
            let f: f32 = s.to_float_sample().into();
            f.clamp(-1.0, 1.0)
        }));
        on_chunk(&scratch);
    };

    let error_callback = |err| error!("audio stream error: {}", err);

    device
        .build_input_stream(config, data_callback, error_callback, None)
        .context("Failed to build input stream")
}

struct CpalStream {
    stream: Option<cpal::Stream>,
}

impl InputStream for CpalStream {
    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            info!("input stream released");
        }
    }
}

impl Drop for CpalStream {
    fn drop(&mut self) {
        self.stop();
    }
}
