use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use super::class::{classify, DeviceClass};
use crate::audio::backend::AudioBackend;

/// An audio device as seen by the catalog: identity, capability, and
/// semantic classification. Immutable once constructed.
#[derive(Debug, Clone, Serialize)]
pub struct AudioDevice {
    /// Snapshot-stable id (enumeration index at refresh time)
    pub id: usize,
    pub name: String,
    pub channels_in: u16,
    pub channels_out: u16,
    pub sample_rate: u32,
    pub is_default: bool,
    pub class: DeviceClass,
    pub is_available: bool,
    /// True only for loopback devices whose driver bundle is missing
    pub needs_setup: bool,
}

impl AudioDevice {
    pub fn is_input(&self) -> bool {
        self.channels_in > 0
    }

    pub fn is_output(&self) -> bool {
        self.channels_out > 0
    }
}

/// Caching view over the OS device enumeration.
///
/// The backend is queried once on first use; later calls return the cached
/// snapshot unchanged until a refresh is forced, even if hardware state has
/// moved on. `needs_setup` is recomputed at every refresh so an installed
/// driver is picked up without restarting.
pub struct DeviceCatalog {
    backend: Arc<dyn AudioBackend>,
    driver_marker: PathBuf,
    cache: Option<Vec<AudioDevice>>,
}

impl DeviceCatalog {
    pub fn new(backend: Arc<dyn AudioBackend>, driver_marker: PathBuf) -> Self {
        Self {
            backend,
            driver_marker,
            cache: None,
        }
    }

    /// All devices in enumeration order.
    pub fn list(&mut self, force_refresh: bool) -> Result<Vec<AudioDevice>> {
        if force_refresh || self.cache.is_none() {
            self.cache = Some(self.query()?);
        }
        Ok(self.cache.as_ref().cloned().unwrap_or_default())
    }

    fn query(&self) -> Result<Vec<AudioDevice>> {
        let raw = self
            .backend
            .describe_devices()
            .context("Failed to enumerate audio devices")?;
        let driver_installed = self.driver_marker.exists();

        let devices: Vec<AudioDevice> = raw
            .into_iter()
            .enumerate()
            .map(|(id, desc)| {
                let class = classify(&desc.name);
                let needs_setup = class == DeviceClass::VirtualLoopback && !driver_installed;
                debug!(
                    "device {}: {} ({}in/{}out, {:?})",
                    id, desc.name, desc.channels_in, desc.channels_out, class
                );
                AudioDevice {
                    id,
                    name: desc.name,
                    channels_in: desc.channels_in,
                    channels_out: desc.channels_out,
                    sample_rate: desc.sample_rate,
                    is_default: desc.is_default,
                    class,
                    is_available: true,
                    needs_setup,
                }
            })
            .collect();

        info!(
            "device catalog refreshed: {} devices ({})",
            devices.len(),
            self.backend.name()
        );
        Ok(devices)
    }

    /// Look up a device in the cached snapshot.
    pub fn get_by_id(&mut self, id: usize) -> Result<AudioDevice> {
        self.list(false)?
            .into_iter()
            .find(|d| d.id == id)
            .with_context(|| format!("Device not found: {}", id))
    }

    /// Input-capable devices, enumeration order preserved.
    pub fn input_devices(&mut self) -> Result<Vec<AudioDevice>> {
        Ok(self
            .list(false)?
            .into_iter()
            .filter(AudioDevice::is_input)
            .collect())
    }

    /// The default input device, falling back to the first input device.
    pub fn default_input_device(&mut self) -> Result<Option<AudioDevice>> {
        let devices = self.list(false)?;
        if let Some(device) = devices.iter().find(|d| d.is_default && d.is_input()) {
            return Ok(Some(device.clone()));
        }
        Ok(devices.into_iter().find(AudioDevice::is_input))
    }
}
