use serde::Serialize;

/// Device names that identify a virtual loopback driver (system audio
/// routed back in as an input).
const KNOWN_LOOPBACK_NAMES: &[&str] = &["blackhole", "soundflower", "loopback"];

/// Device names installed by conferencing applications.
const KNOWN_APP_NAMES: &[&str] = &["teams", "zoom", "discord", "skype"];

/// Semantic category of an audio device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    /// Real hardware input (microphone)
    PhysicalInput,
    /// Virtual loopback device capturing system output
    VirtualLoopback,
    /// Virtual device installed by a conferencing app
    AppVirtual,
    /// OS-level composite of several devices
    Aggregate,
    Unknown,
}

impl DeviceClass {
    /// Suffix appended to recording filenames for this device class.
    pub fn filename_suffix(&self) -> &'static str {
        match self {
            DeviceClass::VirtualLoopback => "_system",
            DeviceClass::AppVirtual => "_app",
            _ => "",
        }
    }
}

/// Classify a device by name alone. Pure and total: any string maps to a
/// class, with physical input as the fallback. Channel counts are never
/// consulted.
pub fn classify(name: &str) -> DeviceClass {
    let lower = name.to_lowercase();

    if KNOWN_LOOPBACK_NAMES.iter().any(|n| lower.contains(n)) {
        return DeviceClass::VirtualLoopback;
    }

    if KNOWN_APP_NAMES.iter().any(|n| lower.contains(n)) {
        return DeviceClass::AppVirtual;
    }

    if lower.contains("aggregate") || lower.contains("multi-output") {
        return DeviceClass::Aggregate;
    }

    DeviceClass::PhysicalInput
}
