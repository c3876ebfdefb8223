//! Input device descriptions and the relevance policy.
//!
//! A device is *relevant* when Glide should take over its wheel: a mouse
//! with a scroll wheel that the user has not excluded. Touchpads already
//! scroll smoothly and are never relevant.

use std::collections::HashSet;
use std::path::PathBuf;

use glide_common::config::ReceiverSettings;
use serde::{Deserialize, Serialize};

/// Name prefix of every virtual device Glide creates. Devices carrying it
/// are ignored so synthetic output is never fed back into the receiver.
pub const VIRTUAL_DEVICE_PREFIX: &str = "glide";

/// How a device is connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BusKind {
    Usb,
    Bluetooth,
    I2c,
    Virtual,
    #[default]
    Other,
}

/// What a device reports it can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceCapabilities {
    /// Relative X/Y motion.
    pub relative_motion: bool,
    /// Vertical wheel.
    pub scroll_wheel: bool,
    /// Horizontal wheel or tilt.
    pub horizontal_wheel: bool,
    /// Reports 1/120 detent wheel units.
    pub high_resolution_wheel: bool,
    /// Left/right/middle buttons.
    pub mouse_buttons: bool,
    /// Absolute multi-touch surface (touchpads, touchscreens).
    pub touch_surface: bool,
    /// Number of keyboard keys reported.
    pub keys: usize,
}

/// Coarse device classification derived from capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    Mouse,
    Touchpad,
    Keyboard,
    Other,
}

impl DeviceCapabilities {
    /// Classify the device. A touch surface wins over everything else,
    /// since many touchpads also advertise buttons and relative motion.
    pub fn kind(&self) -> DeviceKind {
        if self.touch_surface {
            DeviceKind::Touchpad
        } else if self.relative_motion && self.mouse_buttons {
            DeviceKind::Mouse
        } else if self.keys >= 20 && !self.relative_motion {
            DeviceKind::Keyboard
        } else {
            DeviceKind::Other
        }
    }
}

/// A scanned input device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Unique key for this device within one scan (node path on Linux).
    pub id: String,
    /// Human-readable name reported by the device.
    pub name: String,
    /// Device node, when the platform has one.
    pub path: Option<PathBuf>,
    pub vendor_id: u16,
    pub product_id: u16,
    pub bus: BusKind,
    pub capabilities: DeviceCapabilities,
}

impl DeviceInfo {
    /// Device classification.
    pub fn kind(&self) -> DeviceKind {
        self.capabilities.kind()
    }

    /// `vendor:product` in lowercase hex, e.g. `046d:c52b`.
    pub fn hardware_id(&self) -> String {
        format!("{:04x}:{:04x}", self.vendor_id, self.product_id)
    }

    /// Whether this device was created by Glide itself.
    pub fn is_own_virtual_device(&self) -> bool {
        self.name
            .to_ascii_lowercase()
            .starts_with(VIRTUAL_DEVICE_PREFIX)
    }
}

/// Decides which devices Glide handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelevancePolicy {
    /// Mice without a wheel are not relevant.
    pub require_wheel: bool,
    /// Case-insensitive name fragments to exclude.
    pub ignore_names: Vec<String>,
    /// `vendor:product` ids to exclude.
    pub ignore_ids: Vec<String>,
}

impl Default for RelevancePolicy {
    fn default() -> Self {
        Self {
            require_wheel: true,
            ignore_names: Vec::new(),
            ignore_ids: Vec::new(),
        }
    }
}

impl RelevancePolicy {
    /// Build the policy from receiver settings.
    pub fn from_settings(settings: &ReceiverSettings) -> Self {
        Self {
            require_wheel: settings.require_wheel,
            ignore_names: settings
                .ignore_names
                .iter()
                .map(|n| n.to_lowercase())
                .collect(),
            ignore_ids: settings
                .ignore_ids
                .iter()
                .map(|id| id.to_lowercase())
                .collect(),
        }
    }

    /// Whether Glide should handle this device.
    pub fn is_relevant(&self, device: &DeviceInfo) -> bool {
        if device.kind() != DeviceKind::Mouse || device.is_own_virtual_device() {
            return false;
        }
        if self.require_wheel && !device.capabilities.scroll_wheel {
            return false;
        }

        let name = device.name.to_lowercase();
        if self
            .ignore_names
            .iter()
            .any(|fragment| !fragment.is_empty() && name.contains(&fragment.to_lowercase()))
        {
            tracing::trace!(device = %device.name, "Device ignored by name");
            return false;
        }

        let hardware_id = device.hardware_id();
        if self
            .ignore_ids
            .iter()
            .any(|id| id.eq_ignore_ascii_case(&hardware_id))
        {
            tracing::trace!(device = %device.name, id = %hardware_id, "Device ignored by id");
            return false;
        }
        true
    }
}

/// Filter a scan down to the relevant devices.
pub fn relevant_devices<'a>(
    devices: &'a [DeviceInfo],
    policy: &RelevancePolicy,
) -> Vec<&'a DeviceInfo> {
    devices.iter().filter(|d| policy.is_relevant(d)).collect()
}

/// Attach/detach notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "change", content = "device", rename_all = "snake_case")]
pub enum DeviceChange {
    Attached(DeviceInfo),
    Detached(DeviceInfo),
}

impl DeviceChange {
    /// The device this change is about.
    pub fn device(&self) -> &DeviceInfo {
        match self {
            Self::Attached(d) | Self::Detached(d) => d,
        }
    }
}

/// Compare two scans. Detachments are listed before attachments.
pub fn diff_devices(previous: &[DeviceInfo], current: &[DeviceInfo]) -> Vec<DeviceChange> {
    let previous_ids: HashSet<&str> = previous.iter().map(|d| d.id.as_str()).collect();
    let current_ids: HashSet<&str> = current.iter().map(|d| d.id.as_str()).collect();

    let detached = previous
        .iter()
        .filter(|d| !current_ids.contains(d.id.as_str()))
        .cloned()
        .map(DeviceChange::Detached);
    let attached = current
        .iter()
        .filter(|d| !previous_ids.contains(d.id.as_str()))
        .cloned()
        .map(DeviceChange::Attached);

    detached.chain(attached).collect()
}
