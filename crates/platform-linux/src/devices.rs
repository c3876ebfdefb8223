//! evdev device enumeration and classification.

use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use evdev::{AbsoluteAxisType, BusType, Device, Key, RelativeAxisType};
use glide_common::error::{GlideError, GlideResult};
use glide_platform_core::device::{BusKind, DeviceCapabilities, DeviceInfo};

/// Directory holding the event device nodes.
pub const INPUT_DIR: &str = "/dev/input";

/// Describe an opened evdev device.
pub fn describe_device(path: &Path, device: &Device) -> DeviceInfo {
    let input_id = device.input_id();
    DeviceInfo {
        id: path.display().to_string(),
        name: device.name().unwrap_or("unnamed device").to_string(),
        path: Some(path.to_path_buf()),
        vendor_id: input_id.vendor(),
        product_id: input_id.product(),
        bus: bus_kind(input_id.bus_type()),
        capabilities: capabilities(device),
    }
}

/// Enumerate every readable event device.
///
/// Nodes that cannot be opened (usually for lack of permission) are
/// skipped; an empty result on a machine with a mouse is a permission
/// problem, see [`crate::permissions`].
pub fn enumerate_devices() -> Vec<(PathBuf, Device)> {
    let mut devices: Vec<(PathBuf, Device)> = evdev::enumerate().collect();
    devices.sort_by(|a, b| a.0.cmp(&b.0));
    devices
}

/// Scan and describe every readable event device.
pub fn scan_devices() -> Vec<DeviceInfo> {
    enumerate_devices()
        .iter()
        .map(|(path, device)| describe_device(path, device))
        .collect()
}

/// Open a device node for non-blocking reads.
pub fn open_nonblocking(path: &Path) -> GlideResult<Device> {
    let device = Device::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::PermissionDenied {
            GlideError::permission_denied(format!("{}: {e}", path.display()))
        } else {
            GlideError::device(format!("Failed to open {}: {e}", path.display()))
        }
    })?;
    set_nonblocking(&device)?;
    Ok(device)
}

fn set_nonblocking(device: &Device) -> GlideResult<()> {
    let fd = device.as_raw_fd();
    // SAFETY: `fd` is a valid descriptor owned by `device` for this call.
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 {
        return Err(std::io::Error::last_os_error().into());
    }
    // SAFETY: as above; only the O_NONBLOCK status flag is added.
    let result = unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) };
    if result < 0 {
        return Err(std::io::Error::last_os_error().into());
    }
    Ok(())
}

fn capabilities(device: &Device) -> DeviceCapabilities {
    let rel = device.supported_relative_axes();
    let has_rel = |axis: RelativeAxisType| rel.is_some_and(|set| set.contains(axis));

    let keys = device.supported_keys();
    let has_key = |key: Key| keys.is_some_and(|set| set.contains(key));

    let touch_surface = device
        .supported_absolute_axes()
        .is_some_and(|set| set.contains(AbsoluteAxisType::ABS_MT_POSITION_X))
        || has_key(Key::BTN_TOOL_FINGER);

    let keyboard_keys = keys
        .map(|set| set.iter().filter(|k| k.code() < Key::BTN_0.code()).count())
        .unwrap_or(0);

    DeviceCapabilities {
        relative_motion: has_rel(RelativeAxisType::REL_X) && has_rel(RelativeAxisType::REL_Y),
        scroll_wheel: has_rel(RelativeAxisType::REL_WHEEL),
        horizontal_wheel: has_rel(RelativeAxisType::REL_HWHEEL),
        high_resolution_wheel: has_rel(RelativeAxisType::REL_WHEEL_HI_RES),
        mouse_buttons: has_key(Key::BTN_LEFT),
        touch_surface,
        keys: keyboard_keys,
    }
}

fn bus_kind(bus: BusType) -> BusKind {
    if bus == BusType::BUS_USB {
        BusKind::Usb
    } else if bus == BusType::BUS_BLUETOOTH {
        BusKind::Bluetooth
    } else if bus == BusType::BUS_I2C {
        BusKind::I2c
    } else if bus == BusType::BUS_VIRTUAL {
        BusKind::Virtual
    } else {
        BusKind::Other
    }
}
