//! evdev backend: reads wheel events straight from `/dev/input/event*`.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use evdev::{Device, InputEvent, InputEventKind, Key, RelativeAxisType, Synchronization};
use glide_common::config::ReceiverSettings;
use glide_common::error::{GlideError, GlideResult};
use glide_platform_core::device::{DeviceInfo, DeviceKind};
use glide_platform_core::event::{InputInfo, Modifiers, ReceivedScroll, ScrollEvent};
use glide_platform_linux::devices::INPUT_DIR;
use glide_platform_linux::sink::HI_RES_UNITS_PER_DETENT;
use glide_platform_linux::{open_nonblocking, VirtualPointer};

use super::StubBackend;
use crate::InputBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    /// A relevant device whose wheel events are intercepted.
    Wheel,
    /// A keyboard read only for modifier state. Never grabbed.
    Modifiers,
}

struct OpenDevice {
    device: Device,
    info: DeviceInfo,
    role: Role,
    grabbed: bool,
    /// Wheel movement of the current `SYN_REPORT` frame.
    scroll: ScrollEvent,
    /// Non-wheel events of the current frame, re-emitted when grabbed.
    batch: Vec<InputEvent>,
}

/// Pressed modifier keys, by key code.
#[derive(Debug, Default)]
struct ModifierState {
    pressed: BTreeSet<u16>,
}

impl ModifierState {
    fn is_modifier(key: Key) -> bool {
        matches!(
            key,
            Key::KEY_LEFTSHIFT
                | Key::KEY_RIGHTSHIFT
                | Key::KEY_LEFTCTRL
                | Key::KEY_RIGHTCTRL
                | Key::KEY_LEFTALT
                | Key::KEY_RIGHTALT
                | Key::KEY_LEFTMETA
                | Key::KEY_RIGHTMETA
        )
    }

    fn update(&mut self, key: Key, value: i32) {
        if !Self::is_modifier(key) {
            return;
        }
        // 0 = release, 1 = press, 2 = autorepeat
        if value == 0 {
            self.pressed.remove(&key.code());
        } else {
            self.pressed.insert(key.code());
        }
    }

    fn any(&self, keys: [Key; 2]) -> bool {
        keys.iter().any(|k| self.pressed.contains(&k.code()))
    }

    fn snapshot(&self) -> Modifiers {
        Modifiers {
            shift: self.any([Key::KEY_LEFTSHIFT, Key::KEY_RIGHTSHIFT]),
            control: self.any([Key::KEY_LEFTCTRL, Key::KEY_RIGHTCTRL]),
            alt: self.any([Key::KEY_LEFTALT, Key::KEY_RIGHTALT]),
            meta: self.any([Key::KEY_LEFTMETA, Key::KEY_RIGHTMETA]),
        }
    }
}

/// Reads relevant mice through evdev, optionally grabbing them so that
/// their raw wheel events never reach applications.
pub struct EvdevBackend {
    grab: bool,
    pointer: Option<VirtualPointer>,
    devices: BTreeMap<String, OpenDevice>,
    last_scan: Vec<DeviceInfo>,
    modifiers: ModifierState,
    pending: VecDeque<ReceivedScroll>,
    /// Devices that failed to open, so the failure is only logged once.
    failed: HashSet<String>,
}

impl EvdevBackend {
    /// Create the backend. Grabbing needs the virtual pointer to re-emit
    /// everything that is not scrolling; without one it is disabled.
    pub fn new(grab: bool, pointer: Option<VirtualPointer>) -> Self {
        let grab = if grab && pointer.is_none() {
            tracing::warn!("No virtual pointer available, devices will not be grabbed");
            false
        } else {
            grab
        };
        if !grab {
            tracing::warn!(
                "Devices are not grabbed: applications see raw and smoothed scrolling"
            );
        }

        Self {
            grab,
            pointer,
            devices: BTreeMap::new(),
            last_scan: Vec::new(),
            modifiers: ModifierState::default(),
            pending: VecDeque::new(),
            failed: HashSet::new(),
        }
    }

    pub fn is_supported() -> bool {
        std::fs::read_dir(INPUT_DIR).is_ok()
    }

    /// Whether relevant devices are grabbed.
    pub fn grabs(&self) -> bool {
        self.grab
    }

    fn open(&mut self, info: &DeviceInfo, role: Role) -> Option<OpenDevice> {
        let Some(path) = info.path.as_deref() else {
            tracing::debug!(device = %info.name, "Device has no node, skipping");
            return None;
        };

        let mut device = match open_nonblocking(path) {
            Ok(device) => device,
            Err(e) => {
                if self.failed.insert(info.id.clone()) {
                    tracing::warn!(device = %info.name, error = %e, "Failed to open device");
                }
                return None;
            }
        };
        self.failed.remove(&info.id);

        let grabbed = role == Role::Wheel && self.grab && grab_device(&mut device, info);
        tracing::debug!(device = %info.name, id = %info.id, ?role, grabbed, "Listening to device");

        Some(OpenDevice {
            device,
            info: info.clone(),
            role,
            grabbed,
            scroll: ScrollEvent::default(),
            batch: Vec::new(),
        })
    }

    fn close(&mut self, id: &str) {
        if let Some(mut open) = self.devices.remove(id) {
            if open.grabbed {
                // The node may already be gone.
                let _ = open.device.ungrab();
            }
            tracing::debug!(device = %open.info.name, id, "Stopped listening to device");
        }
    }

    /// Read everything available from every open device.
    fn ingest(&mut self) {
        let Self {
            devices,
            modifiers,
            pending,
            pointer,
            ..
        } = self;

        let mut lost = Vec::new();
        for (id, open) in devices.iter_mut() {
            let events: Vec<InputEvent> = match open.device.fetch_events() {
                Ok(events) => events.collect(),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => continue,
                Err(e) if e.raw_os_error() == Some(libc::ENODEV) => {
                    lost.push(id.clone());
                    continue;
                }
                Err(e) => {
                    tracing::warn!(device = %open.info.name, error = %e, "Failed reading device");
                    continue;
                }
            };

            for event in events {
                process_event(open, event, modifiers, pending, pointer.as_ref());
            }
            // Frames are normally closed by SYN_REPORT; flush any remainder.
            flush_frame(open, modifiers, pending, pointer.as_ref(), None);
        }

        for id in lost {
            if let Some(open) = devices.remove(&id) {
                tracing::info!(device = %open.info.name, id = %id, "Device disappeared");
            }
        }
    }
}

fn grab_device(device: &mut Device, info: &DeviceInfo) -> bool {
    match device.grab() {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(
                device = %info.name,
                error = %e,
                "Failed to grab device, listening without grab"
            );
            false
        }
    }
}

fn process_event(
    open: &mut OpenDevice,
    event: InputEvent,
    modifiers: &mut ModifierState,
    pending: &mut VecDeque<ReceivedScroll>,
    pointer: Option<&VirtualPointer>,
) {
    match event.kind() {
        InputEventKind::Synchronization(Synchronization::SYN_REPORT) => {
            flush_frame(open, modifiers, pending, pointer, Some(event));
        }
        InputEventKind::Synchronization(_) => {}
        InputEventKind::Key(key) => {
            modifiers.update(key, event.value());
            if open.role == Role::Wheel {
                open.batch.push(event);
            }
        }
        InputEventKind::RelAxis(RelativeAxisType::REL_WHEEL) if open.role == Role::Wheel => {
            open.scroll.delta_y = open.scroll.delta_y.saturating_add(event.value());
        }
        InputEventKind::RelAxis(RelativeAxisType::REL_HWHEEL) if open.role == Role::Wheel => {
            open.scroll.delta_x = open.scroll.delta_x.saturating_add(event.value());
        }
        // Regenerated on output from the legacy detents.
        InputEventKind::RelAxis(RelativeAxisType::REL_WHEEL_HI_RES)
        | InputEventKind::RelAxis(RelativeAxisType::REL_HWHEEL_HI_RES) => {}
        _ => {
            if open.role == Role::Wheel {
                open.batch.push(event);
            }
        }
    }
}

/// Legacy and hi-res wheel values that reproduce `event` unchanged.
fn wheel_values(event: ScrollEvent) -> [(RelativeAxisType, i32); 4] {
    [
        (RelativeAxisType::REL_WHEEL, event.delta_y),
        (
            RelativeAxisType::REL_WHEEL_HI_RES,
            event.delta_y.saturating_mul(HI_RES_UNITS_PER_DETENT),
        ),
        (RelativeAxisType::REL_HWHEEL, event.delta_x),
        (
            RelativeAxisType::REL_HWHEEL_HI_RES,
            event.delta_x.saturating_mul(HI_RES_UNITS_PER_DETENT),
        ),
    ]
}

/// Close the current frame: queue its wheel movement and re-emit the rest
/// of it when the device is grabbed.
fn flush_frame(
    open: &mut OpenDevice,
    modifiers: &ModifierState,
    pending: &mut VecDeque<ReceivedScroll>,
    pointer: Option<&VirtualPointer>,
    report: Option<InputEvent>,
) {
    let batch = std::mem::take(&mut open.batch);
    if open.grabbed && !batch.is_empty() {
        if let Some(pointer) = pointer {
            if let Err(e) = pointer.emit(&batch) {
                tracing::warn!(device = %open.info.name, error = %e, "Failed to re-emit events");
            }
        }
    }

    let scroll = std::mem::take(&mut open.scroll);
    if !scroll.is_empty() {
        let timestamp_ns = report
            .and_then(|e| e.timestamp().duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_nanos() as u64);
        pending.push_back(ReceivedScroll {
            event: scroll,
            info: InputInfo {
                device_id: Some(open.info.id.clone()),
                modifiers: modifiers.snapshot(),
                timestamp_ns,
            },
        });
    }
}

impl InputBackend for EvdevBackend {
    fn scan_devices(&mut self) -> GlideResult<Vec<DeviceInfo>> {
        if !Self::is_supported() {
            return Err(GlideError::device(format!("{INPUT_DIR} is not readable")));
        }
        self.last_scan = glide_platform_linux::scan_devices();
        Ok(self.last_scan.clone())
    }

    fn listen(&mut self, devices: &[DeviceInfo]) -> GlideResult<()> {
        let mut wanted: BTreeMap<String, (DeviceInfo, Role)> = devices
            .iter()
            .map(|d| (d.id.clone(), (d.clone(), Role::Wheel)))
            .collect();
        for keyboard in self
            .last_scan
            .iter()
            .filter(|d| d.kind() == DeviceKind::Keyboard && !d.is_own_virtual_device())
        {
            wanted
                .entry(keyboard.id.clone())
                .or_insert_with(|| (keyboard.clone(), Role::Modifiers));
        }

        let stale: Vec<String> = self
            .devices
            .iter()
            .filter(|(id, open)| wanted.get(*id).map(|(_, role)| *role) != Some(open.role))
            .map(|(id, _)| id.clone())
            .collect();
        for id in stale {
            self.close(&id);
        }

        for (id, (info, role)) in wanted {
            if self.devices.contains_key(&id) {
                continue;
            }
            if let Some(open) = self.open(&info, role) {
                self.devices.insert(id, open);
            }
        }
        Ok(())
    }

    fn poll(&mut self) -> GlideResult<Option<ReceivedScroll>> {
        if let Some(scroll) = self.pending.pop_front() {
            return Ok(Some(scroll));
        }

        self.ingest();
        Ok(self.pending.pop_front())
    }

    fn pass_through(&mut self, scroll: &ReceivedScroll) -> GlideResult<()> {
        let grabbed = scroll
            .info
            .device_id
            .as_ref()
            .and_then(|id| self.devices.get(id))
            .is_some_and(|open| open.grabbed);
        // An ungrabbed device already delivered the event itself.
        if !grabbed {
            return Ok(());
        }
        let Some(pointer) = &self.pointer else {
            return Ok(());
        };

        pointer.emit_relative(&wheel_values(scroll.event))
    }

    fn release(&mut self) {
        let ids: Vec<String> = self.devices.keys().cloned().collect();
        for id in ids {
            self.close(&id);
        }
        self.pending.clear();
    }

    fn name(&self) -> &str {
        "evdev"
    }

    fn is_available(&self) -> bool {
        Self::is_supported()
    }
}

impl Drop for EvdevBackend {
    fn drop(&mut self) {
        self.release();
    }
}

/// Detect the best available input backend for the current system.
pub fn detect_best_backend(
    settings: &ReceiverSettings,
    pointer: Option<VirtualPointer>,
) -> Box<dyn InputBackend> {
    if EvdevBackend::is_supported() {
        if glide_platform_linux::devices::enumerate_devices().is_empty() {
            tracing::warn!(
                details = %event_device_diagnostic(),
                "No readable input devices, scrolling stays disabled until access is granted"
            );
        }
        tracing::info!(grab = settings.grab_devices, "Using evdev backend");
        return Box::new(EvdevBackend::new(settings.grab_devices, pointer));
    }

    tracing::warn!(
        details = %event_device_diagnostic(),
        "Using stub input backend, no wheel events will be received"
    );
    Box::new(StubBackend::empty())
}

fn first_event_node() -> Option<PathBuf> {
    let mut nodes: Vec<PathBuf> = std::fs::read_dir(INPUT_DIR)
        .ok()?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("event"))
        })
        .collect();
    nodes.sort();
    nodes.into_iter().next()
}

fn event_device_diagnostic() -> String {
    let node = first_event_node().unwrap_or_else(|| Path::new(INPUT_DIR).join("event0"));
    let path = node.display();
    // SAFETY: geteuid/getegid have no preconditions and cannot fail.
    let uid = unsafe { libc::geteuid() };
    let gid = unsafe { libc::getegid() };

    match std::fs::metadata(&node) {
        Ok(meta) => {
            let mode = meta.mode() & 0o777;
            let owner = meta.uid();
            let group = meta.gid();
            format!(
                "device={path} mode={mode:o} owner_uid={owner} owner_gid={group} \
                 process_uid={uid} process_gid={gid}; likely missing 'input' group membership. \
                 Fix: sudo usermod -aG input $USER && log out/in"
            )
        }
        Err(err) => format!(
            "device={path} unavailable ({err}); ensure kernel input devices exist \
             and permissions allow read access"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifier_state_tracks_press_and_release() {
        let mut state = ModifierState::default();
        state.update(Key::KEY_LEFTSHIFT, 1);
        state.update(Key::KEY_A, 1);
        assert!(state.snapshot().shift);
        assert!(!state.snapshot().control);

        state.update(Key::KEY_LEFTSHIFT, 2);
        state.update(Key::KEY_RIGHTCTRL, 1);
        let held = state.snapshot();
        assert!(held.shift && held.control);

        state.update(Key::KEY_LEFTSHIFT, 0);
        assert!(!state.snapshot().shift);
        assert_eq!(state.pressed.len(), 1);
    }

    #[test]
    fn passed_through_wheel_values_saturate() {
        let values = wheel_values(ScrollEvent {
            delta_y: i32::MIN,
            delta_x: 2,
            continuous: false,
        });
        assert_eq!(values[0], (RelativeAxisType::REL_WHEEL, i32::MIN));
        assert_eq!(values[1], (RelativeAxisType::REL_WHEEL_HI_RES, i32::MIN));
        assert_eq!(values[3], (RelativeAxisType::REL_HWHEEL_HI_RES, 240));
    }

    #[test]
    fn ungrabbed_backend_without_pointer() {
        let backend = EvdevBackend::new(true, None);
        assert!(!backend.grabs());
        assert_eq!(backend.name(), "evdev");
    }
}
