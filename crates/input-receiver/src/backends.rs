//! Input receiving backend implementations.
//!
//! Each backend provides a different way to discover devices and read
//! their wheel events.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use glide_common::error::{GlideError, GlideResult};
use glide_platform_core::device::DeviceInfo;
use glide_platform_core::event::{InputInfo, ReceivedScroll, ScrollEvent};

use crate::InputBackend;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(not(target_os = "linux"))]
mod non_linux;

#[cfg(target_os = "linux")]
pub use linux::{detect_best_backend, EvdevBackend};
#[cfg(not(target_os = "linux"))]
pub use non_linux::detect_best_backend;

#[derive(Debug, Default)]
struct StubState {
    devices: Vec<DeviceInfo>,
    listening: Vec<String>,
    events: VecDeque<ReceivedScroll>,
    passed_through: Vec<ReceivedScroll>,
    scan_failures: usize,
    released: bool,
}

/// Stub backend for testing: scripted devices and events.
///
/// Events are only delivered while their source device is being listened
/// to, like a real backend that only reads opened devices.
pub struct StubBackend {
    state: Arc<Mutex<StubState>>,
}

/// Scripting handle for a [`StubBackend`] that stays usable after the
/// backend has been boxed and handed to a receiver.
#[derive(Clone)]
pub struct StubHandle {
    state: Arc<Mutex<StubState>>,
}

impl StubBackend {
    /// Create a stub backend with pre-attached devices.
    pub fn new(devices: Vec<DeviceInfo>) -> (Self, StubHandle) {
        let state = Arc::new(Mutex::new(StubState {
            devices,
            ..StubState::default()
        }));
        (
            Self {
                state: Arc::clone(&state),
            },
            StubHandle { state },
        )
    }

    /// Create an empty stub that has no devices and never produces events.
    pub fn empty() -> Self {
        Self::new(Vec::new()).0
    }
}

impl StubHandle {
    /// Plug in a device.
    pub fn attach(&self, device: DeviceInfo) {
        if let Ok(mut state) = self.state.lock() {
            state.devices.retain(|d| d.id != device.id);
            state.devices.push(device);
        }
    }

    /// Unplug a device.
    pub fn detach(&self, id: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.devices.retain(|d| d.id != id);
            state.listening.retain(|l| l != id);
        }
    }

    /// Queue a wheel event from the given device.
    pub fn push_event(&self, device_id: &str, event: ScrollEvent) {
        self.push(ReceivedScroll {
            event,
            info: InputInfo::from_device(device_id),
        });
    }

    /// Queue a wheel event with explicit metadata.
    pub fn push(&self, scroll: ReceivedScroll) {
        if let Ok(mut state) = self.state.lock() {
            state.events.push_back(scroll);
        }
    }

    /// Make the next `count` scans fail.
    pub fn fail_scans(&self, count: usize) {
        if let Ok(mut state) = self.state.lock() {
            state.scan_failures = count;
        }
    }

    /// Events handed back for delivery to applications.
    pub fn passed_through(&self) -> Vec<ReceivedScroll> {
        self.state
            .lock()
            .map(|s| s.passed_through.clone())
            .unwrap_or_default()
    }

    /// Ids of the devices currently listened to.
    pub fn listening(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|s| s.listening.clone())
            .unwrap_or_default()
    }

    /// Events still queued.
    pub fn pending(&self) -> usize {
        self.state.lock().map(|s| s.events.len()).unwrap_or_default()
    }

    /// Whether the backend has released its devices.
    pub fn released(&self) -> bool {
        self.state.lock().map(|s| s.released).unwrap_or_default()
    }
}

impl StubBackend {
    fn state(&self) -> GlideResult<MutexGuard<'_, StubState>> {
        self.state
            .lock()
            .map_err(|_| GlideError::input_receiver("Stub backend lock poisoned"))
    }
}

impl InputBackend for StubBackend {
    fn scan_devices(&mut self) -> GlideResult<Vec<DeviceInfo>> {
        let mut state = self.state()?;
        if state.scan_failures > 0 {
            state.scan_failures -= 1;
            return Err(GlideError::device("Simulated scan failure"));
        }
        Ok(state.devices.clone())
    }

    fn listen(&mut self, devices: &[DeviceInfo]) -> GlideResult<()> {
        let mut state = self.state()?;
        state.listening = devices.iter().map(|d| d.id.clone()).collect();
        state.released = false;
        Ok(())
    }

    fn poll(&mut self) -> GlideResult<Option<ReceivedScroll>> {
        let mut state = self.state()?;
        let position = state
            .events
            .iter()
            .position(|scroll| is_listened(scroll, &state.listening));
        Ok(position.and_then(|index| state.events.remove(index)))
    }

    fn pass_through(&mut self, scroll: &ReceivedScroll) -> GlideResult<()> {
        self.state()?.passed_through.push(scroll.clone());
        Ok(())
    }

    fn release(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.listening.clear();
            state.released = true;
        }
    }

    fn name(&self) -> &str {
        "stub"
    }

    fn is_available(&self) -> bool {
        true
    }
}

fn is_listened(scroll: &ReceivedScroll, listening: &[String]) -> bool {
    match &scroll.info.device_id {
        Some(id) => listening.iter().any(|l| l == id),
        None => !listening.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glide_platform_core::device::{BusKind, DeviceCapabilities};

    fn mouse(id: &str) -> DeviceInfo {
        DeviceInfo {
            id: id.to_string(),
            name: "Test Mouse".to_string(),
            path: None,
            vendor_id: 1,
            product_id: 2,
            bus: BusKind::Usb,
            capabilities: DeviceCapabilities {
                relative_motion: true,
                scroll_wheel: true,
                mouse_buttons: true,
                ..DeviceCapabilities::default()
            },
        }
    }

    #[test]
    fn stub_only_delivers_from_listened_devices() {
        let (mut backend, handle) = StubBackend::new(vec![mouse("a"), mouse("b")]);
        handle.push_event("b", ScrollEvent::vertical(1));
        handle.push_event("a", ScrollEvent::vertical(-1));

        assert!(backend.poll().unwrap().is_none());

        backend.listen(&[mouse("a")]).unwrap();
        let scroll = backend.poll().unwrap().unwrap();
        assert_eq!(scroll.event.delta_y, -1);
        assert!(backend.poll().unwrap().is_none());
        assert_eq!(handle.pending(), 1);
    }

    #[test]
    fn stub_scan_follows_attach_and_detach() {
        let (mut backend, handle) = StubBackend::new(vec![mouse("a")]);
        handle.attach(mouse("b"));
        assert_eq!(backend.scan_devices().unwrap().len(), 2);

        handle.detach("a");
        let ids: Vec<String> = backend
            .scan_devices()
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec!["b".to_string()]);
    }

    #[test]
    fn stub_scan_failures_are_transient() {
        let (mut backend, handle) = StubBackend::new(vec![mouse("a")]);
        handle.fail_scans(1);
        assert!(backend.scan_devices().is_err());
        assert!(backend.scan_devices().is_ok());
    }

    #[test]
    fn release_stops_listening() {
        let (mut backend, handle) = StubBackend::new(vec![mouse("a")]);
        backend.listen(&[mouse("a")]).unwrap();
        backend.release();
        assert!(handle.listening().is_empty());
        assert!(handle.released());
    }
}
