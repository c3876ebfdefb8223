//! uinput virtual pointer used for all synthesized output.
//!
//! One virtual device carries both the smooth-scroll frames and, when
//! physical mice are grabbed, their re-emitted motion and button events.

use std::sync::{Arc, Mutex};

use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, EventType, InputEvent, Key, RelativeAxisType};
use glide_common::error::{GlideError, GlideResult};

/// Name of the virtual device. Starts with the prefix the relevance policy
/// uses to skip Glide's own devices.
pub const VIRTUAL_POINTER_NAME: &str = "glide virtual pointer";

/// Shared handle to the uinput device.
#[derive(Clone)]
pub struct VirtualPointer {
    device: Arc<Mutex<VirtualDevice>>,
}

impl std::fmt::Debug for VirtualPointer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualPointer")
            .field("name", &VIRTUAL_POINTER_NAME)
            .finish()
    }
}

impl VirtualPointer {
    /// Create the uinput device. Requires write access to `/dev/uinput`.
    pub fn create() -> GlideResult<Self> {
        let keys: AttributeSet<Key> = [
            Key::BTN_LEFT,
            Key::BTN_RIGHT,
            Key::BTN_MIDDLE,
            Key::BTN_SIDE,
            Key::BTN_EXTRA,
            Key::BTN_FORWARD,
            Key::BTN_BACK,
            Key::BTN_TASK,
        ]
        .into_iter()
        .collect();

        let axes: AttributeSet<RelativeAxisType> = [
            RelativeAxisType::REL_X,
            RelativeAxisType::REL_Y,
            RelativeAxisType::REL_WHEEL,
            RelativeAxisType::REL_HWHEEL,
            RelativeAxisType::REL_WHEEL_HI_RES,
            RelativeAxisType::REL_HWHEEL_HI_RES,
        ]
        .into_iter()
        .collect();

        let device = VirtualDeviceBuilder::new()
            .and_then(|builder| builder.name(VIRTUAL_POINTER_NAME).with_keys(&keys))
            .and_then(|builder| builder.with_relative_axes(&axes))
            .and_then(|builder| builder.build())
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::PermissionDenied {
                    GlideError::permission_denied(format!("/dev/uinput: {e}"))
                } else {
                    GlideError::platform(format!("Failed to create virtual pointer: {e}"))
                }
            })?;

        tracing::info!(name = VIRTUAL_POINTER_NAME, "Created virtual pointer");
        Ok(Self {
            device: Arc::new(Mutex::new(device)),
        })
    }

    /// Emit a batch of events followed by a single `SYN_REPORT`.
    pub fn emit(&self, events: &[InputEvent]) -> GlideResult<()> {
        if events.is_empty() {
            return Ok(());
        }
        let mut device = self
            .device
            .lock()
            .map_err(|_| GlideError::platform("Virtual pointer lock poisoned"))?;
        device.emit(events)?;
        Ok(())
    }

    /// Emit relative-axis values, skipping zeros.
    pub fn emit_relative(&self, values: &[(RelativeAxisType, i32)]) -> GlideResult<()> {
        let events: Vec<InputEvent> = values
            .iter()
            .filter(|(_, value)| *value != 0)
            .map(|(axis, value)| InputEvent::new(EventType::RELATIVE, axis.0, *value))
            .collect();
        self.emit(&events)
    }
}
