//! Scroll input and output types.
//!
//! Wheel deltas are in detents ("ticks"); positive `delta_y` scrolls the
//! content up (away from the user) and positive `delta_x` scrolls right,
//! matching the kernel's `REL_WHEEL`/`REL_HWHEEL` sign convention.
//! Output deltas are whole pixels with the same signs.

use glide_common::config::ParameterMap;
use glide_common::error::{GlideError, GlideResult};
use serde::{Deserialize, Serialize};

/// Scroll axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollAxis {
    Vertical,
    Horizontal,
}

/// A single wheel event as read from a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScrollEvent {
    /// Vertical ticks.
    pub delta_y: i32,
    /// Horizontal ticks.
    pub delta_x: i32,
    /// Pixel-precise source that must not be re-animated.
    #[serde(default)]
    pub continuous: bool,
}

impl ScrollEvent {
    /// A discrete vertical wheel event.
    pub fn vertical(ticks: i32) -> Self {
        Self {
            delta_y: ticks,
            ..Self::default()
        }
    }

    /// A discrete horizontal wheel event.
    pub fn horizontal(ticks: i32) -> Self {
        Self {
            delta_x: ticks,
            ..Self::default()
        }
    }

    /// Whether the event carries no movement.
    pub fn is_empty(&self) -> bool {
        self.delta_x == 0 && self.delta_y == 0
    }

    /// The dominant axis and its ticks. Vertical wins ties.
    pub fn dominant_axis(&self) -> Option<(ScrollAxis, i32)> {
        if self.is_empty() {
            None
        } else if self.delta_y.unsigned_abs() >= self.delta_x.unsigned_abs() {
            Some((ScrollAxis::Vertical, self.delta_y))
        } else {
            Some((ScrollAxis::Horizontal, self.delta_x))
        }
    }
}

/// Keyboard modifiers held while the event happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub shift: bool,
    pub control: bool,
    pub alt: bool,
    pub meta: bool,
}

/// Metadata delivered alongside each scroll event.
///
/// Every field is optional so backends can report as much as they know.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InputInfo {
    /// Id of the source device (see `DeviceInfo::id`).
    pub device_id: Option<String>,
    /// Modifier state.
    pub modifiers: Modifiers,
    /// Timestamp of the event in nanoseconds, in the backend's clock.
    /// Informational only.
    pub timestamp_ns: Option<u64>,
}

impl InputInfo {
    /// Info naming the source device.
    pub fn from_device(device_id: impl Into<String>) -> Self {
        Self {
            device_id: Some(device_id.into()),
            ..Self::default()
        }
    }

    /// Parse an untyped key/value payload. Unknown keys are ignored.
    pub fn from_map(map: &ParameterMap) -> GlideResult<Self> {
        serde_json::from_value(serde_json::Value::Object(map.clone()))
            .map_err(|e| GlideError::input_receiver(format!("Invalid input info: {e}")))
    }
}

/// A scroll event paired with its metadata, as yielded by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedScroll {
    pub event: ScrollEvent,
    pub info: InputInfo,
}

/// What a scroll controller did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The controller took the event over; it must not be delivered as-is.
    Consumed,
    /// The event should reach applications unchanged.
    PassThrough,
}

/// Animation phase of an output frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollPhase {
    /// Constant-speed travel toward the requested distance.
    Linear,
    /// Decelerating glide after the requested distance is covered.
    Momentum,
    /// Gesture finished. Carries no movement.
    End,
}

/// One frame of synthesized scrolling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollOutput {
    /// Horizontal pixels.
    pub dx: i32,
    /// Vertical pixels.
    pub dy: i32,
    pub phase: ScrollPhase,
}

impl ScrollOutput {
    /// A frame moving `pixels` along `axis`.
    pub fn along(axis: ScrollAxis, pixels: i32, phase: ScrollPhase) -> Self {
        match axis {
            ScrollAxis::Vertical => Self {
                dx: 0,
                dy: pixels,
                phase,
            },
            ScrollAxis::Horizontal => Self {
                dx: pixels,
                dy: 0,
                phase,
            },
        }
    }

    /// The terminating frame of a gesture.
    pub fn end() -> Self {
        Self {
            dx: 0,
            dy: 0,
            phase: ScrollPhase::End,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dominant_axis_prefers_larger_delta() {
        assert_eq!(ScrollEvent::default().dominant_axis(), None);
        assert_eq!(
            ScrollEvent::vertical(-2).dominant_axis(),
            Some((ScrollAxis::Vertical, -2))
        );
        let diagonal = ScrollEvent {
            delta_y: 1,
            delta_x: -3,
            continuous: false,
        };
        assert_eq!(diagonal.dominant_axis(), Some((ScrollAxis::Horizontal, -3)));
    }

    #[test]
    fn input_info_from_partial_map() {
        let map = json!({
            "device_id": "/dev/input/event4",
            "modifiers": { "shift": true },
            "vendor_specific": 42
        });
        let serde_json::Value::Object(map) = map else {
            unreachable!()
        };

        let info = InputInfo::from_map(&map).unwrap();
        assert_eq!(info.device_id.as_deref(), Some("/dev/input/event4"));
        assert!(info.modifiers.shift);
        assert!(!info.modifiers.control);
        assert_eq!(info.timestamp_ns, None);
    }

    #[test]
    fn input_info_from_empty_map_is_default() {
        let info = InputInfo::from_map(&ParameterMap::new()).unwrap();
        assert_eq!(info, InputInfo::default());
    }

    #[test]
    fn input_info_rejects_wrong_types() {
        let serde_json::Value::Object(map) = json!({ "timestamp_ns": "soon" }) else {
            unreachable!()
        };
        assert!(InputInfo::from_map(&map).is_err());
    }

    #[test]
    fn output_along_axis() {
        let v = ScrollOutput::along(ScrollAxis::Vertical, 5, ScrollPhase::Linear);
        assert_eq!((v.dx, v.dy), (0, 5));
        let h = ScrollOutput::along(ScrollAxis::Horizontal, -5, ScrollPhase::Momentum);
        assert_eq!((h.dx, h.dy), (-5, 0));
        assert_eq!(ScrollOutput::end().phase, ScrollPhase::End);
    }
}
