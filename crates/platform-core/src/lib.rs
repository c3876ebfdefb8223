//! Glide platform core contracts.
//!
//! This crate contains the OS-neutral data structures shared by the
//! input receiver, the scroll engine and the platform backends:
//! - **Devices:** descriptions, classification and the relevance policy
//! - **Events:** scroll input, per-event metadata, handling disposition
//! - **Output:** animation frames and the sink they are posted to

pub mod device;
pub mod event;
pub mod sink;

pub use device::{
    diff_devices, relevant_devices, BusKind, DeviceCapabilities, DeviceChange, DeviceInfo,
    DeviceKind, RelevancePolicy, VIRTUAL_DEVICE_PREFIX,
};
pub use event::{
    Disposition, InputInfo, Modifiers, ReceivedScroll, ScrollAxis, ScrollEvent, ScrollOutput,
    ScrollPhase,
};
pub use sink::ScrollSink;
