//! Glide Linux Platform Integration
//!
//! Platform-specific implementations for Linux:
//! - **Devices:** evdev enumeration and capability classification
//! - **Virtual Pointer:** uinput device for synthesized output
//! - **Scroll Sink:** pixel frames to hi-res wheel events
//! - **Permissions:** capability detection and user guidance

#[cfg(target_os = "linux")]
pub mod devices;
pub mod permissions;
pub mod sink;
#[cfg(target_os = "linux")]
pub mod virtual_pointer;

#[cfg(target_os = "linux")]
pub use devices::{describe_device, open_nonblocking, scan_devices};
pub use sink::HiResConverter;
#[cfg(target_os = "linux")]
pub use sink::UinputScrollSink;
#[cfg(target_os = "linux")]
pub use virtual_pointer::{VirtualPointer, VIRTUAL_POINTER_NAME};
