//! Glide Scroll Engine
//!
//! Turns wheel ticks into scrolling:
//! - **Animator:** smooth-scroll physics (linear travel, then momentum)
//! - **SmoothScroll:** animated controller with a background frame driver
//! - **RoundedScroll:** fixed-step controller for when smoothing is off
//! - **Parameters:** tunables, configured from untyped key/value maps
//!
//! The animator is pure computation; controllers own the timing and post
//! frames to a [`ScrollSink`](glide_platform_core::sink::ScrollSink).

pub mod animator;
pub mod control;
pub mod params;
pub mod rounded;
pub mod sink;
pub mod smooth;

pub use animator::Animator;
pub use control::{build_controller, ScrollControl};
pub use params::ScrollParameters;
pub use rounded::RoundedScroll;
pub use sink::RecordingSink;
pub use smooth::SmoothScroll;
