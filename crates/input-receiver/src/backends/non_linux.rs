//! Input backend selection for platforms without evdev.

use glide_common::config::ReceiverSettings;

use super::StubBackend;
use crate::InputBackend;

pub fn detect_best_backend(_settings: &ReceiverSettings) -> Box<dyn InputBackend> {
    tracing::warn!(
        "Wheel interception is only implemented for Linux; using stub backend"
    );
    Box::new(StubBackend::empty())
}
