//! In-process scroll sinks.

use std::sync::{Arc, Mutex};

use glide_common::error::{GlideError, GlideResult};
use glide_platform_core::event::{ScrollOutput, ScrollPhase};
use glide_platform_core::sink::ScrollSink;

/// Sink that keeps every frame in memory. Clones share the same buffer,
/// so a test can hand one clone to a controller and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    frames: Arc<Mutex<Vec<ScrollOutput>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the frames posted so far.
    pub fn frames(&self) -> Vec<ScrollOutput> {
        self.frames
            .lock()
            .map(|frames| frames.clone())
            .unwrap_or_default()
    }

    /// Sum of `(dx, dy)` over all frames.
    pub fn total(&self) -> (i32, i32) {
        self.frames()
            .iter()
            .fold((0, 0), |(x, y), f| (x + f.dx, y + f.dy))
    }

    /// Number of `End` frames posted.
    pub fn gestures_ended(&self) -> usize {
        self.frames()
            .iter()
            .filter(|f| f.phase == ScrollPhase::End)
            .count()
    }
}

impl ScrollSink for RecordingSink {
    fn post(&mut self, output: &ScrollOutput) -> GlideResult<()> {
        self.frames
            .lock()
            .map_err(|_| GlideError::poisoned("RecordingSink"))?
            .push(*output);
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}
