//! Destination for synthesized scroll frames.

use glide_common::error::GlideResult;

use crate::event::ScrollOutput;

/// Something that turns scroll frames into real scrolling.
pub trait ScrollSink: Send {
    /// Deliver one frame.
    fn post(&mut self, output: &ScrollOutput) -> GlideResult<()>;

    /// Sink name for logging.
    fn name(&self) -> &str;
}
