//! The scroll-control abstraction shared by all controllers.

use std::sync::Arc;

use glide_common::config::{ParameterMap, ScrollSettings};
use glide_common::error::GlideResult;
use glide_platform_core::event::{Disposition, InputInfo, ScrollEvent};
use glide_platform_core::sink::ScrollSink;

use crate::rounded::RoundedScroll;
use crate::smooth::SmoothScroll;

/// A component that takes over wheel events and decides how they scroll.
///
/// Implementations are handles that can be shared across tasks: every
/// method takes `&self`.
pub trait ScrollControl: Send + Sync {
    /// Controller name for logging.
    fn name(&self) -> &str;

    /// One-time initialization. Must precede every other call except
    /// [`is_running`](Self::is_running). Repeated calls are no-ops.
    fn load_manual(&self) -> GlideResult<()>;

    /// Overlay the given parameters onto the current ones.
    fn configure(&self, params: &ParameterMap) -> GlideResult<()>;

    /// Begin handling input. Idempotent.
    fn start(&self) -> GlideResult<()>;

    /// Stop handling input. Idempotent.
    fn stop(&self) -> GlideResult<()>;

    /// Whether the controller is currently handling input.
    fn is_running(&self) -> bool;

    /// Handle one wheel event.
    fn handle_input(&self, event: &ScrollEvent, info: &InputInfo) -> GlideResult<Disposition>;
}

/// Build, initialize and configure the controller selected by `settings`.
pub fn build_controller(
    settings: &ScrollSettings,
    sink: Box<dyn ScrollSink>,
) -> GlideResult<Arc<dyn ScrollControl>> {
    let controller: Arc<dyn ScrollControl> = if settings.smooth {
        Arc::new(SmoothScroll::new(sink))
    } else {
        Arc::new(RoundedScroll::new(sink))
    };

    controller.load_manual()?;
    controller.configure(&settings.parameters)?;
    tracing::info!(controller = controller.name(), "Scroll controller ready");
    Ok(controller)
}
