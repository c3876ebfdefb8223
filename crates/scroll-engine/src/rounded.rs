//! Non-animated scrolling: every tick becomes one fixed-size jump.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use glide_common::config::ParameterMap;
use glide_common::error::{GlideError, GlideResult};
use glide_platform_core::event::{
    Disposition, InputInfo, ScrollAxis, ScrollEvent, ScrollOutput, ScrollPhase,
};
use glide_platform_core::sink::ScrollSink;

use crate::control::ScrollControl;
use crate::params::ScrollParameters;

const NAME: &str = "rounded";

/// Scroll controller that posts `px_per_tick` per detent immediately.
pub struct RoundedScroll {
    state: Mutex<State>,
    running: AtomicBool,
}

struct State {
    loaded: bool,
    params: ScrollParameters,
    sink: Box<dyn ScrollSink>,
}

impl RoundedScroll {
    pub fn new(sink: Box<dyn ScrollSink>) -> Self {
        Self {
            state: Mutex::new(State {
                loaded: false,
                params: ScrollParameters::default(),
                sink,
            }),
            running: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> GlideResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| GlideError::poisoned("RoundedScroll"))
    }

    fn loaded_state(&self) -> GlideResult<MutexGuard<'_, State>> {
        let state = self.lock()?;
        if state.loaded {
            Ok(state)
        } else {
            Err(GlideError::not_initialized("RoundedScroll"))
        }
    }
}

impl ScrollControl for RoundedScroll {
    fn name(&self) -> &str {
        NAME
    }

    fn load_manual(&self) -> GlideResult<()> {
        let mut state = self.lock()?;
        if !state.loaded {
            state.params = ScrollParameters::default();
            state.loaded = true;
        }
        Ok(())
    }

    fn configure(&self, params: &ParameterMap) -> GlideResult<()> {
        let mut state = self.loaded_state()?;
        state.params = state.params.overlay(params)?;
        Ok(())
    }

    fn start(&self) -> GlideResult<()> {
        let _state = self.loaded_state()?;
        if !self.running.swap(true, Ordering::SeqCst) {
            tracing::info!("Rounded scrolling started");
        }
        Ok(())
    }

    fn stop(&self) -> GlideResult<()> {
        let _state = self.loaded_state()?;
        if self.running.swap(false, Ordering::SeqCst) {
            tracing::info!("Rounded scrolling stopped");
        }
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn handle_input(&self, event: &ScrollEvent, info: &InputInfo) -> GlideResult<Disposition> {
        let mut state = self.loaded_state()?;
        if !self.is_running() || event.continuous {
            return Ok(Disposition::PassThrough);
        }
        let Some((mut axis, ticks)) = event.dominant_axis() else {
            return Ok(Disposition::PassThrough);
        };

        if axis == ScrollAxis::Vertical
            && info.modifiers.shift
            && state.params.shift_scrolls_horizontally
        {
            axis = ScrollAxis::Horizontal;
        }

        let ticks = if state.params.invert {
            ticks.saturating_neg()
        } else {
            ticks
        };
        let pixels = (state.params.px_per_tick * f64::from(ticks)).round() as i32;
        state
            .sink
            .post(&ScrollOutput::along(axis, pixels, ScrollPhase::Linear))?;
        state.sink.post(&ScrollOutput::end())?;
        Ok(Disposition::Consumed)
    }
}
