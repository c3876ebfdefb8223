//! Animated smooth scrolling.
//!
//! [`SmoothScroll`] consumes discrete wheel ticks and replaces them with a
//! stream of pixel frames produced by the [`Animator`]. Frames are posted by
//! a driver task running at `frame_rate_hz` on the tokio runtime; the driver
//! parks on a [`Notify`] while there is nothing to animate.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use glide_common::clock::{interval_for_hz, MonotonicClock};
use glide_common::config::ParameterMap;
use glide_common::error::{GlideError, GlideResult};
use glide_platform_core::event::{Disposition, InputInfo, ScrollAxis, ScrollEvent, ScrollOutput};
use glide_platform_core::sink::ScrollSink;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::animator::Animator;
use crate::control::ScrollControl;
use crate::params::ScrollParameters;

const NAME: &str = "smooth";

/// Smooth-scroll controller handle. Clones share the same controller.
#[derive(Clone)]
pub struct SmoothScroll {
    shared: Arc<Shared>,
}

struct Shared {
    state: Mutex<State>,
    running: AtomicBool,
    wake: Notify,
    clock: MonotonicClock,
}

struct State {
    loaded: bool,
    params: ScrollParameters,
    animator: Animator,
    sink: Box<dyn ScrollSink>,
    driver: Option<JoinHandle<()>>,
    drivers_spawned: u64,
    frames_posted: u64,
}

impl SmoothScroll {
    /// Create a controller posting frames to `sink`.
    pub fn new(sink: Box<dyn ScrollSink>) -> Self {
        Self::with_clock(sink, MonotonicClock::start())
    }

    /// Create a controller timestamping input with `clock`.
    pub fn with_clock(sink: Box<dyn ScrollSink>, clock: MonotonicClock) -> Self {
        let params = ScrollParameters::default();
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    loaded: false,
                    animator: Animator::new(params.clone()),
                    params,
                    sink,
                    driver: None,
                    drivers_spawned: 0,
                    frames_posted: 0,
                }),
                running: AtomicBool::new(false),
                wake: Notify::new(),
                clock,
            }),
        }
    }

    /// Current parameters.
    pub fn parameters(&self) -> GlideResult<ScrollParameters> {
        Ok(self.shared.lock()?.params.clone())
    }

    /// Whether a gesture is being animated.
    pub fn is_animating(&self) -> bool {
        self.shared
            .lock()
            .map(|state| state.animator.is_busy())
            .unwrap_or(false)
    }

    /// Total frames posted to the sink.
    pub fn frames_posted(&self) -> u64 {
        self.shared
            .lock()
            .map(|state| state.frames_posted)
            .unwrap_or(0)
    }

    /// [`ScrollControl::handle_input`] with an explicit timestamp.
    pub fn handle_input_at(
        &self,
        event: &ScrollEvent,
        info: &InputInfo,
        now_ns: u64,
    ) -> GlideResult<Disposition> {
        let mut state = self.shared.lock()?;
        if !state.loaded {
            return Err(GlideError::not_initialized("SmoothScroll"));
        }
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

        let step = state.animator.tick(now_ns, axis, ticks);
        drop(state);
        self.shared.wake.notify_one();

        tracing::trace!(
            ?axis,
            ticks,
            step,
            device = info.device_id.as_deref().unwrap_or("unknown"),
            "Consumed wheel event"
        );
        Ok(Disposition::Consumed)
    }

    /// Compute the frame due at `now_ns` and post it.
    pub fn advance_frame(&self, now_ns: u64) -> GlideResult<Option<ScrollOutput>> {
        self.shared.advance(now_ns)
    }

    fn spawn_driver(&self, state: &mut State) -> GlideResult<()> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            GlideError::platform("SmoothScroll::start must be called inside a tokio runtime")
        })?;

        if let Some(old) = state.driver.take() {
            old.abort();
        }
        let shared = Arc::clone(&self.shared);
        let frame_rate_hz = state.params.frame_rate_hz;
        state.driver = Some(runtime.spawn(drive_frames(shared, frame_rate_hz)));
        state.drivers_spawned += 1;
        tracing::debug!(
            frame_rate_hz,
            generation = state.drivers_spawned,
            "Frame driver spawned"
        );
        Ok(())
    }
}

impl ScrollControl for SmoothScroll {
    fn name(&self) -> &str {
        NAME
    }

    fn load_manual(&self) -> GlideResult<()> {
        let mut state = self.shared.lock()?;
        if state.loaded {
            tracing::debug!("SmoothScroll already loaded");
            return Ok(());
        }

        state.params = ScrollParameters::default();
        state.animator = Animator::new(state.params.clone());
        state.loaded = true;
        tracing::debug!("SmoothScroll loaded");
        Ok(())
    }

    fn configure(&self, params: &ParameterMap) -> GlideResult<()> {
        let mut state = self.shared.lock()?;
        if !state.loaded {
            return Err(GlideError::not_initialized("SmoothScroll"));
        }

        let updated = state.params.overlay(params)?;
        let frame_rate_changed = updated.frame_rate_hz != state.params.frame_rate_hz;
        state.animator.set_params(updated.clone());
        state.params = updated;

        if frame_rate_changed && self.is_running() {
            self.spawn_driver(&mut state)?;
        }
        tracing::debug!(keys = params.len(), "SmoothScroll configured");
        Ok(())
    }

    fn start(&self) -> GlideResult<()> {
        let mut state = self.shared.lock()?;
        if !state.loaded {
            return Err(GlideError::not_initialized("SmoothScroll"));
        }
        if self.is_running() {
            tracing::debug!("SmoothScroll already running");
            return Ok(());
        }

        self.shared.running.store(true, Ordering::SeqCst);
        if let Err(e) = self.spawn_driver(&mut state) {
            self.shared.running.store(false, Ordering::SeqCst);
            return Err(e);
        }
        tracing::info!(frame_rate_hz = state.params.frame_rate_hz, "Smooth scrolling started");
        Ok(())
    }

    fn stop(&self) -> GlideResult<()> {
        let mut state = self.shared.lock()?;
        if !state.loaded {
            return Err(GlideError::not_initialized("SmoothScroll"));
        }
        if !self.shared.running.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        if let Some(driver) = state.driver.take() {
            driver.abort();
        }
        if let Some(end) = state.animator.finish() {
            state.post(&end)?;
        }
        tracing::info!(frames = state.frames_posted, "Smooth scrolling stopped");
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    fn handle_input(&self, event: &ScrollEvent, info: &InputInfo) -> GlideResult<Disposition> {
        let now_ns = self.shared.clock.elapsed_ns();
        self.handle_input_at(event, info, now_ns)
    }
}

impl Shared {
    fn lock(&self) -> GlideResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| GlideError::poisoned("SmoothScroll"))
    }

    fn advance(&self, now_ns: u64) -> GlideResult<Option<ScrollOutput>> {
        let mut state = self.lock()?;
        let Some(frame) = state.animator.frame(now_ns) else {
            return Ok(None);
        };
        state.post(&frame)?;
        Ok(Some(frame))
    }
}

impl State {
    fn post(&mut self, frame: &ScrollOutput) -> GlideResult<()> {
        self.sink.post(frame)?;
        self.frames_posted += 1;
        Ok(())
    }
}

/// Frame driver: posts one frame per period while a gesture is in flight.
async fn drive_frames(shared: Arc<Shared>, frame_rate_hz: u32) {
    let mut interval = tokio::time::interval(interval_for_hz(frame_rate_hz));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    while shared.running.load(Ordering::SeqCst) {
        let busy = match shared.lock() {
            Ok(state) => state.animator.is_busy(),
            Err(e) => {
                tracing::error!(error = %e, "Frame driver exiting");
                return;
            }
        };

        if !busy {
            shared.wake.notified().await;
            interval.reset();
            continue;
        }

        interval.tick().await;
        let now_ns = shared.clock.elapsed_ns();
        if let Err(e) = shared.advance(now_ns) {
            tracing::warn!(error = %e, "Failed to post scroll frame");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::RecordingSink;
    use glide_platform_core::event::{Modifiers, ScrollPhase};
    use serde_json::json;

    fn loaded(sink: &RecordingSink) -> SmoothScroll {
        let scroll = SmoothScroll::new(Box::new(sink.clone()));
        scroll.load_manual().unwrap();
        scroll
    }

    fn params(value: serde_json::Value) -> ParameterMap {
        match value {
            serde_json::Value::Object(map) => map,
            _ => ParameterMap::new(),
        }
    }

    #[test]
    fn operations_before_load_manual_fail() {
        let scroll = SmoothScroll::new(Box::new(RecordingSink::new()));
        assert!(matches!(
            scroll.configure(&ParameterMap::new()),
            Err(GlideError::NotInitialized { .. })
        ));
        assert!(matches!(
            scroll.start(),
            Err(GlideError::NotInitialized { .. })
        ));
        assert!(matches!(
            scroll.handle_input(&ScrollEvent::vertical(1), &InputInfo::default()),
            Err(GlideError::NotInitialized { .. })
        ));
        assert!(!scroll.is_running());
    }

    #[test]
    fn load_manual_twice_is_harmless() {
        let sink = RecordingSink::new();
        let scroll = loaded(&sink);
        scroll.configure(&params(json!({ "px_per_tick": 50 }))).unwrap();
        scroll.load_manual().unwrap();
        assert!((scroll.parameters().unwrap().px_per_tick - 50.0).abs() < 1e-9);
    }

    #[test]
    fn start_requires_runtime() {
        let scroll = loaded(&RecordingSink::new());
        assert!(matches!(scroll.start(), Err(GlideError::Platform { .. })));
        assert!(!scroll.is_running());
    }

    #[tokio::test]
    async fn start_stop_lifecycle() {
        let scroll = loaded(&RecordingSink::new());
        assert!(!scroll.is_running());

        scroll.start().unwrap();
        assert!(scroll.is_running());
        scroll.start().unwrap();
        assert!(scroll.is_running());

        scroll.stop().unwrap();
        assert!(!scroll.is_running());
        scroll.stop().unwrap();
        assert!(!scroll.is_running());

        scroll.start().unwrap();
        assert!(scroll.is_running());
        scroll.stop().unwrap();
    }

    #[tokio::test]
    async fn passes_through_when_stopped_or_not_applicable() {
        let scroll = loaded(&RecordingSink::new());
        let info = InputInfo::default();

        assert_eq!(
            scroll.handle_input(&ScrollEvent::vertical(1), &info).unwrap(),
            Disposition::PassThrough
        );

        scroll.start().unwrap();
        assert_eq!(
            scroll.handle_input(&ScrollEvent::default(), &info).unwrap(),
            Disposition::PassThrough
        );
        let trackpad = ScrollEvent {
            continuous: true,
            ..ScrollEvent::vertical(1)
        };
        assert_eq!(
            scroll.handle_input(&trackpad, &info).unwrap(),
            Disposition::PassThrough
        );
        assert_eq!(
            scroll.handle_input(&ScrollEvent::vertical(1), &info).unwrap(),
            Disposition::Consumed
        );
        scroll.stop().unwrap();
    }

    #[tokio::test]
    async fn manual_frames_cover_tick_distance() {
        let sink = RecordingSink::new();
        let scroll = loaded(&sink);
        scroll.configure(&params(json!({ "friction": 0 }))).unwrap();
        scroll.start().unwrap();

        scroll
            .handle_input_at(&ScrollEvent::vertical(-1), &InputInfo::default(), 0)
            .unwrap();
        let mut now = 0;
        while scroll.is_animating() {
            now += 10_000_000;
            scroll.advance_frame(now).unwrap();
        }
        scroll.stop().unwrap();

        assert_eq!(sink.total(), (0, -76));
        assert_eq!(sink.gestures_ended(), 1);
    }

    #[tokio::test]
    async fn shift_turns_vertical_into_horizontal() {
        let sink = RecordingSink::new();
        let scroll = loaded(&sink);
        scroll.configure(&params(json!({ "friction": 0 }))).unwrap();
        scroll.start().unwrap();

        let info = InputInfo {
            modifiers: Modifiers {
                shift: true,
                ..Modifiers::default()
            },
            ..InputInfo::default()
        };
        scroll
            .handle_input_at(&ScrollEvent::vertical(1), &info, 0)
            .unwrap();
        scroll.advance_frame(200_000_000).unwrap();
        scroll.stop().unwrap();

        assert_eq!(sink.total(), (76, 0));
    }

    #[tokio::test]
    async fn shift_is_ignored_when_horizontal_mapping_is_off() {
        let sink = RecordingSink::new();
        let scroll = loaded(&sink);
        scroll
            .configure(&params(json!({
                "friction": 0,
                "shift_scrolls_horizontally": false
            })))
            .unwrap();
        scroll.start().unwrap();

        let info = InputInfo {
            modifiers: Modifiers {
                shift: true,
                ..Modifiers::default()
            },
            ..InputInfo::default()
        };
        scroll
            .handle_input_at(&ScrollEvent::vertical(1), &info, 0)
            .unwrap();
        scroll.advance_frame(200_000_000).unwrap();
        scroll.stop().unwrap();

        assert_eq!(sink.total(), (0, 76));
    }

    #[tokio::test]
    async fn stop_mid_gesture_posts_end() {
        let sink = RecordingSink::new();
        let scroll = loaded(&sink);
        scroll.start().unwrap();

        scroll
            .handle_input_at(&ScrollEvent::vertical(3), &InputInfo::default(), 0)
            .unwrap();
        scroll.advance_frame(10_000_000).unwrap();
        scroll.stop().unwrap();

        let frames = sink.frames();
        assert_eq!(frames.last().map(|f| f.phase), Some(ScrollPhase::End));
        assert!(!scroll.is_animating());
    }

    #[tokio::test]
    async fn configure_while_running_keeps_gesture() {
        let sink = RecordingSink::new();
        let scroll = loaded(&sink);
        scroll.configure(&params(json!({ "friction": 0 }))).unwrap();
        scroll.start().unwrap();

        scroll
            .handle_input_at(&ScrollEvent::vertical(1), &InputInfo::default(), 0)
            .unwrap();
        scroll
            .configure(&params(json!({ "ms_per_tick": 200, "frame_rate_hz": 60 })))
            .unwrap();
        assert!(scroll.is_animating());
        assert!(scroll.is_running());

        scroll.advance_frame(150_000_000).unwrap();
        scroll.stop().unwrap();
        assert_eq!(sink.total(), (0, 76));
    }

    #[tokio::test]
    async fn frame_rate_change_restarts_driver() {
        let sink = RecordingSink::new();
        let scroll = loaded(&sink);
        let spawned = |scroll: &SmoothScroll| scroll.shared.lock().unwrap().drivers_spawned;

        scroll.configure(&params(json!({ "frame_rate_hz": 90 }))).unwrap();
        assert_eq!(spawned(&scroll), 0);

        scroll.start().unwrap();
        assert_eq!(spawned(&scroll), 1);
        scroll.configure(&params(json!({ "px_per_tick": 60 }))).unwrap();
        assert_eq!(spawned(&scroll), 1);
        scroll.configure(&params(json!({ "frame_rate_hz": 60 }))).unwrap();
        assert_eq!(spawned(&scroll), 2);

        scroll
            .handle_input(&ScrollEvent::vertical(1), &InputInfo::default())
            .unwrap();
        for _ in 0..200 {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            if !scroll.is_animating() {
                break;
            }
        }
        scroll.stop().unwrap();

        assert!(sink.total().1 >= 60);
        assert_eq!(sink.gestures_ended(), 1);
    }

    #[tokio::test]
    async fn rejected_configuration_keeps_previous_parameters() {
        let scroll = loaded(&RecordingSink::new());
        let before = scroll.parameters().unwrap();
        assert!(scroll
            .configure(&params(json!({ "px_per_tick": "far" })))
            .is_err());
        assert_eq!(scroll.parameters().unwrap(), before);
    }

    #[tokio::test]
    async fn driver_posts_frames_in_background() {
        let sink = RecordingSink::new();
        let scroll = loaded(&sink);
        scroll.start().unwrap();

        scroll
            .handle_input(&ScrollEvent::vertical(1), &InputInfo::default())
            .unwrap();
        for _ in 0..200 {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            if !scroll.is_animating() {
                break;
            }
        }
        scroll.stop().unwrap();

        assert!(sink.total().1 >= 76);
        assert_eq!(sink.gestures_ended(), 1);
        assert!(scroll.frames_posted() > 1);
    }
}
