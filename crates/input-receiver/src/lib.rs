//! Glide Input Receiver
//!
//! Watches for relevant pointing devices and routes their wheel events to
//! a scroll controller. Uses a pluggable backend architecture:
//!
//! - **Evdev:** direct device access on Linux, with optional exclusive grab
//! - **Stub:** scripted devices and events, for tests and other platforms
//!
//! The controller follows the hardware: it is started when the first
//! relevant device appears and stopped when the last one goes away.

pub mod backends;

pub use backends::{detect_best_backend, StubBackend, StubHandle};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use glide_common::clock::{MonotonicClock, RateController};
use glide_common::config::ReceiverSettings;
use glide_common::error::{GlideError, GlideResult};
use glide_platform_core::device::{diff_devices, DeviceChange, DeviceInfo, RelevancePolicy};
use glide_platform_core::event::{Disposition, ReceivedScroll};
use glide_scroll_engine::control::ScrollControl;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Capacity of the device change channel.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Trait for input receiving backends.
pub trait InputBackend: Send {
    /// Describe every input device currently present. Must not change
    /// which devices are being listened to.
    fn scan_devices(&mut self) -> GlideResult<Vec<DeviceInfo>>;

    /// Listen to exactly these devices from now on.
    fn listen(&mut self, devices: &[DeviceInfo]) -> GlideResult<()>;

    /// Poll for the next wheel event. Returns `None` if none is available.
    fn poll(&mut self) -> GlideResult<Option<ReceivedScroll>>;

    /// Deliver an event the controller did not consume to applications.
    fn pass_through(&mut self, scroll: &ReceivedScroll) -> GlideResult<()>;

    /// Stop listening to every device.
    fn release(&mut self);

    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Check if the backend is available on this system.
    fn is_available(&self) -> bool;
}

/// Counters reported when the receiver stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReceiverStats {
    pub events_received: u64,
    pub events_consumed: u64,
    pub events_passed_through: u64,
    pub device_changes: u64,
}

/// Receives wheel input from relevant devices. Clones share one receiver.
#[derive(Clone)]
pub struct InputReceiver {
    inner: Arc<Inner>,
}

struct Inner {
    backend: Mutex<Box<dyn InputBackend>>,
    backend_name: String,
    controller: Arc<dyn ScrollControl>,
    policy: RelevancePolicy,
    rescan_interval: Duration,
    clock: MonotonicClock,
    stop_flag: Arc<AtomicBool>,
    started: AtomicBool,
    task: Mutex<Option<JoinHandle<GlideResult<ReceiverStats>>>>,
    attached: Mutex<Vec<DeviceInfo>>,
    changes: broadcast::Sender<DeviceChange>,
}

impl InputReceiver {
    /// Create a receiver feeding `controller` from `backend`.
    pub fn new(
        backend: Box<dyn InputBackend>,
        controller: Arc<dyn ScrollControl>,
        settings: &ReceiverSettings,
    ) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        let backend_name = backend.name().to_string();
        Self {
            inner: Arc::new(Inner {
                backend: Mutex::new(backend),
                backend_name,
                controller,
                policy: RelevancePolicy::from_settings(settings),
                rescan_interval: Duration::from_millis(settings.rescan_interval_ms.max(1)),
                clock: MonotonicClock::start(),
                stop_flag: Arc::new(AtomicBool::new(false)),
                started: AtomicBool::new(false),
                task: Mutex::new(None),
                attached: Mutex::new(Vec::new()),
                changes,
            }),
        }
    }

    /// Whether any relevant device is attached right now.
    ///
    /// Performs a fresh scan; scan failures are logged and reported as
    /// `false`.
    pub fn relevant_devices_are_attached(&self) -> bool {
        match self.scan() {
            Ok(devices) => devices.iter().any(|d| self.inner.policy.is_relevant(d)),
            Err(e) => {
                tracing::warn!(error = %e, "Device scan failed");
                false
            }
        }
    }

    /// Start receiving in a background task. Idempotent.
    pub fn start(&self) -> GlideResult<()> {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            tracing::debug!("Input receiver already started");
            return Ok(());
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                self.inner.started.store(false, Ordering::SeqCst);
                return Err(GlideError::platform(
                    "InputReceiver::start must be called inside a tokio runtime",
                ));
            }
        };

        self.inner.stop_flag.store(false, Ordering::SeqCst);
        let receiver = self.clone();
        let handle = runtime.spawn(async move { receiver.run().await });
        *lock(&self.inner.task)? = Some(handle);
        Ok(())
    }

    /// Ask the receive loop to stop.
    pub fn stop(&self) {
        self.inner.stop_flag.store(true, Ordering::SeqCst);
    }

    /// Wait for the background task started by [`start`](Self::start).
    pub async fn join(&self) -> GlideResult<ReceiverStats> {
        let handle = lock(&self.inner.task)?.take();
        let Some(handle) = handle else {
            return Err(GlideError::input_receiver("Input receiver was not started"));
        };
        let result = handle
            .await
            .map_err(|e| GlideError::input_receiver(format!("Receive task failed: {e}")))?;
        self.inner.started.store(false, Ordering::SeqCst);
        result
    }

    /// Whether the receive loop has been started and not yet joined.
    pub fn is_started(&self) -> bool {
        self.inner.started.load(Ordering::SeqCst)
    }

    /// Subscribe to attach/detach notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceChange> {
        self.inner.changes.subscribe()
    }

    /// Devices seen by the most recent scan of the receive loop.
    pub fn attached_devices(&self) -> Vec<DeviceInfo> {
        lock(&self.inner.attached)
            .map(|devices| devices.clone())
            .unwrap_or_default()
    }

    /// Run the receive loop until the stop flag is set.
    pub async fn run(&self) -> GlideResult<ReceiverStats> {
        let inner = &self.inner;
        let mut stats = ReceiverStats::default();
        let mut rescan = RateController::with_interval(inner.rescan_interval);

        tracing::info!(
            backend = %inner.backend_name,
            rescan_interval_ms = rescan.interval_ns() / 1_000_000,
            clock_epoch = %inner.clock.epoch_wall(),
            "Input receiver started"
        );

        while !inner.stop_flag.load(Ordering::Relaxed) {
            if rescan.should_tick(inner.clock.elapsed_ns()) {
                if let Err(e) = self.rescan(&mut stats) {
                    tracing::warn!(error = %e, "Device rescan failed");
                }
            }

            let polled = lock(&inner.backend)?.poll();
            match polled {
                Ok(Some(scroll)) => self.dispatch(scroll, &mut stats)?,
                Ok(None) => {
                    // No event available, yield briefly
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Input receiving error");
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
            }
        }

        if let Err(e) = inner.controller.stop() {
            tracing::warn!(error = %e, "Failed to stop scroll controller");
        }
        lock(&inner.backend)?.release();

        tracing::info!(
            received = stats.events_received,
            consumed = stats.events_consumed,
            passed_through = stats.events_passed_through,
            device_changes = stats.device_changes,
            "Input receiver stopped"
        );
        Ok(stats)
    }

    fn scan(&self) -> GlideResult<Vec<DeviceInfo>> {
        lock(&self.inner.backend)?.scan_devices()
    }

    /// Rescan devices, publish changes and start/stop the controller.
    fn rescan(&self, stats: &mut ReceiverStats) -> GlideResult<()> {
        let inner = &self.inner;
        let devices = {
            let mut backend = lock(&inner.backend)?;
            let devices = backend.scan_devices()?;
            let relevant: Vec<DeviceInfo> = devices
                .iter()
                .filter(|d| inner.policy.is_relevant(d))
                .cloned()
                .collect();
            backend.listen(&relevant)?;
            devices
        };

        let previous = std::mem::replace(&mut *lock(&inner.attached)?, devices.clone());
        for change in diff_devices(&previous, &devices) {
            let device = change.device();
            let relevant = inner.policy.is_relevant(device);
            match &change {
                DeviceChange::Attached(_) if relevant => {
                    tracing::info!(
                        device = %device.name,
                        id = %device.id,
                        "Relevant device attached"
                    )
                }
                DeviceChange::Detached(_) if relevant => {
                    tracing::info!(
                        device = %device.name,
                        id = %device.id,
                        "Relevant device detached"
                    )
                }
                _ => tracing::debug!(?change, "Device change"),
            }
            stats.device_changes += 1;
            // No subscribers is fine.
            let _ = inner.changes.send(change);
        }

        let any_relevant = devices.iter().any(|d| inner.policy.is_relevant(d));
        let controller = &inner.controller;
        if any_relevant && !controller.is_running() {
            tracing::info!(
                controller = controller.name(),
                "Relevant devices present, enabling scrolling"
            );
            controller.start()?;
        } else if !any_relevant && controller.is_running() {
            tracing::info!(
                controller = controller.name(),
                "No relevant devices, disabling scrolling"
            );
            controller.stop()?;
        }
        Ok(())
    }

    fn dispatch(&self, scroll: ReceivedScroll, stats: &mut ReceiverStats) -> GlideResult<()> {
        stats.events_received += 1;

        let disposition = match self
            .inner
            .controller
            .handle_input(&scroll.event, &scroll.info)
        {
            Ok(disposition) => disposition,
            Err(e) => {
                tracing::warn!(error = %e, "Scroll controller failed, passing event through");
                Disposition::PassThrough
            }
        };

        match disposition {
            Disposition::Consumed => stats.events_consumed += 1,
            Disposition::PassThrough => {
                stats.events_passed_through += 1;
                if let Err(e) = lock(&self.inner.backend)?.pass_through(&scroll) {
                    tracing::warn!(error = %e, "Failed to pass event through");
                }
            }
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> GlideResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| GlideError::input_receiver("Input receiver lock poisoned"))
}
