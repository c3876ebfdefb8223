//! Run smooth scrolling until interrupted.

use std::sync::Arc;

use glide_common::config::AppConfig;
use glide_input_receiver::{InputBackend, InputReceiver};
use glide_platform_core::sink::ScrollSink;
use glide_scroll_engine::build_controller;

pub async fn run(mut config: AppConfig, no_grab: bool, rounded: bool) -> anyhow::Result<()> {
    if no_grab {
        config.receiver.grab_devices = false;
    }
    if rounded {
        config.scroll.smooth = false;
    }

    let (backend, sink) = platform_io(&config)?;
    let controller = build_controller(&config.scroll, sink)?;
    let receiver = InputReceiver::new(backend, Arc::clone(&controller), &config.receiver);

    println!("Glide ({} scrolling)", controller.name());
    if !receiver.relevant_devices_are_attached() {
        println!("No relevant mouse attached yet, waiting for one...");
    }
    println!("Press Ctrl+C to stop...");
    println!();

    receiver.start()?;

    // Wait for Ctrl+C
    tokio::signal::ctrl_c().await?;

    receiver.stop();
    let stats = receiver.join().await?;

    println!();
    println!("Stopped.");
    println!("  Wheel events received: {}", stats.events_received);
    println!("  Smoothed: {}", stats.events_consumed);
    println!("  Passed through: {}", stats.events_passed_through);
    println!("  Device changes: {}", stats.device_changes);

    Ok(())
}

#[cfg(target_os = "linux")]
fn platform_io(
    config: &AppConfig,
) -> anyhow::Result<(Box<dyn InputBackend>, Box<dyn ScrollSink>)> {
    use glide_platform_linux::{UinputScrollSink, VirtualPointer};

    let pointer = VirtualPointer::create().map_err(|e| {
        anyhow::anyhow!("Cannot create the virtual pointer: {e}. Run `glide check` for fixes.")
    })?;
    let sink = UinputScrollSink::new(pointer.clone(), config.output.pixels_per_detent);
    let backend = glide_input_receiver::detect_best_backend(&config.receiver, Some(pointer));
    Ok((backend, Box::new(sink)))
}

#[cfg(not(target_os = "linux"))]
fn platform_io(
    _config: &AppConfig,
) -> anyhow::Result<(Box<dyn InputBackend>, Box<dyn ScrollSink>)> {
    Err(glide_common::error::GlideError::unsupported(
        "scroll output needs uinput, which is only available on Linux",
    )
    .into())
}
