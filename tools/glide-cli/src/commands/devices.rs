//! List input devices and whether Glide handles them.

use glide_common::config::AppConfig;
use glide_platform_core::device::{DeviceInfo, DeviceKind, RelevancePolicy};

pub fn run(config: &AppConfig, all: bool) -> anyhow::Result<()> {
    let policy = RelevancePolicy::from_settings(&config.receiver);
    let devices: Vec<DeviceInfo> = scan()
        .into_iter()
        .filter(|d| all || matches!(d.kind(), DeviceKind::Mouse | DeviceKind::Touchpad))
        .collect();

    if devices.is_empty() {
        println!("No readable input devices found. Run `glide check` for permission fixes.");
        return Ok(());
    }

    println!(
        "{:<22} {:<10} {:<10} {:<9} NAME",
        "DEVICE", "ID", "KIND", "RELEVANT"
    );
    for device in &devices {
        println!(
            "{:<22} {:<10} {:<10} {:<9} {}",
            device.id,
            device.hardware_id(),
            format!("{:?}", device.kind()).to_lowercase(),
            if policy.is_relevant(device) { "yes" } else { "no" },
            device.name
        );
    }

    let relevant = devices.iter().filter(|d| policy.is_relevant(d)).count();
    println!();
    println!("{relevant} relevant device(s)");
    Ok(())
}

#[cfg(target_os = "linux")]
pub fn scan() -> Vec<DeviceInfo> {
    glide_platform_linux::scan_devices()
}

#[cfg(not(target_os = "linux"))]
pub fn scan() -> Vec<DeviceInfo> {
    Vec::new()
}
