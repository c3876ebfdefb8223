//! Check system capabilities.

use glide_common::config::AppConfig;
use glide_platform_core::device::{relevant_devices, RelevancePolicy};
use glide_platform_linux::permissions;

use super::devices;

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("Glide System Check");
    println!("{}", "=".repeat(50));

    if !cfg!(target_os = "linux") {
        println!("[WARN] Wheel interception is only supported on Linux");
    }

    let scanned = devices::scan();
    let policy = RelevancePolicy::from_settings(&config.receiver);
    let relevant = relevant_devices(&scanned, &policy).len();
    if relevant > 0 {
        println!("[OK] Relevant mice attached: {relevant}");
    } else {
        println!("[WARN] No relevant mouse attached ({} devices readable)", scanned.len());
    }

    // Check permissions
    let capabilities = permissions::check_capabilities();
    println!();
    permissions::print_capability_report(&capabilities);

    println!();
    if permissions::all_required_available(&capabilities) {
        println!("All required capabilities are available. Glide is ready.");
    } else {
        println!("Some required capabilities are missing. See above for fixes.");
    }

    Ok(())
}
