//! Permission detection and guidance.
//!
//! Glide reads mice through `/dev/input/event*` and writes synthesized
//! scrolling through `/dev/uinput`; both usually require membership in
//! the `input` group or a udev rule.

use std::path::Path;

use serde::Serialize;

/// A system capability that Glide may need.
#[derive(Debug, Clone, Serialize)]
pub struct Capability {
    pub name: String,
    pub description: String,
    pub available: bool,
    pub required: bool,
    pub fix_instructions: Option<String>,
}

/// Check all capabilities and report status.
pub fn check_capabilities() -> Vec<Capability> {
    vec![
        check_input_device_access(),
        check_uinput_access(),
        check_input_group(),
    ]
}

/// Whether every required capability is available.
pub fn all_required_available(capabilities: &[Capability]) -> bool {
    capabilities
        .iter()
        .filter(|c| c.required)
        .all(|c| c.available)
}

/// Check that at least one event device can be opened for reading.
fn check_input_device_access() -> Capability {
    let readable = readable_event_nodes(Path::new("/dev/input"));

    Capability {
        name: "Input Device Access".to_string(),
        description: "Read wheel events from /dev/input/event*".to_string(),
        available: readable > 0,
        required: true,
        fix_instructions: if readable == 0 {
            Some(
                "Add user to input group: sudo usermod -aG input $USER (logout required)"
                    .to_string(),
            )
        } else {
            None
        },
    }
}

/// Check that the uinput node can be opened for writing.
fn check_uinput_access() -> Capability {
    let available = std::fs::OpenOptions::new()
        .write(true)
        .open("/dev/uinput")
        .is_ok();

    Capability {
        name: "uinput".to_string(),
        description: "Create the virtual pointer that emits smooth scrolling".to_string(),
        available,
        required: true,
        fix_instructions: if available {
            None
        } else {
            Some(
                "Load the module (sudo modprobe uinput) and allow access, e.g. a udev rule: \
                 KERNEL==\"uinput\", GROUP=\"input\", MODE=\"0660\""
                    .to_string(),
            )
        },
    }
}

/// Check membership in the `input` group.
fn check_input_group() -> Capability {
    let in_input_group = std::process::Command::new("groups")
        .output()
        .map(|o| {
            String::from_utf8_lossy(&o.stdout)
                .split_whitespace()
                .any(|g| g == "input")
        })
        .unwrap_or(false);

    Capability {
        name: "Input Group".to_string(),
        description: "Membership in the 'input' group".to_string(),
        available: in_input_group,
        required: false, // udev rules or root work too
        fix_instructions: if in_input_group {
            None
        } else {
            Some("sudo usermod -aG input $USER (logout required)".to_string())
        },
    }
}

fn readable_event_nodes(dir: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().starts_with("event"))
        .filter(|entry| std::fs::File::open(entry.path()).is_ok())
        .count()
}

/// Print a user-friendly capability report.
pub fn print_capability_report(capabilities: &[Capability]) {
    println!("Glide System Capabilities:");
    println!("{}", "-".repeat(60));

    for cap in capabilities {
        let status = if cap.available {
            "[OK]"
        } else if cap.required {
            "[MISSING - REQUIRED]"
        } else {
            "[MISSING - OPTIONAL]"
        };

        println!("  {} {}: {}", status, cap.name, cap.description);

        if let Some(ref fix) = cap.fix_instructions {
            println!("    Fix: {fix}");
        }
    }
}
