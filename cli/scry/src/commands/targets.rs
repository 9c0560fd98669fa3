//! `scry targets` — capability listing.

use anyhow::Result;

use scry_core::{Capability, SUPPORTED_CAPABILITIES};

use crate::commands::DemoStack;

pub fn list(stack: &DemoStack) -> Result<()> {
    let bound = stack.reflector.driver().device_capability();

    println!("Supported target capabilities:");
    println!();
    for capability in SUPPORTED_CAPABILITIES {
        let marker = match bound {
            Some(dev) if dev == *capability => "  (bound device)",
            _ => "",
        };
        println!("  {:<6} {}{marker}", capability.to_string(), capability.target_name());
    }
    println!();
    match bound {
        Some(dev) => println!("Active context: device capability {dev}"),
        None => println!(
            "No active context: jobs default to capability {}",
            Capability::max_supported()
        ),
    }
    Ok(())
}
