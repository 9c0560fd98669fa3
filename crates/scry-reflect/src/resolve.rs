//! Target-capability resolution.

use scry_core::Capability;
use scry_driver::DriverContext;

/// Determine the target capability for a compilation job when none is
/// supplied explicitly.
///
/// With an active hardware context, the bound device's reported capability
/// is authoritative. Without one, falls back to the highest capability this
/// build supports targeting, so offline reflection favors newer instruction
/// selection. Always returns a value.
pub fn resolve_capability(driver: &dyn DriverContext) -> Capability {
    driver
        .device_capability()
        .unwrap_or_else(Capability::max_supported)
}
