//! The driver-context trait.

use scry_core::Capability;

use crate::error::DriverError;
use crate::events::JitEvents;
use crate::sync::SyncTuning;

/// A bound (or absent) hardware context.
///
/// Capability queries against a bound device are treated as authoritative and
/// exact; `load_module` is the JIT trigger that makes the transient compiled
/// binary materialize and the module-loaded event fire.
pub trait DriverContext {
    /// Whether a hardware context is currently active.
    fn is_active(&self) -> bool;

    /// Capability of the currently bound device, or `None` when no context
    /// is active.
    fn device_capability(&self) -> Option<Capability>;

    /// JIT-load textual assembly into a device module.
    ///
    /// Blocks until loading completes; this is a synchronous foreign call,
    /// not a cooperative yield point.
    fn load_module(&self, assembly: &str) -> Result<(), DriverError>;

    /// The JIT resource-event subsystem of this context.
    fn jit_events(&self) -> &dyn JitEvents;

    /// Wait for outstanding device work, spinning first and falling back to
    /// a timer-based wait per `tuning`.
    fn synchronize(&self, tuning: &SyncTuning) -> Result<(), DriverError>;
}
