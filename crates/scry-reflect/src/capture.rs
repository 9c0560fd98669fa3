//! The binary-capture bridge.
//!
//! A compiled binary is a transient byproduct of JIT loading; the loader
//! exposes no stable handle to it. The only reliable extraction point is a
//! one-shot module-loaded event, so capture is wired up before the load is
//! triggered and torn down unconditionally afterwards.

use std::sync::{Arc, Mutex};

use scry_driver::{DriverContext, EventSubscription, ResourceEvent, SyncTuning};

use crate::error::{ReflectError, Result};

/// JIT-load `assembly` and capture the binary image of the module it
/// produces.
///
/// Fails with [`ReflectError::NoKernelCompiled`] when loading completes
/// without a module-loaded event firing, e.g. because the assembly contained
/// no kernel entry point.
pub fn capture_binary(
    driver: &dyn DriverContext,
    assembly: &str,
    tuning: &SyncTuning,
) -> Result<Vec<u8>> {
    let slot: Arc<Mutex<Option<Vec<u8>>>> = Arc::new(Mutex::new(None));
    let captured = Arc::clone(&slot);

    let subscription = EventSubscription::scoped(
        driver.jit_events(),
        Box::new(move |event| {
            let ResourceEvent::ModuleLoaded { payload } = event;
            let mut slot = captured.lock().unwrap_or_else(|p| p.into_inner());
            // One-shot: only the first load within this call is captured.
            if slot.is_none() {
                *slot = Some(payload.clone());
            }
        }),
    )?;

    let loaded = driver
        .load_module(assembly)
        .and_then(|()| driver.synchronize(tuning));
    drop(subscription);
    loaded?;

    let mut slot = slot.lock().unwrap_or_else(|p| p.into_inner());
    slot.take().ok_or(ReflectError::NoKernelCompiled)
}
