//! In-process simulated driver.
//!
//! Backs tests and the CLI demo: a configurable device capability, a JIT
//! loader that scans assembly for kernel entry points and fires the
//! module-loaded event with a deterministic binary image (a raw disassembly
//! listing in text form), and an event bus implementing the subscription
//! protocol.

use std::sync::Mutex;
use std::time::Duration;

use scry_core::Capability;

use crate::context::DriverContext;
use crate::error::DriverError;
use crate::events::{EventHandler, JitEvents, ResourceEvent, SubscriptionId};
use crate::sync::{self, SyncTuning};

struct SimSubscription {
    id: u64,
    enabled: bool,
    handler: EventHandler,
}

#[derive(Default)]
struct EventBus {
    next_id: u64,
    subs: Vec<SimSubscription>,
}

/// Event subsystem of the simulated driver.
#[derive(Default)]
pub struct SimJitEvents {
    bus: Mutex<EventBus>,
}

impl SimJitEvents {
    fn bus(&self) -> std::sync::MutexGuard<'_, EventBus> {
        self.bus.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn deliver(&self, event: &ResourceEvent) {
        let mut bus = self.bus();
        for sub in bus.subs.iter_mut().filter(|s| s.enabled) {
            (sub.handler)(event);
        }
    }

    fn position(bus: &EventBus, id: SubscriptionId) -> Result<usize, DriverError> {
        bus.subs
            .iter()
            .position(|s| s.id == id.0)
            .ok_or(DriverError::UnknownSubscription(id.0))
    }
}

impl JitEvents for SimJitEvents {
    fn subscribe(&self, handler: EventHandler) -> Result<SubscriptionId, DriverError> {
        let mut bus = self.bus();
        let id = bus.next_id;
        bus.next_id += 1;
        bus.subs.push(SimSubscription {
            id,
            enabled: false,
            handler,
        });
        Ok(SubscriptionId(id))
    }

    fn enable(&self, id: SubscriptionId) -> Result<(), DriverError> {
        let mut bus = self.bus();
        let pos = Self::position(&bus, id)?;
        bus.subs[pos].enabled = true;
        Ok(())
    }

    fn disable(&self, id: SubscriptionId) -> Result<(), DriverError> {
        let mut bus = self.bus();
        let pos = Self::position(&bus, id)?;
        bus.subs[pos].enabled = false;
        Ok(())
    }

    fn unsubscribe(&self, id: SubscriptionId) -> Result<(), DriverError> {
        let mut bus = self.bus();
        let pos = Self::position(&bus, id)?;
        bus.subs.remove(pos);
        Ok(())
    }
}

/// A simulated hardware context with (or without) a bound device.
pub struct SimDriver {
    capability: Option<Capability>,
    events: SimJitEvents,
}

impl SimDriver {
    /// A context bound to a simulated device of the given capability.
    pub fn attached(capability: Capability) -> Self {
        Self {
            capability: Some(capability),
            events: SimJitEvents::default(),
        }
    }

    /// No active context; capability resolution must fall back.
    pub fn detached() -> Self {
        Self {
            capability: None,
            events: SimJitEvents::default(),
        }
    }

    /// Deliver an event to all enabled subscriptions.
    pub fn fire(&self, event: ResourceEvent) {
        self.events.deliver(&event);
    }

    /// Kernel entry names declared in textual assembly.
    fn entry_names(assembly: &str) -> Vec<String> {
        let mut names = Vec::new();
        for line in assembly.lines() {
            if let Some(rest) = line.trim_start().strip_prefix(".visible .entry ") {
                let name: String = rest
                    .chars()
                    .take_while(|c| c.is_alphanumeric() || *c == '_')
                    .collect();
                if !name.is_empty() {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Deterministic raw listing standing in for the JIT'ed binary image.
    fn raw_listing(target: &str, kernels: &[String]) -> String {
        let mut out = String::new();
        for name in kernels {
            out.push_str(&format!("\t\tFunction : {name}\n"));
            out.push_str(&format!("\t.headerflags\t@\"EF_CUDA_{target}\"\n"));
            out.push_str(".L_0:\n");
            out.push_str(&format!("        //## File \"{name}.src\", line 1\n"));
            out.push_str("        /*0000*/                   IMAD.MOV.U32 R1, RZ, RZ, c[0x0][0x28] ;\n");
            out.push_str("        /*0010*/                   S2R R0, SR_CTAID.X ;\n");
            out.push_str("        /*0020*/                   LDG.E R2, [R4.64] ;\n");
            out.push_str("        /*0030*/                   LDG.E R3, [R6.64] ;\n");
            out.push_str(".L_1:\n");
            out.push_str(&format!("        //## File \"{name}.src\", line 2\n"));
            out.push_str("        /*0040*/                   FADD R2, R2, R3 ;\n");
            out.push_str("        /*0050*/                   STG.E [R8.64], R2 ;\n");
            out.push_str("        /*0060*/                   EXIT ;\n");
        }
        out
    }
}

impl DriverContext for SimDriver {
    fn is_active(&self) -> bool {
        self.capability.is_some()
    }

    fn device_capability(&self) -> Option<Capability> {
        self.capability
    }

    fn load_module(&self, assembly: &str) -> Result<(), DriverError> {
        let capability = self.capability.ok_or(DriverError::NoContext)?;
        let kernels = Self::entry_names(assembly);
        if kernels.is_empty() {
            // A module with no entry points loads silently; no event fires.
            return Ok(());
        }
        let listing = Self::raw_listing(&capability.target_name().to_uppercase(), &kernels);
        self.events.deliver(&ResourceEvent::ModuleLoaded {
            payload: listing.into_bytes(),
        });
        Ok(())
    }

    fn jit_events(&self) -> &dyn JitEvents {
        &self.events
    }

    fn synchronize(&self, tuning: &SyncTuning) -> Result<(), DriverError> {
        if self.capability.is_none() {
            return Err(DriverError::NoContext);
        }
        // Simulated work is always complete; exercise the wait anyway.
        if sync::wait_until(tuning, Duration::from_secs(1), || true) {
            Ok(())
        } else {
            Err(DriverError::SyncTimedOut { waited_ms: 1000 })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const SAMPLE_ASM: &str = "\
//
// Generated for sm_86
//
.visible .entry vadd(
\t.param .u64 vadd_param_0
)
{
\tadd.f32 \t%f3, %f1, %f2;
\tret;
}
";

    #[test]
    fn detached_driver_has_no_capability() {
        let driver = SimDriver::detached();
        assert!(!driver.is_active());
        assert!(driver.device_capability().is_none());
        assert!(matches!(
            driver.load_module(SAMPLE_ASM),
            Err(DriverError::NoContext)
        ));
    }

    #[test]
    fn loading_entry_module_fires_event() {
        let driver = SimDriver::attached(Capability::of(8, 6));
        let payloads = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&payloads);
        let id = driver
            .jit_events()
            .subscribe(Box::new(move |ev| {
                let ResourceEvent::ModuleLoaded { payload } = ev;
                assert!(!payload.is_empty());
                let text = String::from_utf8(payload.clone()).unwrap();
                assert!(text.contains("Function : vadd"));
                assert!(text.contains("EF_CUDA_SM_86"));
                seen.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();
        driver.jit_events().enable(id).unwrap();

        driver.load_module(SAMPLE_ASM).unwrap();
        assert_eq!(payloads.load(Ordering::SeqCst), 1);
        driver.jit_events().unsubscribe(id).unwrap();
    }

    #[test]
    fn module_without_entries_loads_silently() {
        let driver = SimDriver::attached(Capability::of(8, 0));
        let payloads = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&payloads);
        let id = driver
            .jit_events()
            .subscribe(Box::new(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();
        driver.jit_events().enable(id).unwrap();

        driver.load_module(".func helper()\n{\n\tret;\n}\n").unwrap();
        assert_eq!(payloads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn synchronize_requires_context() {
        assert!(SimDriver::detached()
            .synchronize(&SyncTuning::default())
            .is_err());
        assert!(SimDriver::attached(Capability::of(7, 0))
            .synchronize(&SyncTuning::default())
            .is_ok());
    }
}
