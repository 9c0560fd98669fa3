//! CLI command implementations.

pub mod dump;
pub mod reflect;
pub mod targets;

use std::sync::Arc;

use anyhow::{bail, Result};

use scry_codegen::SimBackend;
use scry_core::{Capability, FunctionHandle, TypeDesc};
use scry_driver::{DriverContext, SimDriver};
use scry_reflect::{Collaborators, Reflector, SimDisassembler};

/// Capability of the simulated device the CLI binds by default.
const DEMO_CAPABILITY: Capability = Capability::of(8, 6);

/// The simulated stack every command runs against.
pub struct DemoStack {
    pub reflector: Reflector,
    pub backend: Arc<SimBackend>,
}

/// Assemble the demo backend, driver, and disassembler.
pub fn demo_stack(no_device: bool) -> DemoStack {
    let backend = Arc::new(SimBackend::demo());
    let driver: Arc<dyn DriverContext + Send + Sync> = if no_device {
        Arc::new(SimDriver::detached())
    } else {
        Arc::new(SimDriver::attached(DEMO_CAPABILITY))
    };
    let collab = Collaborators {
        backend: Arc::clone(&backend) as Arc<dyn scry_codegen::Backend>,
        driver,
        disassembler: Arc::new(SimDisassembler),
    };
    DemoStack {
        reflector: Reflector::new(collab),
        backend,
    }
}

/// Argument signature the demo kernels are specialized over.
pub fn demo_args() -> Vec<TypeDesc> {
    vec![
        TypeDesc::ptr(TypeDesc::F32),
        TypeDesc::ptr(TypeDesc::F32),
        TypeDesc::U32,
    ]
}

/// Resolve a registered demo kernel by name.
pub fn lookup(stack: &DemoStack, name: &str) -> Result<FunctionHandle> {
    match stack.backend.function(name) {
        Some(f) => Ok(f),
        None => bail!("unknown kernel: '{name}'. Use 'scry kernels' to list demo kernels."),
    }
}
