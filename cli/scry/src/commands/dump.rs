//! `scry dump` — launch every demo kernel and dump all stages per kernel.

use anyhow::Result;

use scry_reflect::dump_all;

use crate::commands::{demo_args, DemoStack};

pub fn run(stack: &DemoStack, dir: &str) -> Result<()> {
    let capability = stack.reflector.driver().device_capability().unwrap_or_else(
        scry_core::Capability::max_supported,
    );
    let backend = &stack.backend;
    let kernels = backend.functions();

    dump_all(&stack.reflector, dir, || {
        for function in &kernels {
            if let Err(e) = backend.launch(function, &demo_args(), capability) {
                eprintln!("warning: launch of '{}' failed: {e}", function.name());
            }
        }
    })?;

    println!("dumped {} kernel(s) to {dir}", kernels.len());
    Ok(())
}
