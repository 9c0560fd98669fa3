//! `scry lowered|typed|ir|asm|binary|kernels` — single-kernel reflection.

use std::io::{self, Write};

use anyhow::Result;

use scry_reflect::{AsmOptions, BinaryOptions, IrOptions};

use crate::commands::{demo_args, lookup, DemoStack};

pub fn lowered(stack: &DemoStack, kernel: &str) -> Result<()> {
    let function = lookup(stack, kernel)?;
    for artifact in stack.reflector.lowered_for(&function, &demo_args())? {
        print!("{}", artifact.text);
    }
    Ok(())
}

pub fn typed(stack: &DemoStack, kernel: &str) -> Result<()> {
    let function = lookup(stack, kernel)?;
    for artifact in stack.reflector.typed_for(&function, &demo_args())? {
        print!("{}", artifact.text);
    }
    Ok(())
}

pub fn ir(
    stack: &DemoStack,
    kernel: &str,
    raw: bool,
    module: bool,
    unoptimized: bool,
    strict: bool,
) -> Result<()> {
    let function = lookup(stack, kernel)?;
    let options = IrOptions {
        optimize: !unoptimized,
        raw,
        dump_module: module,
        strict,
    };
    let mut stdout = io::stdout().lock();
    stack
        .reflector
        .ir_for(&mut stdout, &function, &demo_args(), &options)?;
    stdout.flush()?;
    Ok(())
}

pub fn asm(stack: &DemoStack, kernel: &str, raw: bool, strict: bool) -> Result<()> {
    let function = lookup(stack, kernel)?;
    let options = AsmOptions { raw, strict };
    let mut stdout = io::stdout().lock();
    stack
        .reflector
        .assembly_for(&mut stdout, &function, &demo_args(), &options)?;
    stdout.flush()?;
    Ok(())
}

pub fn binary(stack: &DemoStack, kernel: &str, verbose: bool) -> Result<()> {
    let function = lookup(stack, kernel)?;
    let options = BinaryOptions { verbose };
    let mut stdout = io::stdout().lock();
    stack
        .reflector
        .binary_for(&mut stdout, &function, &demo_args(), &options)?;
    stdout.flush()?;
    Ok(())
}

pub fn kernels(stack: &DemoStack) -> Result<()> {
    println!("Registered demo kernels:");
    println!();
    for function in stack.backend.functions() {
        println!("  {}", function.name());
    }
    Ok(())
}
