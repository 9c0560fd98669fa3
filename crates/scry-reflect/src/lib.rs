//! Device-code reflection and interception.
//!
//! Given a device function and an argument-type signature, drives a
//! compilation job through the five lowering stages (lowered → typed →
//! optimized IR → assembly → binary) and exposes each stage's artifact,
//! stripped of run-time-only noise. The hook harness additionally lets a
//! caller observe every kernel compiled while evaluating an arbitrary block
//! of code, without modifying that code.

pub mod capture;
pub mod disasm;
pub mod driver;
pub mod error;
pub mod hooks;
pub mod listing;
pub mod resolve;

pub use capture::capture_binary;
pub use disasm::{Disassembler, ExternalDisassembler, SimDisassembler};
pub use driver::{AsmOptions, BinaryOptions, Collaborators, IrOptions, Reflector};
pub use error::ReflectError;
pub use hooks::{
    dump_all, hook_assembly, hook_binary, hook_ir, hook_lowered, hook_typed, with_compile_hook,
};
pub use listing::format_listing;
pub use resolve::resolve_capability;
