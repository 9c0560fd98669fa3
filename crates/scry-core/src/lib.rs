//! Core data model for the Scry device-code reflection toolkit.
//!
//! Defines the compilation-job descriptor, the hardware capability model,
//! the fixed five-stage pipeline, and the process-wide compile-hook registry
//! that the backend notifies once per distinct kernel compilation.

pub mod capability;
pub mod error;
pub mod function;
pub mod hooks;
pub mod job;
pub mod stage;

pub use capability::{Capability, SUPPORTED_CAPABILITIES};
pub use error::CoreError;
pub use function::{FunctionHandle, TypeDesc};
pub use hooks::HookGuard;
pub use job::CompilationJob;
pub use stage::PipelineStage;
