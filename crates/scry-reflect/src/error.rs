//! Reflection errors.
//!
//! Configuration errors and nesting conflicts are reported immediately;
//! empty-result errors only after the full evaluation completes; foreign
//! failures are propagated verbatim and never retried.

use scry_codegen::CodegenError;
use scry_driver::DriverError;
use thiserror::Error;

/// Convenience alias for results within the reflect crate.
pub type Result<T> = std::result::Result<T, ReflectError>;

/// Errors that can occur while driving reflection.
#[derive(Debug, Error)]
pub enum ReflectError {
    #[error("binary reflection requires a kernel entry point; '{kernel}' is a device function")]
    NotAnEntryPoint { kernel: String },

    #[error("a compile hook is already active; nested hook evaluation is unsupported")]
    HookActive,

    #[error("no kernels were executed while evaluating the block")]
    NoKernelsExecuted,

    #[error("no kernel was compiled during JIT loading; nothing to capture")]
    NoKernelCompiled,

    #[error("disassembler failed: {message}")]
    Disassembler { message: String },

    #[error(transparent)]
    Codegen(#[from] CodegenError),

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
