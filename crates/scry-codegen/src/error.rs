//! Codegen errors.

use scry_core::PipelineStage;
use thiserror::Error;

/// Errors surfaced by the backend collaborator boundary.
#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("unknown device function '{name}'")]
    UnknownFunction { name: String },

    #[error("{stage} stage failed for '{kernel}': {message}")]
    StageFailed {
        stage: PipelineStage,
        kernel: String,
        message: String,
    },

    #[error("binary artifacts are produced by the JIT capture bridge, not the backend")]
    BinaryNotCompilable,
}
