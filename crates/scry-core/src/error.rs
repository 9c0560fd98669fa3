//! Core errors.

use thiserror::Error;

/// Errors raised by the core data model.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("a compile hook is already installed; nested hooks are unsupported")]
    HookAlreadyInstalled,

    #[error("invalid capability '{input}': expected 'major.minor' or 'major.minor.revision'")]
    InvalidCapability { input: String },
}
