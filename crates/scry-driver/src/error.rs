//! Driver errors.

use thiserror::Error;

/// Errors surfaced by the driver/JIT collaborator boundary.
///
/// Foreign failures are propagated verbatim to the caller and never retried;
/// within one reflection call they are assumed non-transient.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("no hardware context is active")]
    NoContext,

    #[error("JIT loading failed: {message}")]
    JitLoadFailed { message: String },

    #[error("event subscription failed: {message}")]
    SubscriptionFailed { message: String },

    #[error("unknown event subscription {0}")]
    UnknownSubscription(u64),

    #[error("device synchronization timed out after {waited_ms} ms")]
    SyncTimedOut { waited_ms: u64 },
}
