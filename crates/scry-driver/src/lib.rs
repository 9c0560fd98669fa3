//! Hardware/driver collaborator boundary for Scry.
//!
//! Everything here is specified at the interface: a [`DriverContext`] answers
//! "is a context active", "what is the bound device's capability", and "JIT
//! this assembly into a loadable module"; the [`JitEvents`] subsystem delivers
//! the one-shot module-loaded event the binary-capture bridge relies on. A
//! simulated in-process driver backs tests and the CLI demo.

pub mod context;
pub mod error;
pub mod events;
pub mod sim;
pub mod sync;

pub use context::DriverContext;
pub use error::DriverError;
pub use events::{EventHandler, EventSubscription, JitEvents, ResourceEvent, SubscriptionId};
pub use sim::SimDriver;
pub use sync::SyncTuning;
