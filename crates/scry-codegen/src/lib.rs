//! Backend codegen collaborator boundary for Scry.
//!
//! The actual code generation is an external concern; this crate fixes its
//! interface: [`Backend::compile`] is polymorphic over the pipeline stage and
//! honors the stage options (metadata stripping, module scope, early
//! verification, wrapper handling). The [`CompileCache`] memoizes compiled
//! output and dispatches the process-wide compile hook once per distinct
//! compilation. A deterministic simulated backend exercises the whole
//! surface without a real compiler.

pub mod backend;
pub mod cache;
pub mod error;
pub mod options;
pub mod sim;

pub use backend::{Backend, StageArtifact};
pub use cache::{CacheStats, CompileCache};
pub use error::CodegenError;
pub use options::{ModuleScope, StageOptions, WrapperHandling};
pub use sim::SimBackend;
