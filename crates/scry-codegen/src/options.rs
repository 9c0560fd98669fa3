//! Stage-specific compilation options.

use serde::{Deserialize, Serialize};

/// Whether the kernel entry-point wrapper participates in the artifact.
///
/// Decided once at job construction per stage, never via ambient dispatch:
/// host-level forms (lowered, typed) skip the wrapper, machine-level forms
/// (IR, assembly, binary) include it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WrapperHandling {
    Include,
    Skip,
}

/// Render the single target function or the entire module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleScope {
    SingleFunction,
    WholeModule,
}

/// Options threaded through [`crate::Backend::compile`].
///
/// `strip_metadata` applies during rendering only, never during compilation;
/// the compiled artifact itself is never altered by an inspection request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageOptions {
    /// Apply optimization passes to the IR stage.
    pub optimize: bool,
    /// Strip metadata/debug-info annotations while rendering.
    pub strip_metadata: bool,
    pub module_scope: ModuleScope,
    /// Run internal consistency verification as early as possible instead of
    /// only at the end, trading latency for localized failure reports.
    pub verify_early: bool,
    pub wrapper: WrapperHandling,
    /// Attribute each typed operation back to a source location.
    pub source_attribution: bool,
}

impl Default for StageOptions {
    fn default() -> Self {
        Self {
            optimize: true,
            strip_metadata: true,
            module_scope: ModuleScope::SingleFunction,
            verify_early: false,
            wrapper: WrapperHandling::Include,
            source_attribution: false,
        }
    }
}

impl StageOptions {
    pub fn raw(mut self) -> Self {
        self.strip_metadata = false;
        self
    }

    pub fn whole_module(mut self) -> Self {
        self.module_scope = ModuleScope::WholeModule;
        self
    }

    pub fn unoptimized(mut self) -> Self {
        self.optimize = false;
        self
    }

    pub fn skip_wrapper(mut self) -> Self {
        self.wrapper = WrapperHandling::Skip;
        self
    }
}
