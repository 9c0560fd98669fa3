//! The backend compile trait and its artifact type.

use scry_core::{CompilationJob, PipelineStage};
use serde::{Deserialize, Serialize};

use crate::cache::CompileCache;
use crate::error::CodegenError;
use crate::options::StageOptions;

/// Rendered output of one pipeline stage for one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageArtifact {
    pub stage: PipelineStage,
    /// Name the artifact is rendered under (job display name wins).
    pub kernel: String,
    pub text: String,
}

impl StageArtifact {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Number of non-blank lines.
    pub fn line_count(&self) -> usize {
        self.text.lines().filter(|l| !l.trim().is_empty()).count()
    }
}

/// The code-generation service, polymorphic over the pipeline stage.
///
/// `compile` must honor every [`StageOptions`] toggle: metadata stripping
/// (render-time only), whole-module vs single-function scope, early
/// verification, and wrapper handling. [`PipelineStage::Binary`] is never
/// requested from the backend; binaries are captured from the JIT loader.
pub trait Backend: Send + Sync {
    fn compile(
        &self,
        job: &CompilationJob,
        stage: PipelineStage,
        options: &StageOptions,
    ) -> Result<StageArtifact, CodegenError>;

    /// Whether the toolchain can attribute typed operations to source
    /// locations.
    fn supports_attribution(&self) -> bool {
        false
    }

    /// The memoized compiled-code cache backing this backend's launch path.
    fn cache(&self) -> &CompileCache;
}
