//! Content-addressed compile cache with hook dispatch.
//!
//! The launch path compiles through this cache; a miss performs the real
//! compilation and notifies the process-wide compile hook, so every kernel
//! touched after [`CompileCache::invalidate_all`] triggers the hook exactly
//! once per distinct job.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use scry_core::{hooks, CompilationJob, PipelineStage};
use sha2::{Digest, Sha256};

use crate::backend::{Backend, StageArtifact};
use crate::error::CodegenError;
use crate::options::StageOptions;

/// Statistics about cache usage.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub entries: usize,
}

/// Memoized compiled output keyed by (job, stage, options) content hash.
#[derive(Default)]
pub struct CompileCache {
    entries: Mutex<HashMap<String, StageArtifact>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl CompileCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, StageArtifact>> {
        self.entries.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Compile through the cache; on a miss, compile via `backend` and
    /// notify the active compile hook.
    pub fn compile_through(
        &self,
        backend: &dyn Backend,
        job: &CompilationJob,
        stage: PipelineStage,
        options: &StageOptions,
    ) -> Result<StageArtifact, CodegenError> {
        let key = cache_key(job, stage, options);
        if let Some(hit) = self.entries().get(&key).cloned() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(hit);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let artifact = backend.compile(job, stage, options)?;
        hooks::notify(job);
        self.entries().insert(key, artifact.clone());
        Ok(artifact)
    }

    /// Drop every memoized artifact, forcing full recompilation.
    pub fn invalidate_all(&self) {
        self.entries().clear();
    }

    pub fn statistics(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries().len(),
        }
    }
}

/// Content hash over the job's equality-relevant fields, the stage, and the
/// option fingerprint.
pub fn cache_key(job: &CompilationJob, stage: PipelineStage, options: &StageOptions) -> String {
    let mut hasher = Sha256::new();
    hasher.update(job.content_key().as_bytes());
    hasher.update(stage.name().as_bytes());
    hasher.update(format!("{options:?}").as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimBackend;
    use scry_core::{Capability, CompilationJob, TypeDesc};

    fn backend_and_job() -> (SimBackend, CompilationJob) {
        let backend = SimBackend::new();
        let f = backend.register("scale", &["y = x * s"]);
        let job = CompilationJob::kernel(
            f,
            vec![TypeDesc::ptr(TypeDesc::F32), TypeDesc::F32],
            Capability::of(8, 0),
        );
        (backend, job)
    }

    #[test]
    fn second_compile_hits() {
        let (backend, job) = backend_and_job();
        let opts = StageOptions::default();
        let a = backend
            .cache()
            .compile_through(&backend, &job, PipelineStage::Assembly, &opts)
            .unwrap();
        let b = backend
            .cache()
            .compile_through(&backend, &job, PipelineStage::Assembly, &opts)
            .unwrap();
        assert_eq!(a, b);

        let stats = backend.cache().statistics();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn invalidation_forces_recompile() {
        let (backend, job) = backend_and_job();
        let opts = StageOptions::default();
        backend
            .cache()
            .compile_through(&backend, &job, PipelineStage::Assembly, &opts)
            .unwrap();
        backend.cache().invalidate_all();
        backend
            .cache()
            .compile_through(&backend, &job, PipelineStage::Assembly, &opts)
            .unwrap();
        assert_eq!(backend.cache().statistics().misses, 2);
    }

    #[test]
    fn key_separates_stage_and_options() {
        let (_, job) = backend_and_job();
        let opts = StageOptions::default();
        let a = cache_key(&job, PipelineStage::Assembly, &opts);
        let b = cache_key(&job, PipelineStage::OptimizedIr, &opts);
        let c = cache_key(&job, PipelineStage::Assembly, &opts.clone().raw());
        assert_ne!(a, b);
        assert_ne!(a, c);
    }
}
