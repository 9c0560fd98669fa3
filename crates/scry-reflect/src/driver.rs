//! The five stage drivers.
//!
//! One parametrized runner builds the backend call; each public driver adds
//! stage-specific job defaults, option mapping, and post-processing. The
//! `*_for` overloads construct the job first (capability per the resolver,
//! entry-point per the stage's typical use) and delegate.

use std::io::Write;
use std::sync::Arc;

use scry_codegen::{Backend, ModuleScope, StageArtifact, StageOptions, WrapperHandling};
use scry_core::{CompilationJob, FunctionHandle, PipelineStage, TypeDesc};
use scry_driver::{DriverContext, SyncTuning};
use serde::{Deserialize, Serialize};

use crate::capture::capture_binary;
use crate::disasm::Disassembler;
use crate::error::{ReflectError, Result};
use crate::listing::format_listing;
use crate::resolve::resolve_capability;

/// Options for the IR stage driver.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IrOptions {
    /// Apply optimization passes.
    pub optimize: bool,
    /// Keep metadata/debug-info annotations in the rendered output.
    pub raw: bool,
    /// Render the entire module instead of the single target function.
    pub dump_module: bool,
    /// Verify as early in the pipeline as possible.
    pub strict: bool,
}

impl Default for IrOptions {
    fn default() -> Self {
        Self {
            optimize: true,
            raw: false,
            dump_module: false,
            strict: false,
        }
    }
}

/// Options for the assembly stage driver.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AsmOptions {
    pub raw: bool,
    pub strict: bool,
}

/// Options for the binary stage driver.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BinaryOptions {
    /// Request source-line annotations from the disassembler.
    pub verbose: bool,
}

/// The external collaborators reflection drives.
#[derive(Clone)]
pub struct Collaborators {
    pub backend: Arc<dyn Backend>,
    pub driver: Arc<dyn DriverContext + Send + Sync>,
    pub disassembler: Arc<dyn Disassembler>,
}

/// Programmatic reflection surface over a set of collaborators.
#[derive(Clone)]
pub struct Reflector {
    collab: Collaborators,
    tuning: SyncTuning,
}

impl Reflector {
    pub fn new(collab: Collaborators) -> Self {
        Self {
            collab,
            tuning: SyncTuning::default(),
        }
    }

    pub fn with_tuning(mut self, tuning: SyncTuning) -> Self {
        self.tuning = tuning;
        self
    }

    pub fn backend(&self) -> &dyn Backend {
        self.collab.backend.as_ref()
    }

    pub fn driver(&self) -> &dyn DriverContext {
        self.collab.driver.as_ref()
    }

    /// Build a kernel job for `function`, resolving the capability.
    pub fn job_for(&self, function: &FunctionHandle, arg_types: &[TypeDesc]) -> CompilationJob {
        CompilationJob::kernel(
            function.clone(),
            arg_types.to_vec(),
            resolve_capability(self.driver()),
        )
    }

    fn run_stage(
        &self,
        job: &CompilationJob,
        stage: PipelineStage,
        options: &StageOptions,
    ) -> Result<StageArtifact> {
        Ok(self.collab.backend.compile(job, stage, options)?)
    }

    /// Un-type-inferred form of the job's function body. Pass-through: the
    /// only stage with no custom stripping.
    pub fn lowered(&self, job: &CompilationJob) -> Result<Vec<StageArtifact>> {
        let options = StageOptions::default().skip_wrapper();
        Ok(vec![self.run_stage(job, PipelineStage::Lowered, &options)?])
    }

    pub fn lowered_for(
        &self,
        function: &FunctionHandle,
        arg_types: &[TypeDesc],
    ) -> Result<Vec<StageArtifact>> {
        self.lowered(&self.job_for(function, arg_types))
    }

    /// Type-inferred form, with per-operation source attribution when the
    /// toolchain supports it.
    pub fn typed(&self, job: &CompilationJob) -> Result<Vec<StageArtifact>> {
        let mut options = StageOptions::default().skip_wrapper();
        options.source_attribution = self.collab.backend.supports_attribution();
        Ok(vec![self.run_stage(job, PipelineStage::Typed, &options)?])
    }

    pub fn typed_for(
        &self,
        function: &FunctionHandle,
        arg_types: &[TypeDesc],
    ) -> Result<Vec<StageArtifact>> {
        self.typed(&self.job_for(function, arg_types))
    }

    /// Render the job's IR module to `sink`.
    pub fn ir(&self, sink: &mut dyn Write, job: &CompilationJob, options: &IrOptions) -> Result<()> {
        let stage_options = StageOptions {
            optimize: options.optimize,
            strip_metadata: !options.raw,
            module_scope: if options.dump_module {
                ModuleScope::WholeModule
            } else {
                ModuleScope::SingleFunction
            },
            verify_early: options.strict,
            wrapper: WrapperHandling::Include,
            source_attribution: false,
        };
        let artifact = self.run_stage(job, PipelineStage::OptimizedIr, &stage_options)?;
        sink.write_all(artifact.text.as_bytes())?;
        Ok(())
    }

    pub fn ir_for(
        &self,
        sink: &mut dyn Write,
        function: &FunctionHandle,
        arg_types: &[TypeDesc],
        options: &IrOptions,
    ) -> Result<()> {
        self.ir(sink, &self.job_for(function, arg_types), options)
    }

    /// Render the job's target assembly to `sink`.
    pub fn assembly(
        &self,
        sink: &mut dyn Write,
        job: &CompilationJob,
        options: &AsmOptions,
    ) -> Result<()> {
        let stage_options = StageOptions {
            strip_metadata: !options.raw,
            verify_early: options.strict,
            ..StageOptions::default()
        };
        let artifact = self.run_stage(job, PipelineStage::Assembly, &stage_options)?;
        sink.write_all(artifact.text.as_bytes())?;
        Ok(())
    }

    pub fn assembly_for(
        &self,
        sink: &mut dyn Write,
        function: &FunctionHandle,
        arg_types: &[TypeDesc],
        options: &AsmOptions,
    ) -> Result<()> {
        self.assembly(sink, &self.job_for(function, arg_types), options)
    }

    /// Render a disassembled instruction listing for the job to `sink`.
    ///
    /// Only whole kernels can be materialized into a loadable binary, so a
    /// non-entry-point job fails before any compilation is attempted. The
    /// binary is captured from the one-shot module-loaded event, persisted
    /// to a transient file, disassembled, and post-processed.
    pub fn binary(
        &self,
        sink: &mut dyn Write,
        job: &CompilationJob,
        options: &BinaryOptions,
    ) -> Result<()> {
        if !job.entry_point {
            return Err(ReflectError::NotAnEntryPoint {
                kernel: job.kernel_name().to_string(),
            });
        }

        let asm = self.run_stage(job, PipelineStage::Assembly, &StageOptions::default())?;
        let image = capture_binary(self.driver(), &asm.text, &self.tuning)?;

        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(&image)?;
        file.flush()?;

        let raw_lines = self
            .collab
            .disassembler
            .disassemble(file.path(), options.verbose)?;
        for line in format_listing(&raw_lines) {
            writeln!(sink, "{line}")?;
        }
        Ok(())
    }

    pub fn binary_for(
        &self,
        sink: &mut dyn Write,
        function: &FunctionHandle,
        arg_types: &[TypeDesc],
        options: &BinaryOptions,
    ) -> Result<()> {
        self.binary(sink, &self.job_for(function, arg_types), options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scry_codegen::SimBackend;
    use scry_core::Capability;
    use scry_driver::SimDriver;

    use crate::disasm::SimDisassembler;

    fn reflector(attached: bool) -> (Reflector, FunctionHandle) {
        let backend = Arc::new(SimBackend::new());
        let f = backend.register("vadd", &["c = a + b"]);
        let driver: Arc<dyn DriverContext + Send + Sync> = if attached {
            Arc::new(SimDriver::attached(Capability::of(8, 6)))
        } else {
            Arc::new(SimDriver::detached())
        };
        let collab = Collaborators {
            backend,
            driver,
            disassembler: Arc::new(SimDisassembler),
        };
        (Reflector::new(collab), f)
    }

    fn arg_types() -> Vec<TypeDesc> {
        vec![
            TypeDesc::ptr(TypeDesc::F32),
            TypeDesc::ptr(TypeDesc::F32),
            TypeDesc::U32,
        ]
    }

    #[test]
    fn job_capability_follows_bound_device() {
        let (r, f) = reflector(true);
        assert_eq!(r.job_for(&f, &arg_types()).capability, Capability::of(8, 6));

        let (r, f) = reflector(false);
        assert_eq!(
            r.job_for(&f, &arg_types()).capability,
            Capability::max_supported()
        );
    }

    #[test]
    fn every_stage_yields_a_nonempty_artifact() {
        let (r, f) = reflector(true);
        let job = r.job_for(&f, &arg_types());

        let lowered = r.lowered(&job).unwrap();
        assert!(lowered.iter().all(|a| !a.is_empty()));

        let typed = r.typed(&job).unwrap();
        assert!(typed.iter().all(|a| !a.is_empty()));
        assert!(typed[0].text.contains("@ vadd.src:1"));

        let mut ir = Vec::new();
        r.ir(&mut ir, &job, &IrOptions::default()).unwrap();
        assert!(!ir.is_empty());

        let mut asm = Vec::new();
        r.assembly(&mut asm, &job, &AsmOptions::default()).unwrap();
        let asm = String::from_utf8(asm).unwrap();
        assert!(asm.contains(".visible .entry vadd("));

        let mut listing = Vec::new();
        r.binary(&mut listing, &job, &BinaryOptions::default())
            .unwrap();
        let listing = String::from_utf8(listing).unwrap();
        assert!(listing.contains("FADD R2, R2, R3 ;"));
    }

    #[test]
    fn clean_ir_is_a_strict_subset_of_raw() {
        let (r, f) = reflector(true);
        let job = r.job_for(&f, &arg_types());

        let mut clean = Vec::new();
        r.ir(&mut clean, &job, &IrOptions::default()).unwrap();
        let clean = String::from_utf8(clean).unwrap();

        let mut raw = Vec::new();
        let raw_opts = IrOptions {
            raw: true,
            ..Default::default()
        };
        r.ir(&mut raw, &job, &raw_opts).unwrap();
        let raw = String::from_utf8(raw).unwrap();

        assert!(raw.contains("!dbg"));
        assert!(!clean.contains("!dbg"));
    }

    #[test]
    fn whole_module_option_reaches_backend() {
        let (r, f) = reflector(true);
        let job = r.job_for(&f, &arg_types());
        let mut out = Vec::new();
        let opts = IrOptions {
            dump_module: true,
            ..Default::default()
        };
        r.ir(&mut out, &job, &opts).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("; ModuleID"));
    }

    #[test]
    fn binary_rejects_device_functions_before_compiling() {
        let (r, _) = reflector(true);
        // Unregistered function: a compile attempt would fail differently.
        let job = CompilationJob::device_function(
            FunctionHandle::new("helper"),
            vec![],
            Capability::of(8, 6),
        );
        let mut out = Vec::new();
        let err = r.binary(&mut out, &job, &BinaryOptions::default()).unwrap_err();
        assert!(matches!(err, ReflectError::NotAnEntryPoint { .. }));
        assert!(out.is_empty());
    }

    #[test]
    fn binary_listing_is_post_processed() {
        let (r, f) = reflector(true);
        let job = r.job_for(&f, &arg_types());
        let mut out = Vec::new();
        r.binary(&mut out, &job, &BinaryOptions::default()).unwrap();
        let listing = String::from_utf8(out).unwrap();
        assert!(!listing.contains("/*"));
        assert!(listing.contains("// Location vadd.src:1"));
        assert!(listing.contains("\n\n.L_1:"));
    }

    #[test]
    fn binary_without_device_propagates_driver_failure() {
        let (r, f) = reflector(false);
        let job = r.job_for(&f, &arg_types());
        let mut out = Vec::new();
        assert!(matches!(
            r.binary(&mut out, &job, &BinaryOptions::default()),
            Err(ReflectError::Driver(_))
        ));
    }
}
