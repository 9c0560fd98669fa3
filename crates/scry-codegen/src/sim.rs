//! Deterministic simulated backend.
//!
//! Device functions are registered with a tiny statement-list body; the
//! backend lowers that body into stable per-stage artifact text so every
//! option toggle (stripping, module scope, wrapper handling, attribution,
//! early verification) is observable without a real compiler.

use std::collections::HashMap;
use std::sync::Mutex;

use scry_core::{function, CompilationJob, FunctionHandle, PipelineStage, TypeDesc};
use uuid::Uuid;

use crate::backend::{Backend, StageArtifact};
use crate::cache::CompileCache;
use crate::error::CodegenError;
use crate::options::{ModuleScope, StageOptions, WrapperHandling};

struct KernelSource {
    handle: FunctionHandle,
    body: Vec<String>,
}

/// In-process backend over registered demo kernels.
#[derive(Default)]
pub struct SimBackend {
    kernels: Mutex<HashMap<Uuid, KernelSource>>,
    cache: CompileCache,
}

impl SimBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend preloaded with the demo kernels `vadd` and `saxpy`.
    pub fn demo() -> Self {
        let backend = Self::new();
        backend.register("vadd", &["c = a + b"]);
        backend.register("saxpy", &["t = a * x", "y = t + b"]);
        backend
    }

    /// Register a device function with the given statement body.
    pub fn register(&self, name: &str, body: &[&str]) -> FunctionHandle {
        let handle = FunctionHandle::new(name);
        let source = KernelSource {
            handle: handle.clone(),
            body: body.iter().map(|s| s.to_string()).collect(),
        };
        self.lock().insert(handle.id(), source);
        handle
    }

    /// All registered functions, sorted by name.
    pub fn functions(&self) -> Vec<FunctionHandle> {
        let mut all: Vec<FunctionHandle> =
            self.lock().values().map(|k| k.handle.clone()).collect();
        all.sort_by(|a, b| a.name().cmp(b.name()));
        all
    }

    /// Look up a registered function by name.
    pub fn function(&self, name: &str) -> Option<FunctionHandle> {
        self.lock()
            .values()
            .find(|k| k.handle.name() == name)
            .map(|k| k.handle.clone())
    }

    /// Simulate a kernel launch: compile the assembly specialization through
    /// the cache (which notifies the compile hook on a miss).
    pub fn launch(
        &self,
        function: &FunctionHandle,
        arg_types: &[TypeDesc],
        capability: scry_core::Capability,
    ) -> Result<StageArtifact, CodegenError> {
        let job = CompilationJob::kernel(function.clone(), arg_types.to_vec(), capability);
        self.cache
            .compile_through(self, &job, PipelineStage::Assembly, &StageOptions::default())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, KernelSource>> {
        self.kernels.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn body_of(&self, job: &CompilationJob) -> Result<Vec<String>, CodegenError> {
        self.lock()
            .get(&job.function.id())
            .map(|k| k.body.clone())
            .ok_or_else(|| CodegenError::UnknownFunction {
                name: job.function.name().to_string(),
            })
    }

    fn verify(
        job: &CompilationJob,
        stage: PipelineStage,
        body: &[String],
        early: bool,
    ) -> Result<(), CodegenError> {
        if body.is_empty() {
            let message = if early {
                "rejected during early verification: function body is empty".to_string()
            } else {
                "module verification failed: function body is empty".to_string()
            };
            return Err(CodegenError::StageFailed {
                stage,
                kernel: job.kernel_name().to_string(),
                message,
            });
        }
        Ok(())
    }
}

/// Mnemonics a body statement lowers to, as (LLVM op, assembly op).
fn stmt_mnemonics(stmt: &str) -> (&'static str, &'static str) {
    if stmt.contains('*') {
        ("fmul float", "mul.f32")
    } else if stmt.contains('+') {
        ("fadd float", "add.f32")
    } else if stmt.contains('-') {
        ("fsub float", "sub.f32")
    } else {
        ("fadd float", "mov.f32")
    }
}

fn param_type(ty: &TypeDesc) -> &'static str {
    match ty {
        TypeDesc::Ptr(_) | TypeDesc::I64 | TypeDesc::U64 | TypeDesc::Named(_) => ".u64",
        TypeDesc::I32 | TypeDesc::U32 => ".u32",
        TypeDesc::I16 | TypeDesc::U16 => ".u16",
        TypeDesc::I8 | TypeDesc::U8 => ".u8",
        TypeDesc::F16 => ".f16",
        TypeDesc::F32 => ".f32",
        TypeDesc::F64 => ".f64",
        TypeDesc::Bool => ".pred",
    }
}

fn llvm_type(ty: &TypeDesc) -> &'static str {
    match ty {
        TypeDesc::Ptr(_) | TypeDesc::Named(_) => "ptr",
        TypeDesc::I64 | TypeDesc::U64 => "i64",
        TypeDesc::I32 | TypeDesc::U32 => "i32",
        TypeDesc::I16 | TypeDesc::U16 => "i16",
        TypeDesc::I8 | TypeDesc::U8 => "i8",
        TypeDesc::F16 => "half",
        TypeDesc::F32 => "float",
        TypeDesc::F64 => "double",
        TypeDesc::Bool => "i1",
    }
}

fn render_lowered(job: &CompilationJob, body: &[String]) -> String {
    let mut out = format!(
        "lowered {}{} {{\n",
        job.kernel_name(),
        function::signature(&job.arg_types)
    );
    out.push_str("  %0 = builtin.thread_index()\n");
    for (i, stmt) in body.iter().enumerate() {
        out.push_str(&format!("  %{} = {stmt}\n", i + 1));
    }
    out.push_str("  return\n}\n");
    out
}

fn render_typed(job: &CompilationJob, body: &[String], attribute: bool) -> String {
    let name = job.kernel_name();
    let mut out = format!("typed {}{} {{\n", name, function::signature(&job.arg_types));
    out.push_str("  %0 = builtin.thread_index() :: u32\n");
    for (i, stmt) in body.iter().enumerate() {
        if attribute {
            out.push_str(&format!(
                "  %{} = {stmt} :: f32  @ {name}.src:{}\n",
                i + 1,
                i + 1
            ));
        } else {
            out.push_str(&format!("  %{} = {stmt} :: f32\n", i + 1));
        }
    }
    out.push_str("  return :: ()\n}\n");
    out
}

fn render_ir(job: &CompilationJob, body: &[String], options: &StageOptions) -> String {
    let name = job.kernel_name();
    let dbg = |n: usize| {
        if options.strip_metadata {
            String::new()
        } else {
            format!(", !dbg !{}", n + 4)
        }
    };

    let params: Vec<String> = job
        .arg_types
        .iter()
        .enumerate()
        .map(|(i, ty)| format!("{} %arg{i}", llvm_type(ty)))
        .collect();
    let conv = if job.entry_point && options.wrapper == WrapperHandling::Include {
        "ptx_kernel "
    } else {
        ""
    };

    let mut def = format!("define {conv}void @{name}({}) #0 {{\n", params.join(", "));
    def.push_str("entry:\n");
    def.push_str(&format!(
        "  %tid = call i32 @llvm.nvvm.read.ptx.sreg.tid.x(){}\n",
        dbg(0)
    ));
    if !options.optimize {
        // Pre-pass form keeps the frame slots mem2reg would remove.
        def.push_str("  %slot = alloca float, align 4\n");
        def.push_str(&format!("  store float 0.000000e+00, ptr %slot{}\n", dbg(0)));
    }
    for (i, stmt) in body.iter().enumerate() {
        let (op, _) = stmt_mnemonics(stmt);
        def.push_str(&format!(
            "  %v{} = {op} %a{}, %b{}{}\n",
            i + 1,
            i + 1,
            i + 1,
            dbg(i + 1)
        ));
    }
    if !options.optimize {
        def.push_str("  %reload = load float, ptr %slot, align 4\n");
    }
    def.push_str(&format!("  ret void{}\n}}\n", dbg(body.len() + 1)));

    if options.module_scope == ModuleScope::SingleFunction {
        return def;
    }

    let mut out = format!("; ModuleID = '{name}'\n");
    out.push_str(&format!("source_filename = \"{name}.src\"\n"));
    out.push_str("target datalayout = \"e-i64:64-i128:128-v16:16-v32:32-n16:32:64\"\n");
    out.push_str("target triple = \"nvptx64-nvidia-cuda\"\n\n");
    out.push_str(&def);
    out.push_str("\ndeclare i32 @llvm.nvvm.read.ptx.sreg.tid.x()\n");
    out.push_str(&format!(
        "\nattributes #0 = {{ \"target-cpu\"=\"{}\" }}\n",
        job.capability.target_name()
    ));
    if !options.strip_metadata {
        out.push_str("\n!llvm.dbg.cu = !{!0}\n");
        out.push_str("!0 = distinct !DICompileUnit(language: DW_LANG_C, file: !1)\n");
        out.push_str(&format!("!1 = !DIFile(filename: \"{name}.src\", directory: \"/\")\n"));
        for n in 0..=body.len() + 1 {
            out.push_str(&format!(
                "!{} = !DILocation(line: {}, column: 1, scope: !0)\n",
                n + 4,
                n + 1
            ));
        }
    }
    out
}

fn render_assembly(job: &CompilationJob, body: &[String], options: &StageOptions) -> String {
    let name = job.kernel_name();
    let mut out = String::new();
    if !options.strip_metadata {
        out.push_str("//\n// Generated by the scry simulated backend\n//\n");
        out.push_str(&format!("// .globl\t{name}\n"));
    }
    out.push_str(&format!(
        ".version 8.0\n.target {}\n.address_size 64\n\n",
        job.capability.target_name()
    ));

    let decl = if job.entry_point && options.wrapper == WrapperHandling::Include {
        format!(".visible .entry {name}(")
    } else {
        format!(".func {name}(")
    };
    out.push_str(&decl);
    out.push('\n');
    for (i, ty) in job.arg_types.iter().enumerate() {
        let sep = if i + 1 == job.arg_types.len() { "" } else { "," };
        out.push_str(&format!(
            "\t.param {} {name}_param_{i}{sep}\n",
            param_type(ty)
        ));
    }
    out.push_str(")\n{\n");
    for (i, _) in job.arg_types.iter().enumerate() {
        out.push_str(&format!(
            "\tld.param{} \t%rd{}, [{name}_param_{i}];\n",
            param_type(&job.arg_types[i]),
            i + 1
        ));
    }
    for (i, stmt) in body.iter().enumerate() {
        if !options.strip_metadata {
            out.push_str(&format!("\t// {stmt}\n"));
        }
        let (_, op) = stmt_mnemonics(stmt);
        out.push_str(&format!("\t{op} \t%f{}, %f1, %f2;\n", i + 3));
    }
    out.push_str("\tret;\n}\n");
    out
}

impl Backend for SimBackend {
    fn compile(
        &self,
        job: &CompilationJob,
        stage: PipelineStage,
        options: &StageOptions,
    ) -> Result<StageArtifact, CodegenError> {
        let body = self.body_of(job)?;
        if options.verify_early && stage >= PipelineStage::OptimizedIr {
            Self::verify(job, stage, &body, true)?;
        }

        let text = match stage {
            PipelineStage::Lowered => render_lowered(job, &body),
            PipelineStage::Typed => render_typed(job, &body, options.source_attribution),
            PipelineStage::OptimizedIr => {
                Self::verify(job, stage, &body, options.verify_early)?;
                render_ir(job, &body, options)
            }
            PipelineStage::Assembly => {
                Self::verify(job, stage, &body, options.verify_early)?;
                render_assembly(job, &body, options)
            }
            PipelineStage::Binary => return Err(CodegenError::BinaryNotCompilable),
        };

        Ok(StageArtifact {
            stage,
            kernel: job.kernel_name().to_string(),
            text,
        })
    }

    fn supports_attribution(&self) -> bool {
        true
    }

    fn cache(&self) -> &CompileCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scry_core::Capability;

    fn job(backend: &SimBackend) -> CompilationJob {
        let f = backend.register("vadd", &["c = a + b"]);
        CompilationJob::kernel(
            f,
            vec![
                TypeDesc::ptr(TypeDesc::F32),
                TypeDesc::ptr(TypeDesc::F32),
                TypeDesc::U32,
            ],
            Capability::of(8, 6),
        )
    }

    #[test]
    fn lowered_and_typed_render_body() {
        let backend = SimBackend::new();
        let job = job(&backend);
        let opts = StageOptions::default();

        let lowered = backend
            .compile(&job, PipelineStage::Lowered, &opts)
            .unwrap();
        assert!(lowered.text.contains("lowered vadd(*f32, *f32, u32)"));
        assert!(lowered.text.contains("c = a + b"));

        let typed = backend.compile(&job, PipelineStage::Typed, &opts).unwrap();
        assert!(typed.text.contains(":: f32"));
        assert!(!typed.text.contains("@ vadd.src:1"));

        let mut attributed = opts;
        attributed.source_attribution = true;
        let typed = backend
            .compile(&job, PipelineStage::Typed, &attributed)
            .unwrap();
        assert!(typed.text.contains("@ vadd.src:1"));
    }

    #[test]
    fn stripped_ir_has_no_debug_metadata() {
        let backend = SimBackend::new();
        let job = job(&backend);

        let clean = backend
            .compile(&job, PipelineStage::OptimizedIr, &StageOptions::default())
            .unwrap();
        assert!(!clean.text.contains("!dbg"));

        let raw = backend
            .compile(&job, PipelineStage::OptimizedIr, &StageOptions::default().raw())
            .unwrap();
        assert!(raw.text.contains("!dbg"));
    }

    #[test]
    fn whole_module_scope_adds_module_frame() {
        let backend = SimBackend::new();
        let job = job(&backend);

        let single = backend
            .compile(&job, PipelineStage::OptimizedIr, &StageOptions::default())
            .unwrap();
        assert!(!single.text.contains("; ModuleID"));

        let module = backend
            .compile(
                &job,
                PipelineStage::OptimizedIr,
                &StageOptions::default().whole_module().raw(),
            )
            .unwrap();
        assert!(module.text.contains("; ModuleID = 'vadd'"));
        assert!(module.text.contains("target triple = \"nvptx64-nvidia-cuda\""));
        assert!(module.text.contains("!DILocation"));
    }

    #[test]
    fn unoptimized_ir_keeps_frame_slots() {
        let backend = SimBackend::new();
        let job = job(&backend);
        let ir = backend
            .compile(
                &job,
                PipelineStage::OptimizedIr,
                &StageOptions::default().unoptimized(),
            )
            .unwrap();
        assert!(ir.text.contains("alloca"));
    }

    #[test]
    fn assembly_entry_vs_device_function() {
        let backend = SimBackend::new();
        let kernel = job(&backend);
        let device = CompilationJob {
            entry_point: false,
            ..kernel.clone()
        };
        let opts = StageOptions::default();

        let asm = backend
            .compile(&kernel, PipelineStage::Assembly, &opts)
            .unwrap();
        assert!(asm.text.contains(".visible .entry vadd("));
        assert!(asm.text.contains(".target sm_86"));

        let asm = backend
            .compile(&device, PipelineStage::Assembly, &opts)
            .unwrap();
        assert!(asm.text.contains(".func vadd("));
        assert!(!asm.text.contains(".entry"));
    }

    #[test]
    fn raw_assembly_keeps_comments() {
        let backend = SimBackend::new();
        let job = job(&backend);
        let stripped = backend
            .compile(&job, PipelineStage::Assembly, &StageOptions::default())
            .unwrap();
        assert!(!stripped.text.contains("//"));
        let raw = backend
            .compile(&job, PipelineStage::Assembly, &StageOptions::default().raw())
            .unwrap();
        assert!(raw.text.contains("// c = a + b"));
    }

    #[test]
    fn empty_body_fails_verification() {
        let backend = SimBackend::new();
        let f = backend.register("hollow", &[]);
        let job = CompilationJob::kernel(f, vec![], Capability::of(8, 0));

        let late = backend
            .compile(&job, PipelineStage::Assembly, &StageOptions::default())
            .unwrap_err();
        assert!(late.to_string().contains("module verification failed"));

        let mut early_opts = StageOptions::default();
        early_opts.verify_early = true;
        let early = backend
            .compile(&job, PipelineStage::Assembly, &early_opts)
            .unwrap_err();
        assert!(early.to_string().contains("early verification"));
    }

    #[test]
    fn binary_stage_is_not_compilable() {
        let backend = SimBackend::new();
        let job = job(&backend);
        assert!(matches!(
            backend.compile(&job, PipelineStage::Binary, &StageOptions::default()),
            Err(CodegenError::BinaryNotCompilable)
        ));
    }

    #[test]
    fn unknown_function_is_reported() {
        let backend = SimBackend::new();
        let stray = CompilationJob::kernel(
            scry_core::FunctionHandle::new("ghost"),
            vec![],
            Capability::of(8, 0),
        );
        assert!(matches!(
            backend.compile(&stray, PipelineStage::Lowered, &StageOptions::default()),
            Err(CodegenError::UnknownFunction { .. })
        ));
    }

    #[test]
    fn display_name_override_flows_into_artifacts() {
        let backend = SimBackend::new();
        let named = job(&backend).with_name("fused_vadd");
        let asm = backend
            .compile(&named, PipelineStage::Assembly, &StageOptions::default())
            .unwrap();
        assert_eq!(asm.kernel, "fused_vadd");
        assert!(asm.text.contains(".visible .entry fused_vadd("));
    }
}
