//! The hook-emission harness.
//!
//! `with_compile_hook` evaluates an arbitrary block of code while every
//! kernel compilation triggers a caller-supplied callback: the compile cache
//! is invalidated first so previously cached kernels recompile and trigger
//! too, the single hook slot is acquired with a conflict check before the
//! block runs, and the caller learns about a no-op block instead of silently
//! getting empty results. The stage specializations plug the corresponding
//! stage driver in as the callback.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use scry_codegen::{Backend, StageArtifact};
use scry_core::{hooks as registry, CompilationJob};
use serde::Serialize;

use crate::driver::{AsmOptions, BinaryOptions, IrOptions, Reflector};
use crate::error::{ReflectError, Result};

/// Evaluate `block` while `hook` observes every kernel compiled.
///
/// Returns the block's value. Fails with [`ReflectError::HookActive`] before
/// evaluating the block when a hook is already installed, and with
/// [`ReflectError::NoKernelsExecuted`] when the whole evaluation triggered
/// no compilation.
pub fn with_compile_hook<R>(
    backend: &dyn Backend,
    hook: impl Fn(&CompilationJob) + Send + 'static,
    block: impl FnOnce() -> R,
) -> Result<R> {
    backend.cache().invalidate_all();

    let counter = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&counter);
    let guard = registry::install(Box::new(move |job| {
        seen.fetch_add(1, Ordering::SeqCst);
        hook(job);
    }))
    .map_err(|_| ReflectError::HookActive)?;

    let result = block();
    drop(guard);

    if counter.load(Ordering::SeqCst) == 0 {
        return Err(ReflectError::NoKernelsExecuted);
    }
    Ok(result)
}

/// First error recorded inside a hook callback, surfaced after evaluation.
#[derive(Clone, Default)]
struct ErrorSlot(Arc<Mutex<Option<ReflectError>>>);

impl ErrorSlot {
    fn record(&self, err: ReflectError) {
        let mut slot = self.0.lock().unwrap_or_else(|p| p.into_inner());
        if slot.is_none() {
            *slot = Some(err);
        }
    }

    fn surface(&self) -> Result<()> {
        match self.0.lock().unwrap_or_else(|p| p.into_inner()).take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn collect_artifacts<R>(
    reflector: &Reflector,
    run: impl Fn(&Reflector, &CompilationJob) -> Result<Vec<StageArtifact>> + Send + 'static,
    block: impl FnOnce() -> R,
) -> Result<Vec<StageArtifact>> {
    let results: Arc<Mutex<Vec<StageArtifact>>> = Arc::default();
    let errors = ErrorSlot::default();

    let sink = Arc::clone(&results);
    let slot = errors.clone();
    let r = reflector.clone();
    with_compile_hook(
        reflector.backend(),
        move |job| match run(&r, job) {
            Ok(mut artifacts) => sink
                .lock()
                .unwrap_or_else(|p| p.into_inner())
                .append(&mut artifacts),
            Err(err) => slot.record(err),
        },
        block,
    )?;

    errors.surface()?;
    let collected = std::mem::take(&mut *results.lock().unwrap_or_else(|p| p.into_inner()));
    Ok(collected)
}

/// Collect the lowered form of every kernel compiled while `block` runs,
/// in compilation order.
pub fn hook_lowered<R>(
    reflector: &Reflector,
    block: impl FnOnce() -> R,
) -> Result<Vec<StageArtifact>> {
    collect_artifacts(reflector, |r, job| r.lowered(job), block)
}

/// Collect the typed form of every kernel compiled while `block` runs.
pub fn hook_typed<R>(
    reflector: &Reflector,
    block: impl FnOnce() -> R,
) -> Result<Vec<StageArtifact>> {
    collect_artifacts(reflector, |r, job| r.typed(job), block)
}

fn stream_stage<R>(
    reflector: &Reflector,
    sink: &mut dyn Write,
    render: impl Fn(&Reflector, &mut dyn Write, &CompilationJob) -> Result<()> + Send + 'static,
    block: impl FnOnce() -> R,
) -> Result<()> {
    let buffer: Arc<Mutex<Vec<u8>>> = Arc::default();
    let errors = ErrorSlot::default();

    let buf = Arc::clone(&buffer);
    let slot = errors.clone();
    let r = reflector.clone();
    with_compile_hook(
        reflector.backend(),
        move |job| {
            let mut out = buf.lock().unwrap_or_else(|p| p.into_inner());
            if let Err(err) = render(&r, &mut *out, job) {
                slot.record(err);
            }
        },
        block,
    )?;

    errors.surface()?;
    sink.write_all(&buffer.lock().unwrap_or_else(|p| p.into_inner()))?;
    Ok(())
}

/// Stream the IR of every kernel compiled while `block` runs to `sink`.
pub fn hook_ir<R>(
    reflector: &Reflector,
    sink: &mut dyn Write,
    options: IrOptions,
    block: impl FnOnce() -> R,
) -> Result<()> {
    stream_stage(
        reflector,
        sink,
        move |r, out, job| {
            writeln!(out, "; {}", job.specialization())?;
            r.ir(&mut *out, job, &options)?;
            writeln!(out)?;
            Ok(())
        },
        block,
    )
}

/// Stream the assembly of every kernel compiled while `block` runs to `sink`.
pub fn hook_assembly<R>(
    reflector: &Reflector,
    sink: &mut dyn Write,
    options: AsmOptions,
    block: impl FnOnce() -> R,
) -> Result<()> {
    stream_stage(
        reflector,
        sink,
        move |r, out, job| {
            writeln!(out, "// {}", job.specialization())?;
            r.assembly(&mut *out, job, &options)?;
            writeln!(out)?;
            Ok(())
        },
        block,
    )
}

/// Stream the disassembled binary of every kernel compiled while `block`
/// runs to `sink`.
pub fn hook_binary<R>(
    reflector: &Reflector,
    sink: &mut dyn Write,
    options: BinaryOptions,
    block: impl FnOnce() -> R,
) -> Result<()> {
    stream_stage(
        reflector,
        sink,
        move |r, out, job| {
            writeln!(out, "// {}", job.specialization())?;
            r.binary(&mut *out, job, &options)?;
            writeln!(out)?;
            Ok(())
        },
        block,
    )
}

#[derive(Debug, Serialize)]
struct ManifestEntry {
    kernel: String,
    ordinal: u32,
    files: Vec<String>,
}

fn write_dump(
    dir: &Path,
    prefix: &str,
    ext: &str,
    bytes: &[u8],
    files: &mut Vec<String>,
) -> Result<()> {
    let file_name = format!("{prefix}.{ext}");
    std::fs::write(dir.join(&file_name), bytes)?;
    files.push(file_name);
    Ok(())
}

fn join_artifacts(artifacts: &[StageArtifact]) -> String {
    artifacts
        .iter()
        .map(|a| a.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

fn dump_job(
    reflector: &Reflector,
    dir: &Path,
    ordinals: &Mutex<HashMap<String, u32>>,
    manifest: &Mutex<Vec<ManifestEntry>>,
    job: &CompilationJob,
) -> Result<()> {
    let kernel = job.kernel_name().to_string();
    let ordinal = {
        let mut counts = ordinals.lock().unwrap_or_else(|p| p.into_inner());
        let n = counts.entry(kernel.clone()).or_insert(0);
        *n += 1;
        *n
    };
    let prefix = format!("{kernel}_{ordinal}");
    let mut files = Vec::new();

    let lowered = reflector.lowered(job)?;
    write_dump(dir, &prefix, "lowered.src", join_artifacts(&lowered).as_bytes(), &mut files)?;

    let typed = reflector.typed(job)?;
    write_dump(dir, &prefix, "typed.src", join_artifacts(&typed).as_bytes(), &mut files)?;

    let mut buf = Vec::new();
    let unopt = IrOptions {
        optimize: false,
        dump_module: true,
        ..Default::default()
    };
    reflector.ir(&mut buf, job, &unopt)?;
    write_dump(dir, &prefix, "unopt.ir", &buf, &mut files)?;

    buf.clear();
    let opt = IrOptions {
        dump_module: true,
        ..Default::default()
    };
    reflector.ir(&mut buf, job, &opt)?;
    write_dump(dir, &prefix, "opt.ir", &buf, &mut files)?;

    buf.clear();
    reflector.assembly(&mut buf, job, &AsmOptions::default())?;
    write_dump(dir, &prefix, "asm", &buf, &mut files)?;

    if job.entry_point && reflector.driver().is_active() {
        buf.clear();
        reflector.binary(&mut buf, job, &BinaryOptions::default())?;
        write_dump(dir, &prefix, "disasm", &buf, &mut files)?;
    }

    manifest
        .lock()
        .unwrap_or_else(|p| p.into_inner())
        .push(ManifestEntry {
            kernel,
            ordinal,
            files,
        });
    Ok(())
}

/// Dump every stage of every kernel compiled while `block` runs into `dir`,
/// one file set per compiled kernel plus a `manifest.json`.
///
/// Files are named `<kernelName>_<ordinal>.<ext>`; the ordinal discriminates
/// repeated compilations of the same job within one evaluation.
pub fn dump_all<R>(
    reflector: &Reflector,
    dir: impl AsRef<Path>,
    block: impl FnOnce() -> R,
) -> Result<()> {
    let dir: PathBuf = dir.as_ref().to_path_buf();
    std::fs::create_dir_all(&dir)?;

    let ordinals: Arc<Mutex<HashMap<String, u32>>> = Arc::default();
    let manifest: Arc<Mutex<Vec<ManifestEntry>>> = Arc::default();
    let errors = ErrorSlot::default();

    let r = reflector.clone();
    let slot = errors.clone();
    let counts = Arc::clone(&ordinals);
    let entries = Arc::clone(&manifest);
    let out_dir = dir.clone();
    with_compile_hook(
        reflector.backend(),
        move |job| {
            if let Err(err) = dump_job(&r, &out_dir, &counts, &entries, job) {
                slot.record(err);
            }
        },
        block,
    )?;
    errors.surface()?;

    let entries = std::mem::take(&mut *manifest.lock().unwrap_or_else(|p| p.into_inner()));
    let json = serde_json::to_string_pretty(&entries)?;
    std::fs::write(dir.join("manifest.json"), json)?;
    Ok(())
}
