//! Process-wide compile-hook registry.
//!
//! A single optional callback slot: at most one hook may be active at any
//! time. The backend's compile path calls [`notify`] once per distinct kernel
//! compilation; installation hands back an RAII guard so the slot is released
//! on every exit path, including unwinding.

use std::sync::Mutex;

use crate::error::CoreError;
use crate::job::CompilationJob;

/// Callback invoked once per distinct kernel compilation.
pub type CompileHook = Box<dyn Fn(&CompilationJob) + Send + 'static>;

static ACTIVE_HOOK: Mutex<Option<CompileHook>> = Mutex::new(None);

fn slot() -> std::sync::MutexGuard<'static, Option<CompileHook>> {
    ACTIVE_HOOK.lock().unwrap_or_else(|p| p.into_inner())
}

/// Scoped registration of the compile hook; uninstalls on drop.
#[derive(Debug)]
pub struct HookGuard {
    _private: (),
}

impl Drop for HookGuard {
    fn drop(&mut self) {
        *slot() = None;
    }
}

/// Install `hook` into the single slot.
///
/// Fails with [`CoreError::HookAlreadyInstalled`] when a hook is active;
/// dispatch is a single global slot, not a stack, so nesting is unsupported.
pub fn install(hook: CompileHook) -> Result<HookGuard, CoreError> {
    let mut active = slot();
    if active.is_some() {
        return Err(CoreError::HookAlreadyInstalled);
    }
    *active = Some(hook);
    Ok(HookGuard { _private: () })
}

/// Whether a hook is currently registered.
pub fn is_installed() -> bool {
    slot().is_some()
}

/// Deliver a compilation to the active hook, if any.
///
/// Called by the backend's compile path; a no-op when no hook is installed.
/// The slot lock is held for the duration of dispatch, so the hook must not
/// itself trigger a hooked compilation.
pub fn notify(job: &CompilationJob) {
    let active = slot();
    if let Some(hook) = active.as_ref() {
        hook(job);
    }
}
