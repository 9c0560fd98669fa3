//! The compilation-job descriptor.
//!
//! A job is the canonical, hashable description of "compile function F with
//! argument types T for capability C as kernel / device function". It is the
//! cache key and the hook payload throughout the toolkit.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::capability::Capability;
use crate::function::{signature, FunctionHandle, TypeDesc};

/// One compilation request, immutable after construction.
///
/// Two jobs are equal iff function identity, argument types, capability, and
/// the entry-point flag are all equal. The display-name override does not
/// participate in equality, hashing, or the content key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilationJob {
    pub function: FunctionHandle,
    pub arg_types: Vec<TypeDesc>,
    pub capability: Capability,
    /// True for GPU kernel entry points (no return value, launchable);
    /// false for ordinary device-side functions.
    pub entry_point: bool,
    /// Display-name override used when rendering artifacts.
    pub display_name: Option<String>,
}

impl CompilationJob {
    /// Describe a kernel entry-point compilation.
    pub fn kernel(
        function: FunctionHandle,
        arg_types: Vec<TypeDesc>,
        capability: Capability,
    ) -> Self {
        Self {
            function,
            arg_types,
            capability,
            entry_point: true,
            display_name: None,
        }
    }

    /// Describe a device-side helper function compilation.
    pub fn device_function(
        function: FunctionHandle,
        arg_types: Vec<TypeDesc>,
        capability: Capability,
    ) -> Self {
        Self {
            entry_point: false,
            ..Self::kernel(function, arg_types, capability)
        }
    }

    /// Override the name used when rendering artifacts.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Name under which artifacts for this job are rendered.
    pub fn kernel_name(&self) -> &str {
        self.display_name
            .as_deref()
            .unwrap_or_else(|| self.function.name())
    }

    /// The specialization signature, e.g. `vadd(*f32, *f32, u32)`.
    pub fn specialization(&self) -> String {
        format!("{}{}", self.function.name(), signature(&self.arg_types))
    }

    /// Content-addressed key over the equality-relevant fields.
    pub fn content_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.function.id().as_bytes());
        for ty in &self.arg_types {
            hasher.update(format!("{ty:?}").as_bytes());
        }
        hasher.update(format!("{:?}", self.capability).as_bytes());
        hasher.update([self.entry_point as u8]);
        format!("{:x}", hasher.finalize())
    }
}

impl PartialEq for CompilationJob {
    fn eq(&self, other: &Self) -> bool {
        self.function == other.function
            && self.arg_types == other.arg_types
            && self.capability == other.capability
            && self.entry_point == other.entry_point
    }
}

impl Eq for CompilationJob {}

impl Hash for CompilationJob {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.function.hash(state);
        self.arg_types.hash(state);
        self.capability.hash(state);
        self.entry_point.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(job: &CompilationJob) -> u64 {
        let mut h = DefaultHasher::new();
        job.hash(&mut h);
        h.finish()
    }

    fn sample_job() -> CompilationJob {
        CompilationJob::kernel(
            FunctionHandle::new("vadd"),
            vec![TypeDesc::ptr(TypeDesc::F32), TypeDesc::U32],
            Capability::of(8, 6),
        )
    }

    #[test]
    fn display_name_does_not_affect_identity() {
        let a = sample_job();
        let b = a.clone().with_name("renamed");
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_eq!(a.content_key(), b.content_key());
        assert_eq!(b.kernel_name(), "renamed");
        assert_eq!(a.kernel_name(), "vadd");
    }

    #[test]
    fn entry_point_flag_separates_jobs() {
        let kernel = sample_job();
        let device = CompilationJob {
            entry_point: false,
            ..kernel.clone()
        };
        assert_ne!(kernel, device);
        assert_ne!(kernel.content_key(), device.content_key());
    }

    #[test]
    fn argument_types_separate_jobs() {
        let a = sample_job();
        let mut b = a.clone();
        b.arg_types = vec![TypeDesc::ptr(TypeDesc::F64), TypeDesc::U32];
        assert_ne!(a, b);
    }

    #[test]
    fn distinct_functions_with_same_name_differ() {
        let a = sample_job();
        let mut b = a.clone();
        b.function = FunctionHandle::new("vadd");
        assert_ne!(a, b);
    }

    #[test]
    fn specialization_rendering() {
        assert_eq!(sample_job().specialization(), "vadd(*f32, u32)");
    }
}
