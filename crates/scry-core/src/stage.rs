//! The fixed five-stage lowering pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One step of the lowering pipeline, in strict order.
///
/// Each stage conceptually requires all of its predecessors to have
/// succeeded: `Binary` needs `Assembly`, which needs `OptimizedIr`, which
/// needs `Typed`, which needs `Lowered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PipelineStage {
    /// Un-type-inferred syntactic form of the function body.
    Lowered,
    /// Type-inferred form, annotated with inferred types per operation.
    Typed,
    /// Intermediate-representation module, pre- or post-optimization.
    OptimizedIr,
    /// Target-architecture textual assembly.
    Assembly,
    /// Disassembled listing reconstructed from a transient compiled binary.
    Binary,
}

/// All stages in pipeline order.
pub const ALL_STAGES: &[PipelineStage] = &[
    PipelineStage::Lowered,
    PipelineStage::Typed,
    PipelineStage::OptimizedIr,
    PipelineStage::Assembly,
    PipelineStage::Binary,
];

impl PipelineStage {
    /// The stage that must conceptually succeed before this one.
    pub fn prerequisite(&self) -> Option<PipelineStage> {
        match self {
            PipelineStage::Lowered => None,
            PipelineStage::Typed => Some(PipelineStage::Lowered),
            PipelineStage::OptimizedIr => Some(PipelineStage::Typed),
            PipelineStage::Assembly => Some(PipelineStage::OptimizedIr),
            PipelineStage::Binary => Some(PipelineStage::Assembly),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PipelineStage::Lowered => "lowered",
            PipelineStage::Typed => "typed",
            PipelineStage::OptimizedIr => "ir",
            PipelineStage::Assembly => "assembly",
            PipelineStage::Binary => "binary",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_are_strictly_ordered() {
        for pair in ALL_STAGES.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn prerequisite_chain_reaches_lowered() {
        let mut stage = PipelineStage::Binary;
        let mut hops = 0;
        while let Some(prev) = stage.prerequisite() {
            stage = prev;
            hops += 1;
        }
        assert_eq!(stage, PipelineStage::Lowered);
        assert_eq!(hops, 4);
    }
}
