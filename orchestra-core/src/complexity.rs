//! Agent and step complexity scoring types.

use serde::{Deserialize, Serialize};

/// Per-agent complexity scores read from durable storage. Treated as
/// read-only by the core — nothing here writes AIS back.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AgentAis {
    /// Design-time complexity, in `[0, 10]`.
    pub creation_score: f64,
    /// Rolling-average runtime complexity, in `[0, 10]`.
    pub execution_score: f64,
    /// Weighted blend of creation and execution, in `[0, 10]`, used for routing.
    pub combined_score: f64,
}

/// The six weighted factors behind a step's composite complexity score,
/// each independently in `[0, 10]`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StepComplexityFactors {
    /// Bucketed score for prompt/name/params text length.
    pub prompt_length: f64,
    /// Bucketed score for serialized params + context variable byte size.
    pub data_size: f64,
    /// Bucketed score for recursive condition-tree leaf count.
    pub condition_count: f64,
    /// Bucketed score for `{{...}}` template reference count.
    pub context_depth: f64,
    /// Fixed score per step-kind reflecting reasoning depth.
    pub reasoning_depth: f64,
    /// Fixed score per step-kind reflecting output complexity.
    pub output_complexity: f64,
}

/// Raw (unbucketed) measurements behind [`StepComplexityFactors`], kept
/// for telemetry and the Budget Predictor's query key.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StepComplexityRaw {
    /// Character count across name, prompt, and serialized params.
    pub prompt_length_chars: usize,
    /// Byte length of serialized params + serialized context variables.
    pub data_size_bytes: usize,
    /// Recursive count of leaf conditions.
    pub condition_count: usize,
    /// Count of `{{...}}` template references in the serialized step.
    pub context_depth: usize,
}

/// A step's full complexity assessment: six bucketed factor scores, their
/// raw measurements, and the weighted composite in `[0, 10]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StepComplexity {
    /// The six bucketed factor scores.
    pub factors: StepComplexityFactors,
    /// The raw measurements behind the bucketed factors.
    pub raw: StepComplexityRaw,
    /// Weighted sum of the six factor scores, clamped to `[0, 10]`.
    pub composite: f64,
}
