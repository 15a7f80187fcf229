//! The per-execution telemetry dossier.

use crate::budget::TokenBudget;
use crate::complexity::AgentAis;
use crate::compression::CompressionPolicy;
use crate::id::{AgentId, ExecutionId, StepId, UserId, WorkflowId};
use crate::intent::IntentClassification;
use crate::routing::RoutingDecision;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The handler's outcome for one step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerResult {
    /// Whether the handler completed successfully.
    pub success: bool,
    /// The handler's output payload, if successful.
    #[serde(default)]
    pub output: Option<serde_json::Value>,
    /// Input/output/total token counts actually consumed.
    pub tokens_used: TokenUsage,
    /// Dollar cost actually incurred.
    pub cost: Decimal,
    /// Wall-clock time the handler took.
    pub latency: crate::duration::DurationMs,
    /// Optional quality score, for handlers that compress or summarize.
    #[serde(default)]
    pub quality: Option<f64>,
    /// Tokens saved by compression inside this handler, if any.
    #[serde(default)]
    pub compressed: Option<u64>,
    /// Error message when `success` is false.
    #[serde(default)]
    pub error: Option<String>,
    /// Free-form handler-specific metadata.
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Input/output/total token accounting for one handler invocation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input: u64,
    pub output: u64,
    pub total: u64,
}

/// Telemetry recorded for a single step within one execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepMetadata {
    /// The step this record describes.
    pub step_id: StepId,
    /// Intent classification recorded for this step.
    pub classification: IntentClassification,
    /// Final token budget recorded for this step.
    pub budget: TokenBudget,
    /// Compression policy applied to this step.
    pub compression_policy: CompressionPolicy,
    /// Final routing decision used for execution (supersedes any
    /// initialization-time routing per invariant I4).
    pub routing: RoutingDecision,
    /// Step start timestamp, epoch milliseconds.
    pub started_at_ms: u64,
    /// Step end timestamp, epoch milliseconds, once finished.
    #[serde(default)]
    pub ended_at_ms: Option<u64>,
    /// The handler's result, once the step has executed.
    #[serde(default)]
    pub handler_result: Option<HandlerResult>,
}

/// Aggregated metrics over a completed execution.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AggregatedMetrics {
    pub total_tokens_used: u64,
    pub total_tokens_saved: u64,
    pub total_cost: Decimal,
    /// `total_tokens_used / workflow cap`, in `[0, 1]` (may exceed 1 under overage).
    pub budget_utilization: f64,
}

/// The per-execution dossier the orchestrator builds and updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationMetadata {
    pub execution_id: ExecutionId,
    pub workflow_id: WorkflowId,
    pub agent_id: AgentId,
    pub user_id: UserId,
    pub started_at_ms: u64,
    #[serde(default)]
    pub ended_at_ms: Option<u64>,
    /// Total workflow-level token cap in effect for this execution.
    pub total_budget: u64,
    /// Allocation strategy name in effect ("equal", "proportional", ...).
    pub allocation_strategy: String,
    /// Feature flags in effect, snapshotted at `initialize`.
    pub feature_flags: crate::config::FeatureFlags,
    /// One record per step, appended as each step is classified/executed.
    #[serde(default)]
    pub steps: Vec<StepMetadata>,
    /// Aggregated metrics, populated on `complete`.
    #[serde(default)]
    pub metrics: AggregatedMetrics,
    /// The agent's AIS scores for this execution, if available.
    #[serde(default)]
    pub agent_ais: Option<AgentAis>,
    /// Tokens spent by orchestration overhead (classification, compression
    /// calls) — tracked separately from any step's budget.
    #[serde(default)]
    pub overhead_tokens: u64,
}
