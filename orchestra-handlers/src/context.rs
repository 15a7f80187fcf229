//! The per-invocation context handed to an [`crate::IntentHandler`].

use orchestra_core::{
    AgentId, CompressionPolicy, Intent, MemoryBlock, OrchestrationMetadata, RoutingDecision,
    StepId, TokenBudget, UserId,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Everything a handler needs to execute one step. Assembled fresh by the
/// driver for each `execute_step` call.
#[derive(Debug, Clone)]
pub struct HandlerContext {
    /// The step being executed.
    pub step_id: StepId,
    /// The agent executing the workflow.
    pub agent_id: AgentId,
    /// The user on whose behalf the workflow runs.
    pub user_id: UserId,
    /// This step's classified intent.
    pub intent: Intent,
    /// The step's resolved input (after template/variable resolution).
    pub step_input: serde_json::Value,
    /// This step's final token budget.
    pub budget: TokenBudget,
    /// This step's compression policy.
    pub compression_policy: CompressionPolicy,
    /// This step's final routing decision.
    pub routing: RoutingDecision,
    /// A snapshot of the owning execution's orchestration metadata.
    pub orchestration_metadata: Arc<OrchestrationMetadata>,
    /// The (possibly pre-compressed) agent memory block, if any.
    pub memory_block: Option<MemoryBlock>,
    /// Context variables available for template resolution.
    pub context_variables: HashMap<String, serde_json::Value>,
}
