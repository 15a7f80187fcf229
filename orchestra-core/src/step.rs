//! Workflow and step records.

use crate::id::{AgentId, ExecutionId, StepId, UserId, WorkflowId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A coarse tag describing what shape of work a step performs. Distinct
/// from [`crate::intent::Intent`] — the kind is authored upstream, the
/// intent is inferred by the classifier.
pub type StepKind = String;

/// A single step authored upstream. Mutation by the core is limited to
/// attaching metadata (intent, budget, routing decision, recorded result);
/// the step's own fields are never rewritten mid-execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Stable identifier, unique within the owning workflow.
    pub id: StepId,
    /// Human-readable name.
    pub name: String,
    /// Coarse kind tag: "action", "ai_processing", "conditional", "transform", ...
    pub kind: StepKind,
    /// Plugin key for action steps (e.g. "google-mail"), if any.
    #[serde(default)]
    pub plugin_key: Option<String>,
    /// Prompt or instruction text, if any.
    #[serde(default)]
    pub prompt: Option<String>,
    /// Parameter map, arbitrary JSON.
    #[serde(default)]
    pub params: HashMap<String, serde_json::Value>,
    /// A template string referencing prior step outputs (`{{step.output}}`).
    #[serde(default)]
    pub input_expression: Option<String>,
    /// Optional input schema descriptor.
    #[serde(default)]
    pub input_schema: Option<serde_json::Value>,
    /// Optional output schema descriptor.
    #[serde(default)]
    pub output_schema: Option<serde_json::Value>,
    /// Condition tree for conditional steps (and/or/not/field-op leaves).
    #[serde(default)]
    pub condition: Option<serde_json::Value>,
    /// Context variables available to this step (used for data-size and
    /// context-depth complexity scoring).
    #[serde(default)]
    pub context_variables: HashMap<String, serde_json::Value>,
    /// If true, a failure of this step does not halt the workflow.
    #[serde(default)]
    pub continue_on_error: bool,
}

impl Step {
    /// Concatenated text used for prompt-length scoring and pattern
    /// matching: name, description-ish fields, prompt, and serialized
    /// params.
    pub fn text_surface(&self) -> String {
        let params = serde_json::to_string(&self.params).unwrap_or_default();
        format!(
            "{} {} {}",
            self.name,
            self.prompt.as_deref().unwrap_or_default(),
            params
        )
    }
}

/// An ordered sequence of steps, authored upstream. Immutable once
/// execution begins; step order is the execution order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    /// Identifier of the workflow definition.
    pub workflow_id: WorkflowId,
    /// Execution identifier minted by the orchestrator at `initialize`.
    pub execution_id: ExecutionId,
    /// The agent executing this workflow.
    pub agent_id: AgentId,
    /// The user on whose behalf the workflow runs.
    pub user_id: UserId,
    /// A short description of the overall workflow goal, used by Tier 3
    /// classification for context.
    #[serde(default)]
    pub goal: Option<String>,
    /// Steps in execution order.
    pub steps: Vec<Step>,
}
