//! Collaborator contracts the core consumes but does not own.
//!
//! Operation defined, not mechanism defined, so a Postgres-backed,
//! Temporal-backed, or purely in-memory implementation can all satisfy
//! the same contract.

use crate::complexity::AgentAis;
use crate::id::{AgentId, ExecutionId, StepId, UserId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A chat message role, mirroring the shape every provider SDK uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One message in a chat completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }
}

/// Metadata tagged onto a chat completion call for cost attribution and
/// observability, independent of step budgets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatMetadata {
    pub user_id: Option<String>,
    pub feature: Option<String>,
    pub component: Option<String>,
    pub category: Option<String>,
}

/// Prompt/completion token usage reported by a provider.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ChatUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

/// A completed chat response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: String,
    pub usage: ChatUsage,
}

/// Errors from a provider call. Surfaced as structured failures, never
/// as panics or unchecked exceptions.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ProviderError {
    #[error("provider request timed out")]
    Timeout,
    #[error("provider rejected the request: {0}")]
    Rejected(String),
    #[error("provider returned an unparseable response: {0}")]
    BadResponse(String),
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Collaborator: the LLM provider used by the classifier, compression
/// service, and handlers.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Issue one chat completion call.
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
        metadata: &ChatMetadata,
    ) -> Result<ChatResponse, ProviderError>;
}

/// Lets `Arc<P>` (or `Arc<dyn LlmProvider>`) stand in for `P` wherever an
/// owned [`LlmProvider`] is expected, so one provider instance can be
/// shared across the classifier, compression service, and handlers.
#[async_trait]
impl<P: LlmProvider + ?Sized> LlmProvider for std::sync::Arc<P> {
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
        metadata: &ChatMetadata,
    ) -> Result<ChatResponse, ProviderError> {
        (**self).chat_completion(model, messages, temperature, max_tokens, metadata).await
    }
}

/// Collaborator: read-only per-agent complexity store.
#[async_trait]
pub trait AgentAisStore: Send + Sync {
    /// Fetch the agent's AIS scores, or `None` if the agent has no
    /// recorded scores yet.
    async fn get_agent_scores(&self, agent_id: &AgentId) -> Option<AgentAis>;
}

/// The memory block for a `(user_id, agent_id)` pair and its nominal
/// advisory token budget (the ~800-token "soft budget" referenced in the
/// design notes — advisory input to the Memory Compressor, not a hard cap).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryBlock {
    pub content: String,
    pub nominal_token_budget: u64,
}

/// Collaborator: read-only persisted agent memory.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Fetch the memory block for this user/agent pair, if any exists yet.
    async fn get_memory(&self, user_id: &UserId, agent_id: &AgentId) -> Option<MemoryBlock>;
}

/// Severity of an audit event. Constrained to three values — the source
/// system's own `error`-severity audits are not authoritative here; the
/// database-level constraint of `{info, warning, critical}` is (see
/// `DESIGN.md`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSeverity {
    Info,
    Warning,
    Critical,
}

/// One audit event: an orchestration lifecycle or per-step routing/failure
/// notice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub severity: AuditSeverity,
    pub execution_id: ExecutionId,
    pub step_id: Option<StepId>,
    pub message: String,
    #[serde(default)]
    pub data: HashMap<String, serde_json::Value>,
}

/// Collaborator: write-only audit event stream.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Emit one audit event. Failures here are non-fatal — the core logs
    /// and continues rather than letting audit-sink errors affect execution.
    async fn emit(&self, event: AuditEvent);
}

/// One row of the `workflow_step_executions` table, a superset of what the
/// Budget Predictor later queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepExecutionRow {
    pub execution_id: ExecutionId,
    pub step_id: StepId,
    pub step_kind: String,
    pub intent: String,
    pub selected_tier: String,
    pub complexity_score: f64,
    pub status: String,
    pub tokens_used: Option<u64>,
    pub created_at_ms: u64,
}

/// Collaborator: the per-step execution table. Persistence failures are
/// non-fatal for execution progress — they degrade telemetry, not
/// correctness.
#[async_trait]
pub trait StepExecutionTable: Send + Sync {
    /// Upsert one row, keyed by `(execution_id, step_id)`.
    async fn upsert(&self, row: StepExecutionRow);

    /// Query historical rows matching the Budget Predictor's selection:
    /// same `step_kind`/`selected_tier`, `complexity_score` within `±1` of
    /// `complexity`, `status = "completed"`, `tokens_used` present, and
    /// `created_at_ms >= since_ms`.
    async fn query_completed(
        &self,
        step_kind: &str,
        tier: &str,
        complexity: f64,
        since_ms: u64,
    ) -> Vec<StepExecutionRow>;
}

/// Lets `Arc<T>` (or `Arc<dyn StepExecutionTable>`) stand in for `T` so the
/// same table instance can be shared beyond the [`crate::budget`] module
/// that owns it.
#[async_trait]
impl<T: StepExecutionTable + ?Sized> StepExecutionTable for std::sync::Arc<T> {
    async fn upsert(&self, row: StepExecutionRow) {
        (**self).upsert(row).await
    }

    async fn query_completed(
        &self,
        step_kind: &str,
        tier: &str,
        complexity: f64,
        since_ms: u64,
    ) -> Vec<StepExecutionRow> {
        (**self).query_completed(step_kind, tier, complexity, since_ms).await
    }
}
