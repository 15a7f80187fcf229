//! Black-box integration test driving [`orchestra_driver::Orchestrator`]
//! through a full mixed-intent workflow: `conditional` branching, an
//! LLM-backed `generate` step, and a `send` step routed through a plugin
//! dispatcher. Exercises budget allocation, routing, memory compression,
//! and aggregated metrics end to end, plus the budget-exceeded and
//! out-of-order rejection paths.

use async_trait::async_trait;
use orchestra_core::{
    AgentAis, AgentAisStore, AgentId, AuditEvent, AuditSink, ChatMessage, ChatMetadata,
    ChatResponse, ChatUsage, FeatureFlags, LlmProvider, MemoryBlock, MemoryStore, ProviderError,
    Step, StepExecutionRow, StepExecutionTable, UserId,
};
use orchestra_driver::{Orchestrator, OrchestratorError};
use orchestra_handlers::{HandlerError, PluginDispatcher};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

struct EchoProvider;

#[async_trait]
impl LlmProvider for EchoProvider {
    async fn chat_completion(
        &self,
        _model: &str,
        messages: &[ChatMessage],
        _temperature: f32,
        _max_tokens: u32,
        _metadata: &ChatMetadata,
    ) -> Result<ChatResponse, ProviderError> {
        let last_user = messages.iter().rev().find(|m| matches!(m.role, orchestra_core::ChatRole::User));
        let content = last_user.map(|m| m.content.clone()).unwrap_or_default();
        Ok(ChatResponse {
            content: format!("handled: {content}"),
            usage: ChatUsage { prompt_tokens: 40, completion_tokens: 20 },
        })
    }
}

struct InMemoryTable {
    rows: Mutex<Vec<StepExecutionRow>>,
}

#[async_trait]
impl StepExecutionTable for InMemoryTable {
    async fn upsert(&self, row: StepExecutionRow) {
        let mut rows = self.rows.lock().await;
        if let Some(existing) = rows.iter_mut().find(|r| r.step_id == row.step_id) {
            *existing = row;
        } else {
            rows.push(row);
        }
    }

    async fn query_completed(
        &self,
        step_kind: &str,
        tier: &str,
        _complexity: f64,
        since_ms: u64,
    ) -> Vec<StepExecutionRow> {
        self.rows
            .lock()
            .await
            .iter()
            .filter(|r| r.step_kind == step_kind && r.selected_tier == tier && r.created_at_ms >= since_ms)
            .cloned()
            .collect()
    }
}

struct NoAgentAis;

#[async_trait]
impl AgentAisStore for NoAgentAis {
    async fn get_agent_scores(&self, _agent_id: &AgentId) -> Option<AgentAis> {
        None
    }
}

struct SeededMemory;

#[async_trait]
impl MemoryStore for SeededMemory {
    async fn get_memory(&self, _user_id: &UserId, _agent_id: &AgentId) -> Option<MemoryBlock> {
        Some(MemoryBlock {
            content: "user prefers concise replies. last run filed 3 invoices.".to_string(),
            nominal_token_budget: 200,
        })
    }
}

struct RecordingAudit {
    events: Mutex<Vec<AuditEvent>>,
}

#[async_trait]
impl AuditSink for RecordingAudit {
    async fn emit(&self, event: AuditEvent) {
        self.events.lock().await.push(event);
    }
}

struct EchoDispatcher;

#[async_trait]
impl PluginDispatcher for EchoDispatcher {
    async fn dispatch(&self, plugin_key: &str, payload: &serde_json::Value) -> Result<serde_json::Value, HandlerError> {
        Ok(serde_json::json!({ "plugin": plugin_key, "echoed": payload }))
    }
}

fn step(id: &str, kind: &str, prompt: Option<&str>) -> Step {
    Step {
        id: id.into(),
        name: id.to_string(),
        kind: kind.to_string(),
        plugin_key: None,
        prompt: prompt.map(|p| p.to_string()),
        params: HashMap::new(),
        input_expression: None,
        input_schema: None,
        output_schema: None,
        condition: None,
        context_variables: HashMap::new(),
        continue_on_error: false,
    }
}

fn orchestrator() -> Orchestrator {
    let config = Arc::new(orchestra_config::OrchestrationConfig::defaults());
    let provider: Arc<dyn LlmProvider> = Arc::new(EchoProvider);
    let table: Arc<dyn StepExecutionTable> = Arc::new(InMemoryTable { rows: Mutex::new(Vec::new()) });
    let agent_store: Arc<dyn AgentAisStore> = Arc::new(NoAgentAis);
    let memory_store: Arc<dyn MemoryStore> = Arc::new(SeededMemory);
    let audit: Arc<dyn AuditSink> = Arc::new(RecordingAudit { events: Mutex::new(Vec::new()) });

    let mut handlers = orchestra_handlers::default_registry(provider.clone(), "fast-tier-default");
    handlers.register(
        orchestra_core::Intent::Send,
        Arc::new(orchestra_handlers::SendHandler::new(Arc::new(EchoDispatcher))),
    );

    Orchestrator::new(config, provider, table, agent_store, memory_store, audit, handlers)
}

fn enabled_flags() -> FeatureFlags {
    FeatureFlags {
        orchestration_enabled: true,
        orchestration_compression_enabled: true,
        orchestration_ais_routing_enabled: true,
        orchestration_adaptive_budget_enabled: true,
        orchestration_bulletproof_classification_enabled: false,
        orchestration_validation_enabled: false,
        orchestration_ambiguity_detection_enabled: false,
    }
}

#[tokio::test]
async fn mixed_intent_workflow_runs_to_completion() {
    let orch = orchestrator();
    let steps = vec![
        step("branch", "conditional", Some("check the invoice total")),
        step("draft", "ai_processing", Some("generate a reminder email")),
        step("notify", "action", Some("send the reminder")),
    ];

    let active = orch
        .initialize("wf-1".into(), "agent-1".into(), "user-1".into(), None, steps, enabled_flags())
        .await;
    assert!(active);
    assert!(orch.is_active().await);

    let mut vars = HashMap::new();
    vars.insert("invoice_total".to_string(), serde_json::json!(120));
    let branch_result = orch
        .execute_step(
            &"branch".into(),
            serde_json::json!({"condition": {"field": "invoice_total", "op": "gt", "value": 0}, "context": vars}),
            None,
            None,
        )
        .await
        .unwrap()
        .unwrap();
    assert!(branch_result.success);

    let draft_result = orch
        .execute_step(&"draft".into(), serde_json::json!({"prompt": "generate a reminder email"}), None, None)
        .await
        .unwrap()
        .unwrap();
    assert!(draft_result.success);
    assert!(draft_result.tokens_used.total > 0);

    let mut plugins = HashMap::new();
    plugins.insert("google-mail".to_string(), serde_json::json!({"to": "client@example.com"}));
    let notify_result = orch
        .execute_step(
            &"notify".into(),
            serde_json::json!({"plugin_key": "google-mail", "payload": {"to": "client@example.com"}}),
            None,
            Some(plugins),
        )
        .await
        .unwrap()
        .unwrap();
    assert!(notify_result.success);

    let metrics = orch.complete().await.unwrap();
    assert!(metrics.total_tokens_used >= draft_result.tokens_used.total);
    assert!(!orch.is_active().await);
}

#[tokio::test]
async fn disabled_flag_refuses_to_start_a_workflow() {
    let orch = orchestrator();
    let steps = vec![step("s1", "ai_processing", Some("summarize this"))];
    let active = orch
        .initialize("wf-2".into(), "agent-1".into(), "user-1".into(), None, steps, FeatureFlags::default())
        .await;
    assert!(!active);
    assert!(!orch.is_active().await);
}

#[tokio::test]
async fn steps_must_execute_in_declared_order() {
    let orch = orchestrator();
    let steps = vec![
        step("first", "conditional", Some("a")),
        step("second", "conditional", Some("b")),
    ];
    orch.initialize("wf-3".into(), "agent-1".into(), "user-1".into(), None, steps, enabled_flags())
        .await;

    let out_of_order = orch
        .execute_step(&"second".into(), serde_json::json!({"condition": {}}), None, None)
        .await;
    assert!(matches!(out_of_order, Err(OrchestratorError::InvalidCall(_))));

    let first = orch
        .execute_step(&"first".into(), serde_json::json!({"condition": {}}), None, None)
        .await
        .unwrap();
    assert!(first.is_some());
}

#[tokio::test]
async fn reset_abandons_an_in_flight_execution() {
    let orch = orchestrator();
    let steps = vec![step("s1", "conditional", Some("a"))];
    orch.initialize("wf-4".into(), "agent-1".into(), "user-1".into(), None, steps, enabled_flags())
        .await;
    assert!(orch.is_active().await);

    orch.reset().await;
    assert!(!orch.is_active().await);

    let result = orch.execute_step(&"s1".into(), serde_json::Value::Null, None, None).await.unwrap();
    assert!(result.is_none());
}
