#![deny(missing_docs)]
//! # orchestra-driver — the Workflow Orchestrator (§4.9)
//!
//! The single programmatic surface the embedding application talks to.
//! Drives one workflow execution through `INIT → READY → (STEP_BUDGET_CHECK
//! → STEP_ROUTE → STEP_EXECUTE → STEP_RECORD → READY)* → COMPLETE`, wiring
//! together the classifier, budget manager, routing service, compression
//! service (via the handler registry), memory compressor, and the six
//! collaborator contracts. The only errors that cross this boundary are
//! [`OrchestratorError::BudgetExceeded`] and [`OrchestratorError::HandlerFailed`] —
//! everything else is absorbed by the component that owns it.

mod error;

pub use error::OrchestratorError;

use orchestra_budget::{AllocationStrategy, BudgetManager, StepAllocationInput};
use orchestra_classifier::{ClassifierFlags, ClassifierTelemetry, EscalationContext, IntentClassifier};
use orchestra_compression::{CompressionService, MemoryCompressionPolicy, MemoryCompressor, MemorySections};
use orchestra_config::{CompressionDefaults, OrchestrationConfig};
use orchestra_core::{
    Aggressiveness, AgentAis, AgentAisStore, AgentId, AggregatedMetrics, AuditEvent, AuditSeverity,
    AuditSink, CompressionPolicy, CompressionStrategy, FeatureFlags, HandlerResult, Intent,
    LlmProvider, MemoryBlock, MemoryStore, OrchestrationMetadata, RoutingDecision, Step,
    StepExecutionRow, StepExecutionTable, StepId, StepMetadata, TokenBudget, UserId, WorkflowId,
};
use orchestra_handlers::{HandlerContext, HandlerRegistry};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

fn now_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

/// Everything tracked for one in-flight workflow execution.
struct Execution {
    steps: Vec<Step>,
    cursor: usize,
    metadata: OrchestrationMetadata,
    previous_failures: u32,
    halted: bool,
}

enum DriverState {
    Inactive,
    Active(Execution),
}

/// Drives one workflow execution end to end. Stateless between executions —
/// `initialize` starts a new one, `complete`/`reset` end the current one.
pub struct Orchestrator {
    config: Arc<OrchestrationConfig>,
    classifier: IntentClassifier<Arc<dyn LlmProvider>>,
    budget: BudgetManager<Arc<dyn StepExecutionTable>>,
    memory_compressor: MemoryCompressor<Arc<dyn LlmProvider>>,
    handlers: HandlerRegistry,
    agent_store: Arc<dyn AgentAisStore>,
    memory_store: Arc<dyn MemoryStore>,
    audit: Arc<dyn AuditSink>,
    execution_table: Arc<dyn StepExecutionTable>,
    state: Mutex<DriverState>,
}

impl Orchestrator {
    /// Build an orchestrator. `handlers` is expected to already be wired
    /// (e.g. via `orchestra_handlers::default_registry` plus a `send`
    /// registration) — the driver only dispatches through it.
    pub fn new(
        config: Arc<OrchestrationConfig>,
        provider: Arc<dyn LlmProvider>,
        execution_table: Arc<dyn StepExecutionTable>,
        agent_store: Arc<dyn AgentAisStore>,
        memory_store: Arc<dyn MemoryStore>,
        audit: Arc<dyn AuditSink>,
        handlers: HandlerRegistry,
    ) -> Self {
        let classifier = IntentClassifier::new(provider.clone(), config.clone());
        let budget = BudgetManager::new(config.clone(), execution_table.clone());
        let memory_compressor =
            MemoryCompressor::new(CompressionService::new(provider, "fast-tier-default"));
        Self {
            config,
            classifier,
            budget,
            memory_compressor,
            handlers,
            agent_store,
            memory_store,
            audit,
            execution_table,
            state: Mutex::new(DriverState::Inactive),
        }
    }

    /// Start a new execution for `steps`. Returns `false` with no
    /// configuration or LLM calls made when `flags.orchestration_enabled`
    /// is false (P9). Loads agent AIS, classifies every step in order
    /// (each step's Tier 3 escalation context sees `workflow_goal` and the
    /// intents/descriptions of its neighbors), allocates budgets, and
    /// builds each step's initial routing decision before returning `true`.
    pub async fn initialize(
        &self,
        workflow_id: WorkflowId,
        agent_id: AgentId,
        user_id: UserId,
        workflow_goal: Option<String>,
        steps: Vec<Step>,
        flags: FeatureFlags,
    ) -> bool {
        if !flags.orchestration_enabled {
            *self.state.lock().await = DriverState::Inactive;
            return false;
        }

        let agent_ais = self.agent_store.get_agent_scores(&agent_id).await;
        let execution_id = orchestra_core::ExecutionId::new(uuid::Uuid::new_v4().to_string());

        let classifier_flags = ClassifierFlags {
            validation_enabled: flags.orchestration_validation_enabled,
            ambiguity_detection_enabled: flags.orchestration_ambiguity_detection_enabled,
            bulletproof_enabled: flags.orchestration_bulletproof_classification_enabled,
        };
        let total_steps = steps.len();
        let descriptions: Vec<String> = steps.iter().map(|s| s.name.clone()).collect();

        // Classified sequentially (rather than concurrently) so that each
        // step's escalation context can see the intents already decided for
        // the steps ahead of it in the same batch.
        let mut classifications: Vec<(orchestra_core::IntentClassification, ClassifierTelemetry)> =
            Vec::with_capacity(steps.len());
        let mut previous_intents: Vec<Intent> = Vec::with_capacity(steps.len());
        for (i, step) in steps.iter().enumerate() {
            let escalation = EscalationContext {
                workflow_goal: workflow_goal.clone(),
                step_index: i + 1,
                total_steps,
                previous_intents: previous_intents.clone(),
                upcoming_descriptions: descriptions.get(i + 1..).map(<[String]>::to_vec).unwrap_or_default(),
            };
            let (classification, telemetry) =
                self.classifier.classify(step, classifier_flags, Some(escalation)).await;
            previous_intents.push(classification.intent);
            classifications.push((classification, telemetry));
        }

        let ais_for_routing = if flags.orchestration_ais_routing_enabled { agent_ais } else { None };

        let mut routing_by_step: HashMap<StepId, RoutingDecision> = HashMap::new();
        let mut allocation_inputs = Vec::with_capacity(steps.len());
        for (step, (classification, _)) in steps.iter().zip(classifications.iter()) {
            let (decision, routing_telemetry) =
                orchestra_routing::route(step, classification.intent, ais_for_routing, self.config.per_step_cap, 0, &self.config);
            routing_by_step.insert(step.id.clone(), decision);
            allocation_inputs.push(StepAllocationInput {
                step_id: step.id.clone(),
                step_kind: step.kind.clone(),
                intent: classification.intent,
                classification_confidence: classification.confidence,
                initial_tier: Some(routing_telemetry.decision.tier),
                initial_complexity: Some(routing_telemetry.effective_complexity),
            });
        }

        let strategy = if flags.orchestration_adaptive_budget_enabled {
            AllocationStrategy::Adaptive
        } else {
            AllocationStrategy::Proportional
        };

        self.budget.reset().await;
        let budgets = self.budget.allocate(&allocation_inputs, agent_ais, strategy, now_ms()).await;

        let mut overhead_tokens = 0u64;
        let mut step_metadata = Vec::with_capacity(steps.len());
        for (step, (classification, telemetry)) in steps.iter().zip(classifications.into_iter()) {
            overhead_tokens += telemetry.tokens_used;
            let routing = routing_by_step.remove(&step.id).unwrap_or_else(|| RoutingDecision {
                tier: orchestra_core::Tier::Balanced,
                model: "balanced-tier-default".to_string(),
                provider: "dynamic".to_string(),
                reason: "no routing decision computed at initialization".to_string(),
                estimated_cost: Decimal::ZERO,
                estimated_latency_ms: orchestra_core::DurationMs::ZERO,
                agent_ais,
            });
            let budget = budgets.get(&step.id).copied().unwrap_or_else(|| TokenBudget::new(0, false, 0));
            step_metadata.push(StepMetadata {
                step_id: step.id.clone(),
                compression_policy: self.compression_policy_for(classification.intent, &flags),
                classification,
                budget,
                routing,
                started_at_ms: 0,
                ended_at_ms: None,
                handler_result: None,
            });
        }

        let metadata = OrchestrationMetadata {
            execution_id,
            workflow_id,
            agent_id,
            user_id,
            started_at_ms: now_ms(),
            ended_at_ms: None,
            total_budget: self.config.workflow_cap,
            allocation_strategy: strategy.as_str().to_string(),
            feature_flags: flags,
            steps: step_metadata,
            metrics: AggregatedMetrics::default(),
            agent_ais,
            overhead_tokens,
        };

        self.audit
            .emit(AuditEvent {
                severity: AuditSeverity::Info,
                execution_id: metadata.execution_id.clone(),
                step_id: None,
                message: "workflow execution initialized".to_string(),
                data: HashMap::new(),
            })
            .await;

        *self.state.lock().await =
            DriverState::Active(Execution { steps, cursor: 0, metadata, previous_failures: 0, halted: false });
        true
    }

    fn compression_policy_for(&self, intent: Intent, flags: &FeatureFlags) -> CompressionPolicy {
        if !flags.orchestration_compression_enabled {
            return CompressionPolicy { enabled: false, ..CompressionPolicy::default() };
        }
        let defaults = self
            .config
            .compression_defaults
            .get(&intent)
            .copied()
            .unwrap_or(CompressionDefaults { target_ratio: 0.5, min_quality_score: 0.7 });
        CompressionPolicy {
            enabled: true,
            strategy: CompressionStrategy::Structural,
            target_ratio: defaults.target_ratio,
            min_quality_score: defaults.min_quality_score,
            aggressiveness: Aggressiveness::Medium,
        }
    }

    async fn fetch_memory_block(&self, execution: &Execution) -> Option<MemoryBlock> {
        let raw = self
            .memory_store
            .get_memory(&execution.metadata.user_id, &execution.metadata.agent_id)
            .await?;
        if !execution.metadata.feature_flags.orchestration_compression_enabled {
            return Some(raw);
        }
        let sections =
            MemorySections { user_profile: None, recent_runs: Vec::new(), learned_patterns: Some(raw.content.clone()) };
        let (content, _result) = self
            .memory_compressor
            .compress(&sections, &MemoryCompressionPolicy::default(), Some(raw.nominal_token_budget))
            .await;
        Some(MemoryBlock { content, nominal_token_budget: raw.nominal_token_budget })
    }

    /// Execute the next step. Returns `Ok(None)` if orchestration is
    /// inactive (the caller should run its own path). Returns
    /// `Err(BudgetExceeded)` or `Err(HandlerFailed)` per the propagation
    /// policy (§7) — every other internal failure is absorbed and only
    /// observable via logs/audit events.
    pub async fn execute_step(
        &self,
        step_id: &StepId,
        step_input: serde_json::Value,
        memory_context: Option<MemoryBlock>,
        plugins: Option<HashMap<String, serde_json::Value>>,
    ) -> Result<Option<HandlerResult>, OrchestratorError> {
        let mut state = self.state.lock().await;
        let execution = match &mut *state {
            DriverState::Inactive => return Ok(None),
            DriverState::Active(exec) => exec,
        };

        if execution.halted {
            return Err(OrchestratorError::InvalidCall(format!(
                "execution {} halted after a prior step failure",
                execution.metadata.execution_id
            )));
        }

        let Some(index) = execution.steps.iter().position(|s| &s.id == step_id) else {
            return Err(OrchestratorError::InvalidCall(format!("unknown step {step_id}")));
        };
        if index != execution.cursor {
            return Err(OrchestratorError::InvalidCall(format!(
                "step {step_id} is out of order: expected the step at position {}",
                execution.cursor
            )));
        }

        let step = execution.steps[index].clone();
        let step_meta = execution.metadata.steps[index].clone();
        let intent = step_meta.classification.intent;
        let metadata_snapshot = Arc::new(execution.metadata.clone());

        // STEP_BUDGET_CHECK — probe against the initialization-time routing
        // decision; the handler's estimate depends only on its input, not
        // on which model ends up serving it.
        let probe_ctx = HandlerContext {
            step_id: step_id.clone(),
            agent_id: execution.metadata.agent_id.clone(),
            user_id: execution.metadata.user_id.clone(),
            intent,
            step_input: step_input.clone(),
            budget: step_meta.budget,
            compression_policy: step_meta.compression_policy,
            routing: step_meta.routing.clone(),
            orchestration_metadata: metadata_snapshot.clone(),
            memory_block: None,
            context_variables: HashMap::new(),
        };
        let required = self.handlers.estimate_tokens(intent, &probe_ctx).unwrap_or(0);
        let ceiling = step_meta.budget.ceiling();

        if !self.budget.can_afford(step_id, required).await {
            execution.halted = !step.continue_on_error;
            if !execution.halted {
                execution.cursor += 1;
            }
            self.execution_table
                .upsert(StepExecutionRow {
                    execution_id: execution.metadata.execution_id.clone(),
                    step_id: step_id.clone(),
                    step_kind: step.kind.clone(),
                    intent: intent.as_str().to_string(),
                    selected_tier: step_meta.routing.tier.to_string(),
                    complexity_score: 0.0,
                    status: "failed".to_string(),
                    tokens_used: None,
                    created_at_ms: now_ms(),
                })
                .await;
            self.audit
                .emit(AuditEvent {
                    severity: AuditSeverity::Critical,
                    execution_id: execution.metadata.execution_id.clone(),
                    step_id: Some(step_id.clone()),
                    message: format!("step {step_id} would exceed its token budget"),
                    data: HashMap::new(),
                })
                .await;
            return Err(OrchestratorError::BudgetExceeded { step_id: step_id.clone(), required, ceiling });
        }

        // STEP_ROUTE — re-route using the step object itself, richer than
        // the initialization-time pass.
        let ais_for_routing =
            if execution.metadata.feature_flags.orchestration_ais_routing_enabled { execution.metadata.agent_ais } else { None };
        let live_budget = self.budget.budget_for(step_id).await.unwrap_or(step_meta.budget);
        let (decision, telemetry) =
            orchestra_routing::route(&step, intent, ais_for_routing, live_budget.remaining, execution.previous_failures, &self.config);
        orchestra_routing::log_routing_telemetry(&telemetry);

        let started_at_ms = now_ms();
        self.execution_table
            .upsert(StepExecutionRow {
                execution_id: execution.metadata.execution_id.clone(),
                step_id: step_id.clone(),
                step_kind: step.kind.clone(),
                intent: intent.as_str().to_string(),
                selected_tier: decision.tier.to_string(),
                complexity_score: telemetry.complexity.composite,
                status: "running".to_string(),
                tokens_used: None,
                created_at_ms: started_at_ms,
            })
            .await;

        let memory_block = match memory_context {
            Some(block) => Some(block),
            None => self.fetch_memory_block(execution).await,
        };
        let mut context_variables = step.context_variables.clone();
        if let Some(plugins) = plugins {
            context_variables.insert(
                "plugins".to_string(),
                serde_json::to_value(plugins).unwrap_or(serde_json::Value::Null),
            );
        }

        let ctx = HandlerContext {
            step_id: step_id.clone(),
            agent_id: execution.metadata.agent_id.clone(),
            user_id: execution.metadata.user_id.clone(),
            intent,
            step_input,
            budget: live_budget,
            compression_policy: step_meta.compression_policy,
            routing: decision.clone(),
            orchestration_metadata: metadata_snapshot,
            memory_block,
            context_variables,
        };

        // STEP_EXECUTE
        let result = self.handlers.dispatch(&ctx).await;

        // STEP_RECORD
        self.budget.track_usage(step_id, result.tokens_used.total).await;
        if let Some(saved) = result.compressed {
            self.budget.record_compression(step_id, saved).await;
        }
        let final_budget = self.budget.budget_for(step_id).await.unwrap_or(live_budget);
        let ended_at_ms = now_ms();
        let selected_tier = decision.tier.to_string();

        execution.metadata.steps[index].routing = decision;
        execution.metadata.steps[index].budget = final_budget;
        execution.metadata.steps[index].started_at_ms = started_at_ms;
        execution.metadata.steps[index].ended_at_ms = Some(ended_at_ms);
        execution.metadata.steps[index].handler_result = Some(result.clone());

        self.execution_table
            .upsert(StepExecutionRow {
                execution_id: execution.metadata.execution_id.clone(),
                step_id: step_id.clone(),
                step_kind: step.kind.clone(),
                intent: intent.as_str().to_string(),
                selected_tier,
                complexity_score: telemetry.complexity.composite,
                status: if result.success { "completed" } else { "failed" }.to_string(),
                tokens_used: Some(result.tokens_used.total),
                created_at_ms: started_at_ms,
            })
            .await;

        if !result.success {
            execution.previous_failures += 1;
            let reason = result.error.clone().unwrap_or_else(|| "handler failed with no message".to_string());
            self.audit
                .emit(AuditEvent {
                    severity: AuditSeverity::Critical,
                    execution_id: execution.metadata.execution_id.clone(),
                    step_id: Some(step_id.clone()),
                    message: reason.clone(),
                    data: HashMap::new(),
                })
                .await;
            execution.halted = !step.continue_on_error;
            if !execution.halted {
                execution.cursor += 1;
            }
            return Err(OrchestratorError::HandlerFailed { step_id: step_id.clone(), reason });
        }

        execution.cursor += 1;
        Ok(Some(result))
    }

    /// End the current execution, aggregating final metrics. Returns
    /// `None` if no execution is active.
    pub async fn complete(&self) -> Option<AggregatedMetrics> {
        let mut state = self.state.lock().await;
        let execution = match &mut *state {
            DriverState::Inactive => return None,
            DriverState::Active(exec) => exec,
        };

        let mut total_tokens_used = 0u64;
        let mut total_tokens_saved = 0u64;
        let mut total_cost = Decimal::ZERO;
        for step_meta in &execution.metadata.steps {
            if let Some(result) = &step_meta.handler_result {
                total_tokens_used += result.tokens_used.total;
                total_tokens_saved += result.compressed.unwrap_or(0);
                total_cost += result.cost;
            }
        }
        total_tokens_used += execution.metadata.overhead_tokens;
        let budget_utilization = if execution.metadata.total_budget > 0 {
            total_tokens_used as f64 / execution.metadata.total_budget as f64
        } else {
            0.0
        };

        let metrics = AggregatedMetrics { total_tokens_used, total_tokens_saved, total_cost, budget_utilization };
        execution.metadata.ended_at_ms = Some(now_ms());
        execution.metadata.metrics = metrics;

        self.audit
            .emit(AuditEvent {
                severity: AuditSeverity::Info,
                execution_id: execution.metadata.execution_id.clone(),
                step_id: None,
                message: "workflow execution complete".to_string(),
                data: HashMap::new(),
            })
            .await;

        *state = DriverState::Inactive;
        Some(metrics)
    }

    /// Whether an execution is currently active (between `initialize` and
    /// `complete`/`reset`).
    pub async fn is_active(&self) -> bool {
        matches!(*self.state.lock().await, DriverState::Active(_))
    }

    /// Abandon the current execution without aggregating metrics, clearing
    /// its tracked budgets.
    pub async fn reset(&self) {
        self.budget.reset().await;
        *self.state.lock().await = DriverState::Inactive;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use orchestra_core::{ChatMessage, ChatMetadata, ChatResponse, ChatUsage, ProviderError};
    use std::collections::HashMap as StdHashMap;

    struct StubProvider;

    #[async_trait]
    impl LlmProvider for StubProvider {
        async fn chat_completion(
            &self,
            _model: &str,
            _messages: &[ChatMessage],
            _temperature: f32,
            _max_tokens: u32,
            _metadata: &ChatMetadata,
        ) -> Result<ChatResponse, ProviderError> {
            Ok(ChatResponse {
                content: r#"{"intent": "generate", "confidence": 0.9, "reasoning": "stub"}"#.to_string(),
                usage: ChatUsage { prompt_tokens: 5, completion_tokens: 5 },
            })
        }
    }

    struct NoopTable;

    #[async_trait]
    impl StepExecutionTable for NoopTable {
        async fn upsert(&self, _row: StepExecutionRow) {}
        async fn query_completed(&self, _step_kind: &str, _tier: &str, _complexity: f64, _since_ms: u64) -> Vec<StepExecutionRow> {
            Vec::new()
        }
    }

    struct NoAgentAis;

    #[async_trait]
    impl AgentAisStore for NoAgentAis {
        async fn get_agent_scores(&self, _agent_id: &AgentId) -> Option<AgentAis> {
            None
        }
    }

    struct NoMemory;

    #[async_trait]
    impl MemoryStore for NoMemory {
        async fn get_memory(&self, _user_id: &UserId, _agent_id: &AgentId) -> Option<MemoryBlock> {
            None
        }
    }

    struct RecordingAudit {
        events: tokio::sync::Mutex<Vec<AuditEvent>>,
    }

    #[async_trait]
    impl AuditSink for RecordingAudit {
        async fn emit(&self, event: AuditEvent) {
            self.events.lock().await.push(event);
        }
    }

    fn step(id: &str, kind: &str, prompt: &str) -> Step {
        Step {
            id: id.into(),
            name: id.to_string(),
            kind: kind.to_string(),
            plugin_key: None,
            prompt: Some(prompt.to_string()),
            params: StdHashMap::new(),
            input_expression: None,
            input_schema: None,
            output_schema: None,
            condition: None,
            context_variables: StdHashMap::new(),
            continue_on_error: false,
        }
    }

    fn orchestrator() -> Orchestrator {
        let config = Arc::new(OrchestrationConfig::defaults());
        let provider: Arc<dyn LlmProvider> = Arc::new(StubProvider);
        let table: Arc<dyn StepExecutionTable> = Arc::new(NoopTable);
        let agent_store: Arc<dyn AgentAisStore> = Arc::new(NoAgentAis);
        let memory_store: Arc<dyn MemoryStore> = Arc::new(NoMemory);
        let audit: Arc<dyn AuditSink> = Arc::new(RecordingAudit { events: tokio::sync::Mutex::new(Vec::new()) });
        let handlers = orchestra_handlers::default_registry(provider.clone(), "fast-tier-default");
        Orchestrator::new(config, provider, table, agent_store, memory_store, audit, handlers)
    }

    #[tokio::test]
    async fn disabled_flag_short_circuits_initialize() {
        let orch = orchestrator();
        let active = orch
            .initialize("wf".into(), "agent".into(), "user".into(), None, vec![step("s1", "conditional", "x")], FeatureFlags::default())
            .await;
        assert!(!active);
        assert!(!orch.is_active().await);
    }

    #[tokio::test]
    async fn initialize_classifies_allocates_and_activates() {
        let orch = orchestrator();
        let flags = FeatureFlags { orchestration_enabled: true, ..FeatureFlags::default() };
        let steps = vec![
            step("s1", "conditional", "if balance > 0 then notify"),
            step("s2", "ai_processing", "generate a report"),
        ];
        let active = orch.initialize("wf".into(), "agent".into(), "user".into(), None, steps, flags).await;
        assert!(active);
        assert!(orch.is_active().await);
    }

    #[tokio::test]
    async fn initialize_accepts_a_workflow_goal() {
        let orch = orchestrator();
        let flags = FeatureFlags { orchestration_enabled: true, ..FeatureFlags::default() };
        let steps = vec![
            step("s1", "conditional", "if balance > 0 then notify"),
            step("s2", "ai_processing", "generate a report"),
        ];
        let active = orch
            .initialize(
                "wf".into(),
                "agent".into(),
                "user".into(),
                Some("keep the customer's account in good standing".to_string()),
                steps,
                flags,
            )
            .await;
        assert!(active);
        assert!(orch.is_active().await);
    }

    #[tokio::test]
    async fn full_execution_completes_and_aggregates_metrics() {
        let orch = orchestrator();
        let flags = FeatureFlags { orchestration_enabled: true, ..FeatureFlags::default() };
        let steps = vec![step("s1", "conditional", "if balance > 0 then notify")];
        orch.initialize("wf".into(), "agent".into(), "user".into(), None, steps, flags).await;

        let mut vars = HashMap::new();
        vars.insert("balance".to_string(), serde_json::json!(10));
        let result = orch
            .execute_step(&"s1".into(), serde_json::json!({"condition": {"field": "balance", "op": "gt", "value": 0}}), None, None)
            .await
            .unwrap();
        assert!(result.unwrap().success);

        let summary = orch.complete().await.unwrap();
        assert!(summary.total_tokens_used >= 0);
        assert!(!orch.is_active().await);
    }

    #[tokio::test]
    async fn execute_step_on_inactive_orchestrator_returns_none() {
        let orch = orchestrator();
        let result = orch.execute_step(&"s1".into(), serde_json::Value::Null, None, None).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn out_of_order_step_is_rejected() {
        let orch = orchestrator();
        let flags = FeatureFlags { orchestration_enabled: true, ..FeatureFlags::default() };
        let steps = vec![step("s1", "conditional", "a"), step("s2", "conditional", "b")];
        orch.initialize("wf".into(), "agent".into(), "user".into(), None, steps, flags).await;

        let result = orch.execute_step(&"s2".into(), serde_json::json!({"condition": {}}), None, None).await;
        assert!(matches!(result, Err(OrchestratorError::InvalidCall(_))));
    }

    #[tokio::test]
    async fn reset_clears_active_execution() {
        let orch = orchestrator();
        let flags = FeatureFlags { orchestration_enabled: true, ..FeatureFlags::default() };
        orch.initialize("wf".into(), "agent".into(), "user".into(), None, vec![step("s1", "conditional", "a")], flags).await;
        assert!(orch.is_active().await);
        orch.reset().await;
        assert!(!orch.is_active().await);
    }
}
