//! Concrete handlers for the ten closed-set intents.
//!
//! Eight intents (`extract`, `summarize`, `generate`, `validate`,
//! `transform`, `aggregate`, `filter`, `enrich`) share one LLM-backed
//! shape — they differ only in their system prompt — implemented once as
//! [`LlmIntentHandler`]. `conditional` evaluates its condition tree
//! deterministically with no LLM call. `send` dispatches to a plugin
//! collaborator.

use crate::context::HandlerContext;
use crate::error::HandlerError;
use crate::registry::IntentHandler;
use async_trait::async_trait;
use orchestra_compression::CompressionService;
use orchestra_core::compression::estimate_tokens;
use orchestra_core::{ChatMessage, ChatMetadata, HandlerResult, LlmProvider, TokenUsage};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Instant;

fn input_text(ctx: &HandlerContext) -> String {
    ctx.step_input.to_string()
}

/// Shared LLM-backed handler for the eight non-control-flow intents.
/// `system_prompt` is the only thing that varies per intent. Input is run
/// through `ctx.compression_policy` via the shared [`CompressionService`]
/// before it reaches the provider — handlers never invent their own
/// compression.
pub struct LlmIntentHandler<P: LlmProvider> {
    provider: P,
    compression: Arc<CompressionService<P>>,
    system_prompt: &'static str,
}

impl<P: LlmProvider> LlmIntentHandler<P> {
    /// Build a handler over `provider` with the given fixed system prompt,
    /// compressing input through `compression` per the step's policy.
    pub fn new(provider: P, compression: Arc<CompressionService<P>>, system_prompt: &'static str) -> Self {
        Self { provider, compression, system_prompt }
    }
}

#[async_trait]
impl<P: LlmProvider> IntentHandler for LlmIntentHandler<P> {
    fn estimate_tokens(&self, ctx: &HandlerContext) -> u64 {
        estimate_tokens(&input_text(ctx)) + estimate_tokens(self.system_prompt)
    }

    fn validate(&self, ctx: &HandlerContext) -> bool {
        !ctx.step_input.is_null()
    }

    async fn handle(&self, ctx: &HandlerContext) -> Result<HandlerResult, HandlerError> {
        let started = Instant::now();

        let raw_input = input_text(ctx);
        let compressed = self.compression.compress(&raw_input, &ctx.compression_policy, ctx.intent).await;
        let tokens_saved = compressed.input_tokens.saturating_sub(compressed.output_tokens);

        let messages = [ChatMessage::system(self.system_prompt), ChatMessage::user(compressed.content.clone())];
        let metadata = ChatMetadata {
            user_id: Some(ctx.user_id.to_string()),
            feature: Some("orchestration".to_string()),
            component: Some(format!("{:?}", ctx.intent)),
            category: None,
        };

        let response = self
            .provider
            .chat_completion(&ctx.routing.model, &messages, 0.5, ctx.budget.remaining.max(1) as u32, &metadata)
            .await?;

        let tokens_used = TokenUsage {
            input: response.usage.prompt_tokens,
            output: response.usage.completion_tokens,
            total: response.usage.prompt_tokens + response.usage.completion_tokens,
        };
        let cost = ctx.routing.estimated_cost;

        Ok(HandlerResult {
            success: true,
            output: Some(serde_json::json!({ "content": response.content })),
            tokens_used,
            cost,
            latency: started.elapsed().into(),
            quality: Some(compressed.quality_score),
            compressed: if tokens_saved > 0 { Some(tokens_saved) } else { None },
            error: None,
            metadata: None,
        })
    }
}

/// The `conditional` handler: evaluates the step's condition tree against
/// `context_variables`. No LLM call.
#[derive(Default)]
pub struct ConditionalHandler;

#[async_trait]
impl IntentHandler for ConditionalHandler {
    fn estimate_tokens(&self, _ctx: &HandlerContext) -> u64 {
        0
    }

    fn validate(&self, ctx: &HandlerContext) -> bool {
        ctx.step_input.get("condition").is_some() || ctx.step_input.is_object()
    }

    async fn handle(&self, ctx: &HandlerContext) -> Result<HandlerResult, HandlerError> {
        let started = Instant::now();
        let condition = ctx.step_input.get("condition").unwrap_or(&ctx.step_input);
        let outcome = evaluate_condition(condition, &ctx.context_variables);

        Ok(HandlerResult {
            success: true,
            output: Some(serde_json::json!({ "branch_taken": outcome })),
            tokens_used: TokenUsage::default(),
            cost: Decimal::ZERO,
            latency: started.elapsed().into(),
            quality: None,
            compressed: None,
            error: None,
            metadata: None,
        })
    }
}

fn evaluate_condition(
    condition: &serde_json::Value,
    variables: &std::collections::HashMap<String, serde_json::Value>,
) -> bool {
    let obj = match condition.as_object() {
        Some(o) => o,
        None => return false,
    };

    if let Some(serde_json::Value::Array(children)) = obj.get("conditions") {
        let results: Vec<bool> = children.iter().map(|c| evaluate_condition(c, variables)).collect();
        return if obj.get("or").and_then(|v| v.as_bool()).unwrap_or(false) {
            results.iter().any(|r| *r)
        } else {
            results.iter().all(|r| *r)
        };
    }
    if let Some(child) = obj.get("condition") {
        if obj.get("not").and_then(|v| v.as_bool()).unwrap_or(false) {
            return !evaluate_condition(child, variables);
        }
        return evaluate_condition(child, variables);
    }

    let field = obj.get("field").and_then(|v| v.as_str()).unwrap_or_default();
    let op = obj.get("op").and_then(|v| v.as_str()).unwrap_or("eq");
    let expected = obj.get("value").cloned().unwrap_or(serde_json::Value::Null);
    let actual = variables.get(field).cloned().unwrap_or(serde_json::Value::Null);

    match op {
        "eq" => actual == expected,
        "ne" => actual != expected,
        "gt" => actual.as_f64().zip(expected.as_f64()).is_some_and(|(a, b)| a > b),
        "gte" => actual.as_f64().zip(expected.as_f64()).is_some_and(|(a, b)| a >= b),
        "lt" => actual.as_f64().zip(expected.as_f64()).is_some_and(|(a, b)| a < b),
        "lte" => actual.as_f64().zip(expected.as_f64()).is_some_and(|(a, b)| a <= b),
        _ => false,
    }
}

/// Collaborator: dispatches a `send` step's rendered payload to an
/// external plugin (Gmail, Slack, webhook, ...). Out of scope to implement
/// concretely — the core only invokes it through this uniform interface.
#[async_trait]
pub trait PluginDispatcher: Send + Sync {
    /// Dispatch `payload` to `plugin_key`, returning a plugin-defined
    /// result payload on success.
    async fn dispatch(&self, plugin_key: &str, payload: &serde_json::Value) -> Result<serde_json::Value, HandlerError>;
}

/// The `send` handler: the only handler that performs a plugin side
/// effect rather than an LLM call.
pub struct SendHandler<D: PluginDispatcher> {
    dispatcher: std::sync::Arc<D>,
}

impl<D: PluginDispatcher> SendHandler<D> {
    /// Build a handler over the given plugin dispatcher.
    pub fn new(dispatcher: std::sync::Arc<D>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl<D: PluginDispatcher> IntentHandler for SendHandler<D> {
    fn estimate_tokens(&self, ctx: &HandlerContext) -> u64 {
        estimate_tokens(&input_text(ctx))
    }

    fn validate(&self, ctx: &HandlerContext) -> bool {
        ctx.step_input.get("plugin_key").and_then(|v| v.as_str()).is_some()
    }

    async fn handle(&self, ctx: &HandlerContext) -> Result<HandlerResult, HandlerError> {
        let started = Instant::now();
        let plugin_key = ctx.step_input.get("plugin_key").and_then(|v| v.as_str()).unwrap_or_default();
        let payload = ctx.step_input.get("payload").cloned().unwrap_or(serde_json::Value::Null);

        let output = self.dispatcher.dispatch(plugin_key, &payload).await?;

        Ok(HandlerResult {
            success: true,
            output: Some(output),
            tokens_used: TokenUsage::default(),
            cost: Decimal::ZERO,
            latency: started.elapsed().into(),
            quality: None,
            compressed: None,
            error: None,
            metadata: None,
        })
    }
}

/// The fixed system prompt for each LLM-backed intent.
pub const EXTRACT_PROMPT: &str = "Extract the requested structured fields from the input. Respond with JSON only.";
pub const SUMMARIZE_PROMPT: &str = "Summarize the input concisely, preserving task-critical facts.";
pub const GENERATE_PROMPT: &str = "Generate content per the input's instructions.";
pub const VALIDATE_PROMPT: &str = "Validate the input against its stated rules. Respond with {valid, reasons}.";
pub const TRANSFORM_PROMPT: &str = "Transform the input from its source shape to the requested target shape.";
pub const AGGREGATE_PROMPT: &str = "Aggregate the input list into a single combined result.";
pub const FILTER_PROMPT: &str = "Filter the input list to only the items matching the stated criteria.";
pub const ENRICH_PROMPT: &str = "Enrich the input with additional relevant context or derived fields.";

#[cfg(test)]
mod tests {
    use super::*;
    use orchestra_core::{ChatResponse, ChatUsage, CompressionPolicy, ProviderError, RoutingDecision, Tier, TokenBudget};
    use std::collections::HashMap;
    use std::sync::Arc;

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
            Ok(ChatResponse { content: "ok".to_string(), usage: ChatUsage { prompt_tokens: 10, completion_tokens: 5 } })
        }
    }

    fn test_metadata() -> Arc<orchestra_core::OrchestrationMetadata> {
        Arc::new(orchestra_core::OrchestrationMetadata {
            execution_id: "e1".into(),
            workflow_id: "wf".into(),
            agent_id: "a1".into(),
            user_id: "u1".into(),
            started_at_ms: 0,
            ended_at_ms: None,
            total_budget: 1000,
            allocation_strategy: "proportional".into(),
            feature_flags: orchestra_core::FeatureFlags::default(),
            steps: Vec::new(),
            metrics: Default::default(),
            agent_ais: None,
            overhead_tokens: 0,
        })
    }

    fn ctx(intent: orchestra_core::Intent, input: serde_json::Value) -> HandlerContext {
        HandlerContext {
            step_id: "s1".into(),
            agent_id: "a1".into(),
            user_id: "u1".into(),
            intent,
            step_input: input,
            budget: TokenBudget::new(1000, false, 0),
            compression_policy: CompressionPolicy::default(),
            routing: RoutingDecision {
                tier: Tier::Fast,
                model: "fast-tier-default".into(),
                provider: "dynamic".into(),
                reason: "test".into(),
                estimated_cost: Decimal::ZERO,
                estimated_latency_ms: orchestra_core::DurationMs::ZERO,
                agent_ais: None,
            },
            orchestration_metadata: test_metadata(),
            memory_block: None,
            context_variables: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn llm_handler_reports_actual_tokens() {
        let provider = Arc::new(StubProvider);
        let compression = Arc::new(CompressionService::new(provider.clone(), "fast-tier-default"));
        let handler = LlmIntentHandler::new(provider.clone(), compression, GENERATE_PROMPT);
        let c = ctx(orchestra_core::Intent::Generate, serde_json::json!({"prompt": "hi"}));
        let result = handler.handle(&c).await.unwrap();
        assert!(result.success);
        assert_eq!(result.tokens_used.total, 15);
    }

    #[tokio::test]
    async fn conditional_handler_evaluates_without_llm() {
        let handler = ConditionalHandler;
        let mut vars = HashMap::new();
        vars.insert("balance".to_string(), serde_json::json!(50));
        let mut c = ctx(
            orchestra_core::Intent::Conditional,
            serde_json::json!({"condition": {"field": "balance", "op": "gt", "value": 0}}),
        );
        c.context_variables = vars;
        let result = handler.handle(&c).await.unwrap();
        assert_eq!(result.output.unwrap()["branch_taken"], serde_json::json!(true));
        assert_eq!(result.tokens_used.total, 0);
    }

    #[test]
    fn conditional_validates_input_shape() {
        let handler = ConditionalHandler;
        let c = ctx(orchestra_core::Intent::Conditional, serde_json::json!({"condition": {}}));
        assert!(handler.validate(&c));
    }
}
