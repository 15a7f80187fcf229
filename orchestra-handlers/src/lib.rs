#![deny(missing_docs)]
//! # orchestra-handlers — the Intent Handler Registry (§4.8)
//!
//! A closed map from [`orchestra_core::Intent`] to one [`IntentHandler`]
//! implementation. [`HandlerRegistry::dispatch`] supplies the shared
//! budget/validation scaffolding every handler gets for free.

mod context;
mod error;
mod handlers;
mod registry;

pub use context::HandlerContext;
pub use error::HandlerError;
pub use handlers::{
    ConditionalHandler, LlmIntentHandler, PluginDispatcher, SendHandler, AGGREGATE_PROMPT,
    ENRICH_PROMPT, EXTRACT_PROMPT, FILTER_PROMPT, GENERATE_PROMPT, SUMMARIZE_PROMPT,
    TRANSFORM_PROMPT, VALIDATE_PROMPT,
};
pub use registry::{HandlerRegistry, IntentHandler};

use orchestra_compression::CompressionService;
use orchestra_core::{Intent, LlmProvider};
use std::sync::Arc;

/// Build a registry with the eight LLM-backed handlers and `conditional`
/// wired to `provider`, compressing each handler's input through a shared
/// [`CompressionService`] built for `semantic_model`. Callers still need
/// to `register` `send` themselves — it needs a [`PluginDispatcher`] this
/// function has no way to supply.
pub fn default_registry<P: LlmProvider + 'static>(
    provider: Arc<P>,
    semantic_model: impl Into<String>,
) -> HandlerRegistry {
    let compression = Arc::new(CompressionService::new(provider.clone(), semantic_model));
    let mut registry = HandlerRegistry::new();
    registry.register(Intent::Extract, Arc::new(LlmIntentHandler::new(provider.clone(), compression.clone(), EXTRACT_PROMPT)));
    registry.register(Intent::Summarize, Arc::new(LlmIntentHandler::new(provider.clone(), compression.clone(), SUMMARIZE_PROMPT)));
    registry.register(Intent::Generate, Arc::new(LlmIntentHandler::new(provider.clone(), compression.clone(), GENERATE_PROMPT)));
    registry.register(Intent::Validate, Arc::new(LlmIntentHandler::new(provider.clone(), compression.clone(), VALIDATE_PROMPT)));
    registry.register(Intent::Transform, Arc::new(LlmIntentHandler::new(provider.clone(), compression.clone(), TRANSFORM_PROMPT)));
    registry.register(Intent::Aggregate, Arc::new(LlmIntentHandler::new(provider.clone(), compression.clone(), AGGREGATE_PROMPT)));
    registry.register(Intent::Filter, Arc::new(LlmIntentHandler::new(provider.clone(), compression.clone(), FILTER_PROMPT)));
    registry.register(Intent::Enrich, Arc::new(LlmIntentHandler::new(provider, compression, ENRICH_PROMPT)));
    registry.register(Intent::Conditional, Arc::new(ConditionalHandler));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use orchestra_core::{ChatMessage, ChatMetadata, ChatResponse, ChatUsage, ProviderError};
    use async_trait::async_trait;

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
            Ok(ChatResponse { content: "ok".to_string(), usage: ChatUsage::default() })
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

    #[tokio::test]
    async fn dispatch_fails_closed_when_no_handler_registered() {
        let registry = HandlerRegistry::new();
        let ctx = HandlerContext {
            step_id: "s1".into(),
            agent_id: "a1".into(),
            user_id: "u1".into(),
            intent: Intent::Send,
            step_input: serde_json::Value::Null,
            budget: orchestra_core::TokenBudget::new(1000, false, 0),
            compression_policy: orchestra_core::CompressionPolicy::default(),
            routing: orchestra_core::RoutingDecision {
                tier: orchestra_core::Tier::Fast,
                model: "fast-tier-default".into(),
                provider: "dynamic".into(),
                reason: "test".into(),
                estimated_cost: rust_decimal::Decimal::ZERO,
                estimated_latency_ms: orchestra_core::DurationMs::ZERO,
                agent_ais: None,
            },
            orchestration_metadata: test_metadata(),
            memory_block: None,
            context_variables: std::collections::HashMap::new(),
        };
        let result = registry.dispatch(&ctx).await;
        assert!(!result.success);
    }

    #[tokio::test]
    async fn default_registry_wires_all_eight_llm_intents() {
        let registry = default_registry(Arc::new(StubProvider), "fast-tier-default");
        for intent in [
            Intent::Extract,
            Intent::Summarize,
            Intent::Generate,
            Intent::Validate,
            Intent::Transform,
            Intent::Aggregate,
            Intent::Filter,
            Intent::Enrich,
            Intent::Conditional,
        ] {
            let ctx = HandlerContext {
                step_id: "s1".into(),
                agent_id: "a1".into(),
                user_id: "u1".into(),
                intent,
                step_input: serde_json::json!({"prompt": "hi", "condition": {}}),
                budget: orchestra_core::TokenBudget::new(10_000, false, 0),
                compression_policy: orchestra_core::CompressionPolicy::default(),
                routing: orchestra_core::RoutingDecision {
                    tier: orchestra_core::Tier::Fast,
                    model: "fast-tier-default".into(),
                    provider: "dynamic".into(),
                    reason: "test".into(),
                    estimated_cost: rust_decimal::Decimal::ZERO,
                    estimated_latency_ms: orchestra_core::DurationMs::ZERO,
                    agent_ais: None,
                },
                orchestration_metadata: test_metadata(),
                memory_block: None,
                context_variables: std::collections::HashMap::new(),
            };
            let result = registry.dispatch(&ctx).await;
            assert!(result.success, "{intent:?} handler should succeed");
        }
    }
}
