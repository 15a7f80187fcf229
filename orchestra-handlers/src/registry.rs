//! Intent Handler Registry + base scaffolding (§4.8, §9 "Registry of intent
//! handlers" — a closed enumeration of ten intents mapped to a handler
//! trait; new intents require adding both the enum variant and a handler).

use crate::context::HandlerContext;
use crate::error::HandlerError;
use async_trait::async_trait;
use orchestra_core::{HandlerResult, Intent, TokenUsage};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

/// One intent's execution contract. A closed set of ten concrete
/// implementations exists, one per [`Intent`] variant.
#[async_trait]
pub trait IntentHandler: Send + Sync {
    /// Estimate the tokens this invocation will consume, for the budget
    /// check the registry runs before calling [`IntentHandler::handle`].
    fn estimate_tokens(&self, ctx: &HandlerContext) -> u64;

    /// Whether `ctx` is well-formed enough to execute (e.g. required input
    /// fields present). Never performs I/O.
    fn validate(&self, ctx: &HandlerContext) -> bool;

    /// Execute the step. Only called once budget and validation both pass.
    async fn handle(&self, ctx: &HandlerContext) -> Result<HandlerResult, HandlerError>;
}

fn failure(error: HandlerError) -> HandlerResult {
    tracing::warn!(%error, "handler scaffolding rejected step before execution");
    HandlerResult {
        success: false,
        output: None,
        tokens_used: TokenUsage::default(),
        cost: Decimal::ZERO,
        latency: orchestra_core::DurationMs::ZERO,
        quality: None,
        compressed: None,
        error: Some(error.to_string()),
        metadata: None,
    }
}

/// Maps each [`Intent`] to its handler. Dispatch applies the base
/// scaffolding — budget check, then validation — before invoking the
/// handler itself (§4.8 "Handlers must refuse to run when the budget check
/// fails").
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<Intent, Arc<dyn IntentHandler>>,
}

impl HandlerRegistry {
    /// Build an empty registry.
    pub fn new() -> Self {
        Self { handlers: HashMap::new() }
    }

    /// Register (or replace) the handler for `intent`.
    pub fn register(&mut self, intent: Intent, handler: Arc<dyn IntentHandler>) {
        self.handlers.insert(intent, handler);
    }

    /// Estimate tokens for `intent` against `ctx` without executing —
    /// used by the driver's budget check, which runs before routing
    /// re-selects a model for the step (§4.9's `STEP_BUDGET_CHECK`
    /// precedes `STEP_ROUTE`). Returns `None` if no handler is registered.
    pub fn estimate_tokens(&self, intent: Intent, ctx: &HandlerContext) -> Option<u64> {
        self.handlers.get(&intent).map(|h| h.estimate_tokens(ctx))
    }

    /// Run the scaffolding and, if it passes, the handler for `ctx.intent`.
    /// Never panics or propagates an error — a missing handler, a failed
    /// budget check, or a failed validation all produce a failing
    /// [`HandlerResult`].
    pub async fn dispatch(&self, ctx: &HandlerContext) -> HandlerResult {
        let Some(handler) = self.handlers.get(&ctx.intent) else {
            return failure(HandlerError::NoHandlerRegistered(ctx.intent));
        };

        let required = handler.estimate_tokens(ctx);
        if !ctx.budget.can_afford(required) {
            return failure(HandlerError::BudgetExceeded {
                step_id: ctx.step_id.to_string(),
                required,
                ceiling: ctx.budget.ceiling(),
            });
        }

        if !handler.validate(ctx) {
            return failure(HandlerError::ValidationFailed(ctx.step_id.to_string()));
        }

        match handler.handle(ctx).await {
            Ok(result) => result,
            Err(e) => failure(e),
        }
    }
}
