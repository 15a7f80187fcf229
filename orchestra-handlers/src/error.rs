//! Handler failure kinds. Per the propagation policy, handler failures
//! never cross the handler boundary as exceptions — they are converted to
//! `HandlerResult { success: false, error }` by the registry's scaffolding.

use thiserror::Error;

/// Internal handler failure kinds, converted to a failing [`orchestra_core::HandlerResult`]
/// before leaving [`crate::HandlerRegistry::dispatch`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HandlerError {
    /// The step's budget could not afford the handler's estimated tokens.
    #[error("budget exceeded: step {step_id} needs {required} tokens, ceiling is {ceiling}")]
    BudgetExceeded { step_id: String, required: u64, ceiling: u64 },

    /// `IntentHandler::validate` returned false.
    #[error("validation failed for step {0}")]
    ValidationFailed(String),

    /// No handler is registered for the given intent.
    #[error("no handler registered for intent {0:?}")]
    NoHandlerRegistered(orchestra_core::Intent),

    /// The handler's provider/plugin call failed.
    #[error("provider call failed: {0}")]
    ProviderFailed(#[from] orchestra_core::ProviderError),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
