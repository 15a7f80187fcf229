//! The only error type that crosses the embedder boundary (§7 propagation
//! policy). Every other internal failure is absorbed — logged and/or
//! audited — by the component that owns it.

use orchestra_core::StepId;
use thiserror::Error;

/// Failures the Workflow Orchestrator surfaces to its embedder.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OrchestratorError {
    /// The step would consume more than its allocated (+overage) budget.
    #[error("step {step_id} would exceed its token budget ({required} > {ceiling})")]
    BudgetExceeded {
        /// The step that was refused.
        step_id: StepId,
        /// Tokens the handler estimated it would need.
        required: u64,
        /// The step's budget ceiling (allocated + overage, if permitted).
        ceiling: u64,
    },

    /// The handler returned `HandlerResult{success: false, ..}`.
    #[error("step {step_id} handler failed: {reason}")]
    HandlerFailed {
        /// The step that failed.
        step_id: StepId,
        /// The handler's reported error message.
        reason: String,
    },

    /// `execute_step`/`complete` was called against a step id or in a
    /// state the driver does not recognize (not a spec error kind — a
    /// caller-contract violation).
    #[error("{0}")]
    InvalidCall(String),
}
