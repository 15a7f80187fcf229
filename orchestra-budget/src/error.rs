//! Budget and predictor failure kinds.

use thiserror::Error;

/// Failures from the Token Budget Manager. Per the propagation policy,
/// only [`BudgetError::Exceeded`] ever surfaces past the budget manager —
/// it is the one internal error that becomes a step failure.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BudgetError {
    /// The step would consume more than its allocated (+overage) budget.
    #[error("step {0} would exceed its token budget")]
    Exceeded(String),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Failures from the Budget Predictor. Never surfaces past the predictor —
/// a failure here just means the Budget Manager falls back to
/// proportional allocation for that step.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PredictorError {
    /// The underlying historical-sample query failed.
    #[error("historical sample query failed: {0}")]
    QueryFailed(String),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
