//! Compression failure kinds.

use thiserror::Error;

/// Failures from the Compression Service. Never surfaces past [`crate::CompressionService::compress`] —
/// any strategy error is caught and yields the identity fallback, logged as
/// a warning with the measured (failing) quality.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompressionError {
    /// The semantic strategy's provider call failed.
    #[error("provider call failed: {0}")]
    ProviderFailed(#[from] orchestra_core::ProviderError),

    /// A non-LLM strategy (structural/template/truncate) failed internally.
    #[error("strategy failed: {0}")]
    StrategyFailed(String),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
