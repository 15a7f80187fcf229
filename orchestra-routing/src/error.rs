//! Routing failure kinds.

use thiserror::Error;

/// Failures from the Routing Service. Never surfaces past [`crate::route`] —
/// a failure here degrades to the `balanced` tier with a documented default
/// model, logged with the reason.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RoutingError {
    /// Complexity scoring could not be completed (e.g. malformed condition
    /// tree JSON).
    #[error("complexity scoring failed: {0}")]
    ComplexityScoringFailed(String),

    /// No model profile is configured for `(tier, intent)`.
    #[error("no model configured for tier {tier:?} intent {intent:?}")]
    ConfigLookupFailed {
        /// Selected tier.
        tier: orchestra_core::Tier,
        /// Classified intent.
        intent: orchestra_core::Intent,
    },

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
