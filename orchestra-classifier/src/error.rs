//! Classification failure kinds. Per the propagation policy, none of
//! these ever surface past the classifier — they degrade to a lower tier
//! or to `generate` at reduced confidence.

use thiserror::Error;

/// Internal classifier failures. Callers of [`crate::IntentClassifier`]
/// never see this type directly — [`crate::IntentClassifier::classify`]
/// always returns a usable [`orchestra_core::IntentClassification`],
/// degrading silently on any of these.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClassifierError {
    /// The LLM provider call failed (timeout, rejection, transport error).
    #[error("provider call failed: {0}")]
    ProviderFailed(#[from] orchestra_core::ProviderError),

    /// The LLM response did not contain a parseable `{intent, confidence,
    /// reasoning}` JSON object.
    #[error("could not parse classification response: {0}")]
    UnparseableResponse(String),

    /// The LLM returned an intent outside the closed ten-value set.
    #[error("response named an intent outside the closed set: {0}")]
    IntentOutsideClosedSet(String),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
