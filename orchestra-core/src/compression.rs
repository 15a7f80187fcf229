//! Compression policy and result types shared by the Compression Service
//! and Memory Compressor.

use serde::{Deserialize, Serialize};

/// Which transform the Compression Service applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionStrategy {
    /// Delegates to a fast LLM with an intent-specific system prompt.
    Semantic,
    /// Whitespace/punctuation normalization, no LLM.
    Structural,
    /// Intent-keyed phrase substitution, no LLM.
    Template,
    /// Character-budget truncation at a sentence boundary, no LLM.
    Truncate,
    /// No compression applied — the identity fallback.
    None,
}

/// How aggressively a strategy should shrink content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggressiveness {
    Low,
    Medium,
    High,
}

/// The declarative description of how to shrink content for an intent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CompressionPolicy {
    /// Whether compression runs at all for this step/intent.
    pub enabled: bool,
    /// Strategy to apply.
    pub strategy: CompressionStrategy,
    /// Desired fraction of input tokens to cut, in `[0, 1]`. The target
    /// retained fraction is `1.0 - target_ratio`.
    pub target_ratio: f64,
    /// Quality floor in `[0, 1]`; below this the identity fallback applies.
    pub min_quality_score: f64,
    /// How aggressively to shrink.
    pub aggressiveness: Aggressiveness,
}

impl Default for CompressionPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            strategy: CompressionStrategy::Structural,
            target_ratio: 0.5,
            min_quality_score: 0.7,
            aggressiveness: Aggressiveness::Medium,
        }
    }
}

/// The outcome of applying a [`CompressionPolicy`] to a piece of content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionResult {
    /// The (possibly compressed) output content.
    pub content: String,
    /// Estimated input token count (`chars/4`).
    pub input_tokens: u64,
    /// Estimated output token count (`chars/4`).
    pub output_tokens: u64,
    /// `output_tokens / input_tokens`, or 1.0 if input was empty.
    pub ratio: f64,
    /// Quality score in `[0, 1]` assigned by the strategy.
    pub quality_score: f64,
    /// The strategy actually used — `none` if the quality gate rejected
    /// the attempted strategy and the original was returned.
    pub strategy_used: CompressionStrategy,
}

/// Estimate tokens as `ceil(chars / 4)`, the uniform approximation used
/// throughout the core. Accurate tokenization happens at the provider layer.
pub fn estimate_tokens(text: &str) -> u64 {
    let chars = text.chars().count() as u64;
    chars.div_ceil(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_rounds_up() {
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
        assert_eq!(estimate_tokens(""), 0);
    }
}
