#![deny(missing_docs)]
//! # orchestra-compression — Compression Service + Memory Compressor (§4.6-4.7)
//!
//! [`CompressionService::compress`] never fails outwardly: any strategy
//! error, or a quality score below the policy floor, yields the original
//! content back with `strategy_used = none` and `ratio = 1.0` (P6).

mod error;
mod memory;
mod strategies;

pub use error::CompressionError;
pub use memory::{MemoryCompressionPolicy, MemoryCompressor, MemorySections};

use orchestra_core::compression::estimate_tokens;
use orchestra_core::{
    Aggressiveness, ChatMessage, ChatMetadata, CompressionPolicy, CompressionResult,
    CompressionStrategy, Intent, LlmProvider,
};

/// Applies a [`CompressionPolicy`] to a piece of content for a given
/// intent, delegating the `semantic` strategy to an [`LlmProvider`].
pub struct CompressionService<P: LlmProvider> {
    provider: P,
    semantic_model: String,
}

impl<P: LlmProvider> CompressionService<P> {
    /// Build a compression service. `semantic_model` names the fast-tier
    /// model used for the `semantic` strategy.
    pub fn new(provider: P, semantic_model: impl Into<String>) -> Self {
        Self { provider, semantic_model: semantic_model.into() }
    }

    /// Compress `content` under `policy` for `intent`. Applies the quality
    /// gate: if the achieved quality is below `policy.min_quality_score`,
    /// returns the original content with `strategy_used = none`.
    pub async fn compress(&self, content: &str, policy: &CompressionPolicy, intent: Intent) -> CompressionResult {
        if !policy.enabled {
            return identity(content);
        }

        let attempt = match policy.strategy {
            CompressionStrategy::Semantic => self.semantic(content, policy, intent).await,
            CompressionStrategy::Structural => Ok(strategies::structural(content, policy.aggressiveness)),
            CompressionStrategy::Template => Ok(strategies::template(content, intent)),
            CompressionStrategy::Truncate => {
                Ok(strategies::truncate(content, policy.target_ratio, policy.aggressiveness))
            }
            CompressionStrategy::None => Ok(identity(content)),
        };

        match attempt {
            Ok(result) if result.quality_score >= policy.min_quality_score => result,
            Ok(result) => {
                tracing::warn!(
                    quality_score = result.quality_score,
                    floor = policy.min_quality_score,
                    strategy = ?policy.strategy,
                    "compression quality below floor, returning original content"
                );
                identity_with_measured_quality(content, result.quality_score)
            }
            Err(e) => {
                tracing::warn!(error = %e, strategy = ?policy.strategy, "compression strategy failed, returning original content");
                identity(content)
            }
        }
    }

    async fn semantic(&self, content: &str, policy: &CompressionPolicy, intent: Intent) -> Result<CompressionResult, CompressionError> {
        let input_tokens = estimate_tokens(content);
        let target_tokens = ((input_tokens as f64) * (1.0 - policy.target_ratio)).max(1.0);

        let system_prompt = format!(
            "You compress text for a workflow step classified as '{intent:?}'. \
             Aggressiveness: {:?}. Target roughly {target_tokens:.0} tokens of output. \
             Preserve task-critical information; drop redundancy.",
            policy.aggressiveness
        );
        let messages = [ChatMessage::system(system_prompt), ChatMessage::user(content.to_string())];
        let max_tokens = (target_tokens * 2.0).ceil().min(u32::MAX as f64) as u32;

        let response = self
            .provider
            .chat_completion(&self.semantic_model, &messages, 0.3, max_tokens, &ChatMetadata::default())
            .await?;

        let output_tokens = estimate_tokens(&response.content);
        let ratio = if input_tokens == 0 { 1.0 } else { (output_tokens as f64) / (input_tokens as f64) };

        let base_quality = match policy.aggressiveness {
            Aggressiveness::Low => 0.9,
            Aggressiveness::Medium => 0.85,
            Aggressiveness::High => 0.8,
        };
        // `ratio` is the retained fraction (output/input); the target retained
        // fraction is the complement of `target_ratio`, the fraction to cut.
        let target_retained = 1.0 - policy.target_ratio;
        let quality_score = if (ratio - target_retained).abs() <= 0.1 {
            (base_quality + 0.05).min(1.0)
        } else if ratio > target_retained + 0.2 {
            (base_quality - 0.1).max(0.0)
        } else {
            base_quality
        };

        Ok(CompressionResult {
            content: response.content,
            input_tokens,
            output_tokens,
            ratio,
            quality_score,
            strategy_used: CompressionStrategy::Semantic,
        })
    }
}

fn identity(content: &str) -> CompressionResult {
    let tokens = estimate_tokens(content);
    CompressionResult {
        content: content.to_string(),
        input_tokens: tokens,
        output_tokens: tokens,
        ratio: 1.0,
        quality_score: 1.0,
        strategy_used: CompressionStrategy::None,
    }
}

fn identity_with_measured_quality(content: &str, measured_quality: f64) -> CompressionResult {
    let tokens = estimate_tokens(content);
    CompressionResult {
        content: content.to_string(),
        input_tokens: tokens,
        output_tokens: tokens,
        ratio: 1.0,
        quality_score: measured_quality,
        strategy_used: CompressionStrategy::None,
    }
}
