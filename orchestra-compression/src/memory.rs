//! Memory Compressor (§4.7): compresses a persisted agent memory block
//! while preserving recent sections verbatim.

use crate::CompressionService;
use orchestra_core::compression::estimate_tokens;
use orchestra_core::{Aggressiveness, CompressionPolicy, CompressionResult, CompressionStrategy, Intent, LlmProvider};

/// The up-to-three sections a memory block is assembled from. Recent runs
/// are ordered newest first.
#[derive(Debug, Clone, Default)]
pub struct MemorySections {
    /// The agent's user-profile summary, if present.
    pub user_profile: Option<String>,
    /// Recent-run summaries, newest first.
    pub recent_runs: Vec<String>,
    /// Learned-pattern notes, if present.
    pub learned_patterns: Option<String>,
}

/// Memory-compression policy, distinct from the per-intent
/// [`CompressionPolicy`] — preserved sections never pass through
/// compression at all.
#[derive(Debug, Clone, Copy)]
pub struct MemoryCompressionPolicy {
    /// Emit the user profile verbatim (default true).
    pub preserve_user_context: bool,
    /// Number of newest recent-run entries emitted verbatim (default 2).
    pub preserve_recent_runs: usize,
    /// Target output/input ratio for the compressible remainder (default 0.3).
    pub target_ratio: f64,
    /// Strategy applied to the compressible remainder (default semantic).
    pub strategy: CompressionStrategy,
    /// Quality floor for the compressible remainder (default 0.8).
    pub min_quality_score: f64,
}

impl Default for MemoryCompressionPolicy {
    fn default() -> Self {
        Self {
            preserve_user_context: true,
            preserve_recent_runs: 2,
            target_ratio: 0.3,
            strategy: CompressionStrategy::Semantic,
            min_quality_score: 0.8,
        }
    }
}

const ADDITIONAL_CONTEXT_HEADER: &str = "Additional context:";

/// Compresses [`MemorySections`] into a single reassembled memory block.
pub struct MemoryCompressor<P: LlmProvider> {
    service: CompressionService<P>,
}

impl<P: LlmProvider> MemoryCompressor<P> {
    /// Build a memory compressor over the given compression service.
    pub fn new(service: CompressionService<P>) -> Self {
        Self { service }
    }

    /// Compress `sections` under `policy`. If `target_tokens` is given, the
    /// effective target ratio is recomputed to fit the remaining budget
    /// after preserved sections.
    pub async fn compress(
        &self,
        sections: &MemorySections,
        policy: &MemoryCompressionPolicy,
        target_tokens: Option<u64>,
    ) -> (String, CompressionResult) {
        let mut preserved = Vec::new();
        if policy.preserve_user_context {
            if let Some(profile) = &sections.user_profile {
                preserved.push(profile.clone());
            }
        }

        let preserved_runs: Vec<&String> = sections.recent_runs.iter().take(policy.preserve_recent_runs).collect();
        preserved.extend(preserved_runs.iter().map(|s| (*s).clone()));

        let remaining_runs: Vec<&String> = sections.recent_runs.iter().skip(policy.preserve_recent_runs).collect();
        let mut compressible_parts: Vec<String> = remaining_runs.into_iter().cloned().collect();
        if let Some(patterns) = &sections.learned_patterns {
            compressible_parts.push(patterns.clone());
        }
        let compressible = compressible_parts.join("\n");

        let preserved_text = preserved.join("\n");
        let preserved_tokens = estimate_tokens(&preserved_text);

        if compressible.is_empty() {
            let result = CompressionResult {
                content: String::new(),
                input_tokens: 0,
                output_tokens: 0,
                ratio: 1.0,
                quality_score: 1.0,
                strategy_used: CompressionStrategy::None,
            };
            return (preserved_text, result);
        }

        let target_ratio = match target_tokens {
            Some(budget) => {
                let compressible_tokens = estimate_tokens(&compressible).max(1);
                let remaining_budget = (budget as i64) - (preserved_tokens as i64);
                if remaining_budget <= 0 {
                    0.0
                } else {
                    (1.0 - (remaining_budget as f64) / (compressible_tokens as f64)).clamp(0.0, 1.0)
                }
            }
            None => policy.target_ratio,
        };

        let compression_policy = CompressionPolicy {
            enabled: true,
            strategy: policy.strategy,
            target_ratio,
            min_quality_score: policy.min_quality_score,
            aggressiveness: Aggressiveness::Medium,
        };

        let result = self.service.compress(&compressible, &compression_policy, Intent::Summarize).await;

        let has_section_markers = result.content.contains('#') || result.content.contains(':');
        let mut reassembled = preserved_text.clone();
        if !reassembled.is_empty() {
            reassembled.push('\n');
        }
        if !has_section_markers {
            reassembled.push_str(ADDITIONAL_CONTEXT_HEADER);
            reassembled.push('\n');
        }
        reassembled.push_str(&result.content);

        (reassembled, result)
    }
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
            Ok(ChatResponse { content: "compressed patterns".to_string(), usage: ChatUsage::default() })
        }
    }

    #[tokio::test]
    async fn recent_runs_within_preserve_count_are_verbatim() {
        let service = CompressionService::new(StubProvider, "fast-tier-default");
        let compressor = MemoryCompressor::new(service);

        let sections = MemorySections {
            user_profile: Some("User likes concise summaries.".to_string()),
            recent_runs: vec!["run-3".to_string(), "run-2".to_string(), "run-1".to_string()],
            learned_patterns: Some("Pattern: always confirm before sending email.".to_string()),
        };
        let policy = MemoryCompressionPolicy::default();

        let (reassembled, _result) = compressor.compress(&sections, &policy, None).await;
        assert!(reassembled.contains("User likes concise summaries."));
        assert!(reassembled.contains("run-3"));
        assert!(reassembled.contains("run-2"));
        assert!(!reassembled.contains("run-1") || reassembled.contains("compressed patterns"));
    }

    #[tokio::test]
    async fn empty_compressible_portion_skips_compression() {
        let service = CompressionService::new(StubProvider, "fast-tier-default");
        let compressor = MemoryCompressor::new(service);
        let sections = MemorySections {
            user_profile: Some("profile".to_string()),
            recent_runs: vec!["only-run".to_string()],
            learned_patterns: None,
        };
        let policy = MemoryCompressionPolicy { preserve_recent_runs: 5, ..MemoryCompressionPolicy::default() };
        let (reassembled, result) = compressor.compress(&sections, &policy, None).await;
        assert_eq!(result.strategy_used, CompressionStrategy::None);
        assert!(reassembled.contains("profile"));
        assert!(reassembled.contains("only-run"));
    }
}
