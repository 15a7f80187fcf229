//! Documented defaults for every configuration field, per §4.1-§4.5.

use crate::{
    BucketThresholds, ClassifierThresholds, ComplexityWeights, CompressionDefaults,
    MixingWeights, ModelProfile, OrchestrationConfig, OverageConfig, TierThresholds,
};
use orchestra_core::{Intent, Tier};
use std::collections::HashMap;

impl OrchestrationConfig {
    /// Build the documented-default configuration, used both as the
    /// baseline before any key is read and as the fallback for any key
    /// that fails to parse.
    pub fn defaults() -> Self {
        Self {
            intent_budgets: intent_budget_defaults(),
            intent_priority: intent_priority_defaults(),
            compression_defaults: compression_defaults(),
            memory_compression_defaults: CompressionDefaults {
                target_ratio: 0.3,
                min_quality_score: 0.8,
            },
            tier_thresholds: TierThresholds { fast: 3.0, balanced: 6.5 },
            models: model_defaults(),
            complexity_weights: complexity_weight_defaults(),
            bucket_thresholds: bucket_threshold_defaults(),
            mixing_weights: MixingWeights { agent: 0.6, step: 0.4 },
            classifier_thresholds: ClassifierThresholds {
                tier1_confidence: 0.9,
                tier2_confidence: 0.9,
                disagreement: 0.3,
            },
            overage: OverageConfig { threshold: 1.2 },
            per_step_cap: 4000,
            workflow_cap: 20_000,
        }
    }
}

/// Per-intent baseline budgets used by proportional/priority allocation,
/// ranging from 300 (`conditional`) to 2500 (`generate`).
fn intent_budget_defaults() -> HashMap<Intent, u64> {
    use Intent::*;
    HashMap::from([
        (Generate, 2500),
        (Validate, 1500),
        (Summarize, 1200),
        (Enrich, 1200),
        (Transform, 1000),
        (Aggregate, 1000),
        (Extract, 800),
        (Send, 500),
        (Filter, 400),
        (Conditional, 300),
    ])
}

/// Per-intent priority multipliers for the *priority* allocation strategy.
fn intent_priority_defaults() -> HashMap<Intent, f64> {
    use Intent::*;
    HashMap::from([
        (Generate, 1.5),
        (Validate, 1.3),
        (Extract, 1.2),
        (Conditional, 0.5),
        (Filter, 0.5),
        (Summarize, 1.0),
        (Send, 1.0),
        (Transform, 1.0),
        (Aggregate, 1.0),
        (Enrich, 1.0),
    ])
}

fn compression_defaults() -> HashMap<Intent, CompressionDefaults> {
    use Intent::*;
    let mut map = HashMap::new();
    for intent in [
        Extract, Summarize, Generate, Validate, Send, Transform, Conditional, Aggregate, Filter,
        Enrich,
    ] {
        map.insert(intent, CompressionDefaults { target_ratio: 0.5, min_quality_score: 0.7 });
    }
    // Summarization is the compression-service's own intent target for
    // memory compaction — allow a slightly more aggressive default ratio.
    map.insert(Summarize, CompressionDefaults { target_ratio: 0.4, min_quality_score: 0.75 });
    map
}

fn model_defaults() -> HashMap<(Tier, Intent), ModelProfile> {
    use Intent::*;
    use Tier::*;
    let intents = [
        Extract, Summarize, Generate, Validate, Send, Transform, Conditional, Aggregate, Filter,
        Enrich,
    ];
    let mut map = HashMap::new();
    for intent in intents {
        map.insert(
            (Fast, intent),
            ModelProfile {
                provider: "dynamic".into(),
                model: "fast-tier-default".into(),
                max_tokens: 1500,
                temperature: 0.5,
                cost_per_token: 0.0000005,
                avg_latency_ms: 400,
            },
        );
        map.insert(
            (Balanced, intent),
            ModelProfile {
                provider: "dynamic".into(),
                model: "balanced-tier-default".into(),
                max_tokens: 4000,
                temperature: 0.6,
                cost_per_token: 0.000002,
                avg_latency_ms: 1200,
            },
        );
        map.insert(
            (Powerful, intent),
            ModelProfile {
                provider: "dynamic".into(),
                model: "powerful-tier-default".into(),
                max_tokens: 8000,
                temperature: 0.3,
                cost_per_token: 0.00001,
                avg_latency_ms: 3500,
            },
        );
    }
    map
}

/// Fixed reasoning-depth and output-complexity scores per step-kind,
/// folded into a uniform weight set (all six factors weighted equally by
/// default; deployments tune this per step-kind via config).
fn complexity_weight_defaults() -> HashMap<String, ComplexityWeights> {
    let uniform = ComplexityWeights {
        prompt_length: 1.0 / 6.0,
        data_size: 1.0 / 6.0,
        condition_count: 1.0 / 6.0,
        context_depth: 1.0 / 6.0,
        reasoning_depth: 1.0 / 6.0,
        output_complexity: 1.0 / 6.0,
    };
    HashMap::from([("default".to_string(), uniform)])
}

fn bucket_threshold_defaults() -> HashMap<String, BucketThresholds> {
    let mut map = HashMap::new();
    map.insert(
        "prompt_length".to_string(),
        BucketThresholds { medium: 200.0, high: 800.0, extreme: 2000.0 },
    );
    map.insert(
        "data_size".to_string(),
        BucketThresholds { medium: 500.0, high: 5_000.0, extreme: 50_000.0 },
    );
    map.insert(
        "condition_count".to_string(),
        BucketThresholds { medium: 2.0, high: 5.0, extreme: 10.0 },
    );
    map.insert(
        "context_depth".to_string(),
        BucketThresholds { medium: 2.0, high: 5.0, extreme: 10.0 },
    );
    map
}
