#![deny(missing_docs)]
//! # orchestra-config — the Configuration Store (§4.1)
//!
//! Provides typed reads of named configuration keys from a durable
//! key/value collaborator ([`orchestra_core::ConfigTable`]). Values are
//! cached per-process in an [`ArcSwap`] and only re-read on an explicit
//! [`ConfigStore::reload`] call. Parse failures for an individual key
//! degrade that field to its documented default and emit a
//! `tracing::warn!` — `reload` itself never fails.

use arc_swap::ArcSwap;
use orchestra_core::{ConfigTable, Intent, Tier};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

fn parse_tier(s: &str) -> Option<Tier> {
    match s {
        "fast" => Some(Tier::Fast),
        "balanced" => Some(Tier::Balanced),
        "powerful" => Some(Tier::Powerful),
        _ => None,
    }
}

mod defaults;
pub use defaults::*;

/// Per-intent baseline token budget, used by the proportional and
/// priority allocation strategies.
pub type IntentBudgets = HashMap<Intent, u64>;

/// Compression policy parameters for one intent (or for memory).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CompressionDefaults {
    pub target_ratio: f64,
    pub min_quality_score: f64,
}

/// Bucket thresholds a raw measurement is mapped through to produce a
/// `{low=2, med=5, high=7, extreme=9}` factor score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BucketThresholds {
    /// Values at or above this map to "extreme" (score 9).
    pub extreme: f64,
    /// Values at or above this (but below `extreme`) map to "high" (score 7).
    pub high: f64,
    /// Values at or above this (but below `high`) map to "medium" (score 5).
    pub medium: f64,
    // anything below `medium` maps to "low" (score 2)
}

impl BucketThresholds {
    /// Map a raw measurement to its bucketed factor score.
    pub fn bucket(&self, value: f64) -> f64 {
        if value >= self.extreme {
            9.0
        } else if value >= self.high {
            7.0
        } else if value >= self.medium {
            5.0
        } else {
            2.0
        }
    }
}

/// Per-step-kind weight set used to combine the six complexity factors
/// into a composite score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ComplexityWeights {
    pub prompt_length: f64,
    pub data_size: f64,
    pub condition_count: f64,
    pub context_depth: f64,
    pub reasoning_depth: f64,
    pub output_complexity: f64,
}

/// Static per-tier model table entry used by the Routing Service's model
/// selection for a `(tier, intent)` pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelProfile {
    pub provider: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub cost_per_token: f64,
    pub avg_latency_ms: u64,
}

/// Mixing weights for effective complexity: `effective = agent * w_agent +
/// step * w_step`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MixingWeights {
    pub agent: f64,
    pub step: f64,
}

/// Tier-selection thresholds on effective complexity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TierThresholds {
    pub fast: f64,
    pub balanced: f64,
}

/// Classifier escalation thresholds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClassifierThresholds {
    pub tier1_confidence: f64,
    pub tier2_confidence: f64,
    pub disagreement: f64,
}

/// Budget-manager overage policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OverageConfig {
    pub threshold: f64,
}

/// The fully-typed, defaulted snapshot of every tunable the core reads.
/// Assembled once from a [`ConfigTable`] and swapped atomically on reload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationConfig {
    pub intent_budgets: IntentBudgets,
    pub intent_priority: HashMap<Intent, f64>,
    pub compression_defaults: HashMap<Intent, CompressionDefaults>,
    pub memory_compression_defaults: CompressionDefaults,
    pub tier_thresholds: TierThresholds,
    pub models: HashMap<(orchestra_core::Tier, Intent), ModelProfile>,
    pub complexity_weights: HashMap<String, ComplexityWeights>,
    pub bucket_thresholds: HashMap<String, BucketThresholds>,
    pub mixing_weights: MixingWeights,
    pub classifier_thresholds: ClassifierThresholds,
    pub overage: OverageConfig,
    pub per_step_cap: u64,
    pub workflow_cap: u64,
}

/// The process-wide, cached configuration snapshot. Cheap to clone (it's
/// an `Arc` handle); `reload()` is the only way the snapshot changes.
pub struct ConfigStore<T: ConfigTable> {
    table: T,
    current: ArcSwap<OrchestrationConfig>,
}

impl<T: ConfigTable> ConfigStore<T> {
    /// Build a store, performing an initial load from `table`.
    pub async fn new(table: T) -> Self {
        let initial = Self::load(&table).await;
        Self { table, current: ArcSwap::new(Arc::new(initial)) }
    }

    /// Current configuration snapshot. Cheap — an `Arc` clone.
    pub fn current(&self) -> Arc<OrchestrationConfig> {
        self.current.load_full()
    }

    /// Re-read every key from the underlying table and atomically swap
    /// in the new snapshot. Never fails — individual key parse failures
    /// degrade to defaults with a warning log.
    pub async fn reload(&self) {
        let fresh = Self::load(&self.table).await;
        self.current.store(Arc::new(fresh));
    }

    async fn load(table: &T) -> OrchestrationConfig {
        let mut cfg = OrchestrationConfig::defaults();

        if let Some(raw) = table.get_raw("orchestration.intent_budgets").await {
            match serde_json::from_str::<HashMap<String, u64>>(&raw) {
                Ok(map) => {
                    for (k, v) in map {
                        if let Some(intent) = Intent::parse(&k) {
                            cfg.intent_budgets.insert(intent, v);
                        }
                    }
                }
                Err(e) => tracing::warn!(key = "orchestration.intent_budgets", error = %e, "config parse failure, using defaults"),
            }
        }

        if let Some(raw) = table.get_raw("orchestration.workflow_cap").await {
            match raw.parse::<u64>() {
                Ok(v) => cfg.workflow_cap = v,
                Err(e) => tracing::warn!(key = "orchestration.workflow_cap", error = %e, "config parse failure, using default"),
            }
        }

        if let Some(raw) = table.get_raw("orchestration.per_step_cap").await {
            match raw.parse::<u64>() {
                Ok(v) => cfg.per_step_cap = v,
                Err(e) => tracing::warn!(key = "orchestration.per_step_cap", error = %e, "config parse failure, using default"),
            }
        }

        if let Some(raw) = table.get_raw("orchestration.tier_thresholds").await {
            match serde_json::from_str::<TierThresholds>(&raw) {
                Ok(v) => cfg.tier_thresholds = v,
                Err(e) => tracing::warn!(key = "orchestration.tier_thresholds", error = %e, "config parse failure, using default"),
            }
        }

        if let Some(raw) = table.get_raw("orchestration.mixing_weights").await {
            match serde_json::from_str::<MixingWeights>(&raw) {
                Ok(v) => cfg.mixing_weights = v,
                Err(e) => tracing::warn!(key = "orchestration.mixing_weights", error = %e, "config parse failure, using default"),
            }
        }

        if let Some(raw) = table.get_raw("orchestration.classifier_thresholds").await {
            match serde_json::from_str::<ClassifierThresholds>(&raw) {
                Ok(v) => cfg.classifier_thresholds = v,
                Err(e) => tracing::warn!(key = "orchestration.classifier_thresholds", error = %e, "config parse failure, using default"),
            }
        }

        if let Some(raw) = table.get_raw("orchestration.overage").await {
            match serde_json::from_str::<OverageConfig>(&raw) {
                Ok(v) => cfg.overage = v,
                Err(e) => tracing::warn!(key = "orchestration.overage", error = %e, "config parse failure, using default"),
            }
        }

        if let Some(raw) = table.get_raw("orchestration.intent_priority").await {
            match serde_json::from_str::<HashMap<String, f64>>(&raw) {
                Ok(map) => {
                    for (k, v) in map {
                        if let Some(intent) = Intent::parse(&k) {
                            cfg.intent_priority.insert(intent, v);
                        }
                    }
                }
                Err(e) => tracing::warn!(key = "orchestration.intent_priority", error = %e, "config parse failure, using defaults"),
            }
        }

        if let Some(raw) = table.get_raw("orchestration.compression_defaults").await {
            match serde_json::from_str::<HashMap<String, CompressionDefaults>>(&raw) {
                Ok(map) => {
                    for (k, v) in map {
                        if let Some(intent) = Intent::parse(&k) {
                            cfg.compression_defaults.insert(intent, v);
                        }
                    }
                }
                Err(e) => tracing::warn!(key = "orchestration.compression_defaults", error = %e, "config parse failure, using defaults"),
            }
        }

        if let Some(raw) = table.get_raw("orchestration.memory_compression_defaults").await {
            match serde_json::from_str::<CompressionDefaults>(&raw) {
                Ok(v) => cfg.memory_compression_defaults = v,
                Err(e) => tracing::warn!(key = "orchestration.memory_compression_defaults", error = %e, "config parse failure, using default"),
            }
        }

        if let Some(raw) = table.get_raw("orchestration.models").await {
            match serde_json::from_str::<HashMap<String, ModelProfile>>(&raw) {
                Ok(map) => {
                    for (k, v) in map {
                        if let Some((tier_part, intent_part)) = k.split_once(':') {
                            if let (Some(tier), Some(intent)) = (parse_tier(tier_part), Intent::parse(intent_part)) {
                                cfg.models.insert((tier, intent), v);
                            }
                        }
                    }
                }
                Err(e) => tracing::warn!(key = "orchestration.models", error = %e, "config parse failure, using defaults"),
            }
        }

        if let Some(raw) = table.get_raw("orchestration.complexity_weights").await {
            match serde_json::from_str::<HashMap<String, ComplexityWeights>>(&raw) {
                Ok(map) => cfg.complexity_weights = map,
                Err(e) => tracing::warn!(key = "orchestration.complexity_weights", error = %e, "config parse failure, using defaults"),
            }
        }

        if let Some(raw) = table.get_raw("orchestration.bucket_thresholds").await {
            match serde_json::from_str::<HashMap<String, BucketThresholds>>(&raw) {
                Ok(map) => cfg.bucket_thresholds = map,
                Err(e) => tracing::warn!(key = "orchestration.bucket_thresholds", error = %e, "config parse failure, using defaults"),
            }
        }

        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap as StdHashMap;
    use tokio::sync::Mutex;

    struct FakeTable(Mutex<StdHashMap<String, String>>);

    #[async_trait]
    impl ConfigTable for FakeTable {
        async fn get_raw(&self, key: &str) -> Option<String> {
            self.0.lock().await.get(key).cloned()
        }
    }

    #[tokio::test]
    async fn unknown_keys_fall_back_to_documented_defaults() {
        let table = FakeTable(Mutex::new(StdHashMap::new()));
        let store = ConfigStore::new(table).await;
        let cfg = store.current();
        assert_eq!(cfg.intent_budgets[&Intent::Generate], 2500);
        assert_eq!(cfg.intent_budgets[&Intent::Conditional], 300);
        assert_eq!(cfg.tier_thresholds.fast, 3.0);
    }

    #[tokio::test]
    async fn malformed_value_degrades_to_default_without_failing_reload() {
        let mut seed = StdHashMap::new();
        seed.insert("orchestration.workflow_cap".to_string(), "not-a-number".to_string());
        let table = FakeTable(Mutex::new(seed));
        let store = ConfigStore::new(table).await;
        let cfg = store.current();
        assert_eq!(cfg.workflow_cap, OrchestrationConfig::defaults().workflow_cap);
    }

    #[tokio::test]
    async fn previously_hardcoded_keys_are_now_readable() {
        let mut seed = StdHashMap::new();
        seed.insert(
            "orchestration.intent_priority".to_string(),
            r#"{"generate": 9.0}"#.to_string(),
        );
        seed.insert(
            "orchestration.memory_compression_defaults".to_string(),
            r#"{"target_ratio": 0.6, "min_quality_score": 0.5}"#.to_string(),
        );
        seed.insert(
            "orchestration.models".to_string(),
            r#"{"fast:generate": {"provider": "dynamic", "model": "custom-fast", "max_tokens": 111, "temperature": 0.1, "cost_per_token": 0.0, "avg_latency_ms": 1}}"#
                .to_string(),
        );
        seed.insert(
            "orchestration.bucket_thresholds".to_string(),
            r#"{"prompt_length": {"medium": 1.0, "high": 2.0, "extreme": 3.0}}"#.to_string(),
        );
        let table = FakeTable(Mutex::new(seed));
        let store = ConfigStore::new(table).await;
        let cfg = store.current();
        assert_eq!(cfg.intent_priority[&Intent::Generate], 9.0);
        assert_eq!(cfg.memory_compression_defaults.target_ratio, 0.6);
        assert_eq!(cfg.models[&(orchestra_core::Tier::Fast, Intent::Generate)].model, "custom-fast");
        assert_eq!(cfg.bucket_thresholds["prompt_length"].extreme, 3.0);
    }

    #[tokio::test]
    async fn reload_picks_up_new_values() {
        let table = FakeTable(Mutex::new(StdHashMap::new()));
        let store = ConfigStore::new(table).await;
        assert_eq!(store.current().workflow_cap, OrchestrationConfig::defaults().workflow_cap);

        store.table.0.lock().await.insert("orchestration.workflow_cap".to_string(), "9999".to_string());
        store.reload().await;
        assert_eq!(store.current().workflow_cap, 9999);
    }
}
