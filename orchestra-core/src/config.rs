//! Feature flags and the collaborator trait for the configuration table.
//!
//! The typed, cached configuration struct itself lives in `orchestra-config`;
//! this module only defines the shapes every other crate needs to depend on
//! without pulling in the config crate's caching machinery.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// All seven feature flags. Default false; enabling one is strictly
/// additive — no flag turns off functionality another flag requires.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeatureFlags {
    pub orchestration_enabled: bool,
    pub orchestration_compression_enabled: bool,
    pub orchestration_ais_routing_enabled: bool,
    pub orchestration_adaptive_budget_enabled: bool,
    pub orchestration_bulletproof_classification_enabled: bool,
    pub orchestration_validation_enabled: bool,
    pub orchestration_ambiguity_detection_enabled: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            orchestration_enabled: false,
            orchestration_compression_enabled: false,
            orchestration_ais_routing_enabled: false,
            orchestration_adaptive_budget_enabled: false,
            orchestration_bulletproof_classification_enabled: false,
            orchestration_validation_enabled: false,
            orchestration_ambiguity_detection_enabled: false,
        }
    }
}

/// Collaborator: a key/value configuration table. Values are JSON-encoded
/// scalars or objects, timestamped; the core only reads from it.
#[async_trait]
pub trait ConfigTable: Send + Sync {
    /// Fetch the raw JSON-encoded value for `key`, if present.
    async fn get_raw(&self, key: &str) -> Option<String>;
}
