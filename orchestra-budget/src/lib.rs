#![deny(missing_docs)]
//! # orchestra-budget — Token Budget Manager + Budget Predictor (§4.3-4.4)
//!
//! Allocates per-step token budgets under one of five strategies, tracks
//! usage and compression savings, and enforces the overage policy. The
//! *predictive* strategy delegates to [`predictor::BudgetPredictor`],
//! falling back to *proportional* for any step it cannot predict.

mod error;
mod predictor;

pub use error::{BudgetError, PredictorError};
pub use predictor::{BudgetPredictor, PredictedBudget};

use orchestra_config::OrchestrationConfig;
use orchestra_core::{AgentAis, Intent, StepExecutionTable, StepId, Tier, TokenBudget};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Which of the five allocation strategies the Budget Manager uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationStrategy {
    /// Workflow cap divided evenly by step count.
    Equal,
    /// Each step's share of the cap proportional to its intent baseline.
    Proportional,
    /// Falls back to proportional unless historical data is available.
    Adaptive,
    /// Baseline scaled by intent priority and classification confidence.
    Priority,
    /// Queries the Budget Predictor per step; falls back to proportional.
    Predictive,
}

impl AllocationStrategy {
    /// The strategy name as recorded in [`orchestra_core::OrchestrationMetadata::allocation_strategy`].
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationStrategy::Equal => "equal",
            AllocationStrategy::Proportional => "proportional",
            AllocationStrategy::Adaptive => "adaptive",
            AllocationStrategy::Priority => "priority",
            AllocationStrategy::Predictive => "predictive",
        }
    }
}

/// One step's inputs to allocation. `initial_tier`/`initial_complexity`
/// are required only for the *predictive*/*adaptive* strategies — they
/// come from the orchestrator's initialization-time routing pass (agent
/// complexity alone, before any step has executed).
#[derive(Debug, Clone)]
pub struct StepAllocationInput {
    pub step_id: StepId,
    pub step_kind: String,
    pub intent: Intent,
    pub classification_confidence: f64,
    pub initial_tier: Option<Tier>,
    pub initial_complexity: Option<f64>,
}

/// Allocates and tracks per-step token budgets for one execution.
pub struct BudgetManager<T: StepExecutionTable> {
    config: Arc<OrchestrationConfig>,
    predictor: BudgetPredictor<T>,
    budgets: Mutex<HashMap<StepId, TokenBudget>>,
}

impl<T: StepExecutionTable> BudgetManager<T> {
    /// Build a budget manager over the given config snapshot and
    /// historical-sample collaborator.
    pub fn new(config: Arc<OrchestrationConfig>, execution_table: T) -> Self {
        Self { config, predictor: BudgetPredictor::new(execution_table), budgets: Mutex::new(HashMap::new()) }
    }

    fn ais_multiplier(agent_ais: Option<AgentAis>) -> f64 {
        match agent_ais {
            Some(ais) => 1.0 + (ais.combined_score / 10.0) * 0.5,
            None => 1.0,
        }
    }

    fn overage_limit(&self, allocated: u64) -> u64 {
        ((allocated as f64) * (self.config.overage.threshold - 1.0)).floor() as u64
    }

    /// Allocate budgets for every step under `strategy`, scaling down
    /// proportionally if the sum would exceed the workflow cap (I2).
    pub async fn allocate(
        &self,
        steps: &[StepAllocationInput],
        agent_ais: Option<AgentAis>,
        strategy: AllocationStrategy,
        now_ms: u64,
    ) -> HashMap<StepId, TokenBudget> {
        let per_step_cap = self.config.per_step_cap;
        let workflow_cap = self.config.workflow_cap;

        let mut raw: HashMap<StepId, u64> = HashMap::new();

        match strategy {
            AllocationStrategy::Equal => {
                let share = if steps.is_empty() { 0 } else { workflow_cap / steps.len() as u64 };
                for s in steps {
                    raw.insert(s.step_id.clone(), share.min(per_step_cap));
                }
            }
            AllocationStrategy::Proportional => {
                self.allocate_proportional(steps, agent_ais, workflow_cap, per_step_cap, &mut raw);
            }
            AllocationStrategy::Priority => {
                let total_weighted: f64 = steps
                    .iter()
                    .map(|s| self.priority_weight(s))
                    .sum();
                for s in steps {
                    let weight = self.priority_weight(s);
                    let share = if total_weighted > 0.0 {
                        ((workflow_cap as f64) * (weight / total_weighted)).floor() as u64
                    } else {
                        0
                    };
                    raw.insert(s.step_id.clone(), share.min(per_step_cap));
                }
            }
            AllocationStrategy::Predictive | AllocationStrategy::Adaptive => {
                // Compute a proportional baseline first so per-step
                // predictor misses have somewhere to fall back to.
                let mut proportional = HashMap::new();
                self.allocate_proportional(steps, agent_ais, workflow_cap, per_step_cap, &mut proportional);

                for s in steps {
                    let predicted = match (s.initial_tier, s.initial_complexity) {
                        (Some(tier), Some(complexity)) => {
                            self.predictor.predict(&s.step_kind, tier, complexity, now_ms).await
                        }
                        _ => None,
                    };
                    let allocated = match predicted {
                        Some(p) => p.budget.min(per_step_cap),
                        None => *proportional.get(&s.step_id).unwrap_or(&0),
                    };
                    raw.insert(s.step_id.clone(), allocated);
                }
            }
        }

        let total: u64 = raw.values().sum();
        let scale_factor = if total > workflow_cap && total > 0 {
            workflow_cap as f64 / total as f64
        } else {
            1.0
        };

        let mut result = HashMap::new();
        let mut store = self.budgets.lock().await;
        for s in steps {
            let allocated_raw = *raw.get(&s.step_id).unwrap_or(&0);
            let allocated = ((allocated_raw as f64) * scale_factor).floor() as u64;
            let overage_limit = self.overage_limit(allocated);
            let budget = TokenBudget::new(allocated, true, overage_limit);
            store.insert(s.step_id.clone(), budget);
            result.insert(s.step_id.clone(), budget);
        }
        result
    }

    fn priority_weight(&self, step: &StepAllocationInput) -> f64 {
        let baseline = *self.config.intent_budgets.get(&step.intent).unwrap_or(&1000) as f64;
        let priority_mult = *self.config.intent_priority.get(&step.intent).unwrap_or(&1.0);
        baseline * priority_mult * step.classification_confidence
    }

    fn allocate_proportional(
        &self,
        steps: &[StepAllocationInput],
        agent_ais: Option<AgentAis>,
        workflow_cap: u64,
        per_step_cap: u64,
        out: &mut HashMap<StepId, u64>,
    ) {
        let multiplier = Self::ais_multiplier(agent_ais);
        let total_baseline: f64 = steps
            .iter()
            .map(|s| *self.config.intent_budgets.get(&s.intent).unwrap_or(&1000) as f64)
            .sum();
        for s in steps {
            let baseline = *self.config.intent_budgets.get(&s.intent).unwrap_or(&1000) as f64;
            let share = if total_baseline > 0.0 {
                ((workflow_cap as f64) * (baseline / total_baseline) * multiplier).floor() as u64
            } else {
                0
            };
            out.insert(s.step_id.clone(), share.min(per_step_cap));
        }
    }

    /// Whether `step_id` may spend `required` additional tokens (I3).
    pub async fn can_afford(&self, step_id: &StepId, required: u64) -> bool {
        self.budgets.lock().await.get(step_id).is_some_and(|b| b.can_afford(required))
    }

    /// Record actual token usage for a step.
    pub async fn track_usage(&self, step_id: &StepId, tokens_used: u64) {
        if let Some(budget) = self.budgets.lock().await.get_mut(step_id) {
            budget.track_usage(tokens_used);
        }
    }

    /// Record tokens saved by compression for a step. Never affects
    /// `used` or `remaining` (P3).
    pub async fn record_compression(&self, step_id: &StepId, tokens_saved: u64) {
        if let Some(budget) = self.budgets.lock().await.get_mut(step_id) {
            budget.record_compression(tokens_saved);
        }
    }

    /// Current budget snapshot for a step, if allocated.
    pub async fn budget_for(&self, step_id: &StepId) -> Option<TokenBudget> {
        self.budgets.lock().await.get(step_id).copied()
    }

    /// Clear all budgets, ending this execution's tracking.
    pub async fn reset(&self) {
        self.budgets.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use orchestra_core::StepExecutionRow;

    struct EmptyTable;

    #[async_trait]
    impl StepExecutionTable for EmptyTable {
        async fn upsert(&self, _row: StepExecutionRow) {}
        async fn query_completed(&self, _step_kind: &str, _tier: &str, _complexity: f64, _since_ms: u64) -> Vec<StepExecutionRow> {
            Vec::new()
        }
    }

    fn manager() -> BudgetManager<EmptyTable> {
        BudgetManager::new(Arc::new(OrchestrationConfig::defaults()), EmptyTable)
    }

    fn input(id: &str, intent: Intent) -> StepAllocationInput {
        StepAllocationInput {
            step_id: id.into(),
            step_kind: "ai_processing".to_string(),
            intent,
            classification_confidence: 1.0,
            initial_tier: None,
            initial_complexity: None,
        }
    }

    #[tokio::test]
    async fn proportional_allocation_matches_worked_example() {
        let mgr = manager();
        let mut cfg = OrchestrationConfig::defaults();
        cfg.workflow_cap = 5600;
        cfg.per_step_cap = 4000;
        let mgr = BudgetManager::new(Arc::new(cfg), EmptyTable);

        let steps = vec![input("step1", Intent::Generate), input("step2", Intent::Conditional)];
        let ais = AgentAis { creation_score: 5.0, execution_score: 5.0, combined_score: 5.0 };

        let result = mgr.allocate(&steps, Some(ais), AllocationStrategy::Proportional, 0).await;

        // baseline: generate=2500, conditional=300, total=2800, multiplier=1.25
        // step1 = floor(5600 * 2500/2800 * 1.25) = floor(6250.0) capped to 4000
        // step2 = floor(5600 * 300/2800 * 1.25) = 750
        assert_eq!(result["step1"].allocated, 4000);
        assert_eq!(result["step2"].allocated, 750);
    }

    #[tokio::test]
    async fn sum_of_allocations_never_exceeds_workflow_cap() {
        let mut cfg = OrchestrationConfig::defaults();
        cfg.workflow_cap = 1000;
        cfg.per_step_cap = 10_000;
        let mgr = BudgetManager::new(Arc::new(cfg), EmptyTable);

        let steps = vec![
            input("a", Intent::Generate),
            input("b", Intent::Generate),
            input("c", Intent::Generate),
        ];
        let result = mgr.allocate(&steps, None, AllocationStrategy::Equal, 0).await;
        let total: u64 = result.values().map(|b| b.allocated).sum();
        assert!(total <= 1000);
    }

    #[tokio::test]
    async fn predictive_falls_back_to_proportional_on_cold_start() {
        let mgr = manager();
        let steps = vec![input("enrich-step", Intent::Enrich)];
        let result = mgr.allocate(&steps, None, AllocationStrategy::Predictive, 0).await;
        assert!(result["enrich-step"].allocated > 0);
    }

    #[tokio::test]
    async fn compression_never_inflates_remaining() {
        let mgr = manager();
        let steps = vec![input("x", Intent::Generate)];
        mgr.allocate(&steps, None, AllocationStrategy::Equal, 0).await;
        let before = mgr.budget_for(&"x".into()).await.unwrap();
        mgr.record_compression(&"x".into(), 500).await;
        let after = mgr.budget_for(&"x".into()).await.unwrap();
        assert_eq!(after.used, before.used);
        assert_eq!(after.remaining, before.remaining);
        assert_eq!(after.compressed, 500);
    }
}
