//! Budget Predictor (§4.4): `Budget = ceil(mean + 2 * stddev)` over
//! historical samples, clamped to `[100, 100_000]`.

use moka::sync::Cache;
use orchestra_core::{StepExecutionTable, Tier};
use std::time::Duration;

const MIN_SAMPLES: usize = 10;
const LOOKBACK_DAYS_MS: u64 = 30 * 24 * 60 * 60 * 1000;
const CACHE_TTL: Duration = Duration::from_secs(60 * 60);
const MIN_BUDGET: u64 = 100;
const MAX_BUDGET: u64 = 100_000;

/// A predicted budget, present only when enough historical samples exist.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictedBudget {
    /// `ceil(mean + 2 * stddev)`, clamped to `[100, 100_000]`.
    pub budget: u64,
    /// `1 / (1 + e^(-0.1 * (n - 50)))`.
    pub confidence: f64,
    /// Number of historical samples the prediction was computed from.
    pub sample_count: usize,
}

/// Queries historical step-execution records and predicts a per-step
/// token budget. Caches `(mean, stddev, n)` per `(step_kind, tier,
/// rounded_complexity)` for one hour. Never raises on query failure —
/// returns `None`.
pub struct BudgetPredictor<T: StepExecutionTable> {
    table: T,
    cache: Cache<(String, String, i64), Option<PredictedBudget>>,
}

impl<T: StepExecutionTable> BudgetPredictor<T> {
    /// Build a predictor over the given historical-sample collaborator.
    pub fn new(table: T) -> Self {
        Self {
            table,
            cache: Cache::builder().time_to_live(CACHE_TTL).build(),
        }
    }

    /// Predict a budget for `(step_kind, tier, complexity)` as of `now_ms`
    /// (epoch milliseconds; threaded through explicitly so callers — and
    /// tests — control the lookback window rather than the predictor
    /// reading the wall clock itself).
    pub async fn predict(&self, step_kind: &str, tier: Tier, complexity: f64, now_ms: u64) -> Option<PredictedBudget> {
        let rounded = complexity.round() as i64;
        let key = (step_kind.to_string(), tier.to_string(), rounded);

        if let Some(cached) = self.cache.get(&key) {
            return cached;
        }

        let since_ms = now_ms.saturating_sub(LOOKBACK_DAYS_MS);
        let rows = self.table.query_completed(step_kind, &tier.to_string(), complexity, since_ms).await;

        let samples: Vec<f64> = rows.iter().filter_map(|r| r.tokens_used).map(|t| t as f64).collect();

        let prediction = if samples.len() < MIN_SAMPLES {
            None
        } else {
            let n = samples.len();
            let mean = samples.iter().sum::<f64>() / n as f64;
            let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
            let stddev = variance.sqrt();
            let raw_budget = (mean + 2.0 * stddev).ceil();
            let budget = (raw_budget as u64).clamp(MIN_BUDGET, MAX_BUDGET);
            let confidence = 1.0 / (1.0 + (-0.1 * (n as f64 - 50.0)).exp());
            Some(PredictedBudget { budget, confidence, sample_count: n })
        };

        self.cache.insert(key, prediction);
        prediction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use orchestra_core::StepExecutionRow;
    use std::sync::Mutex;

    struct FakeTable {
        rows: Mutex<Vec<StepExecutionRow>>,
    }

    #[async_trait]
    impl StepExecutionTable for FakeTable {
        async fn upsert(&self, row: StepExecutionRow) {
            self.rows.lock().unwrap().push(row);
        }

        async fn query_completed(&self, step_kind: &str, tier: &str, _complexity: f64, since_ms: u64) -> Vec<StepExecutionRow> {
            self.rows
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.step_kind == step_kind && r.selected_tier == tier && r.created_at_ms >= since_ms)
                .cloned()
                .collect()
        }
    }

    fn row(step_kind: &str, tier: &str, tokens: u64, created_at_ms: u64) -> StepExecutionRow {
        StepExecutionRow {
            execution_id: "e1".into(),
            step_id: "s1".into(),
            step_kind: step_kind.to_string(),
            intent: "generate".to_string(),
            selected_tier: tier.to_string(),
            complexity_score: 7.0,
            status: "completed".to_string(),
            tokens_used: Some(tokens),
            created_at_ms,
        }
    }

    #[tokio::test]
    async fn insufficient_samples_returns_none() {
        let rows = (0..4).map(|i| row("enrich", "balanced", 1000 + i, 1_000_000_000)).collect();
        let table = FakeTable { rows: Mutex::new(rows) };
        let predictor = BudgetPredictor::new(table);
        let result = predictor.predict("enrich", Tier::Balanced, 7.0, 2_000_000_000).await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn prediction_matches_mean_plus_two_stddev() {
        // 10 identical samples -> stddev 0, budget == mean exactly.
        let rows = (0..10).map(|_| row("generate", "powerful", 3000, 1_000_000_000)).collect();
        let table = FakeTable { rows: Mutex::new(rows) };
        let predictor = BudgetPredictor::new(table);
        let result = predictor.predict("generate", Tier::Powerful, 8.0, 2_000_000_000).await.unwrap();
        assert_eq!(result.budget, 3000);
        assert_eq!(result.sample_count, 10);
    }

    #[tokio::test]
    async fn budget_clamped_to_documented_range() {
        let rows = (0..10).map(|i| row("generate", "powerful", 200_000 + i, 1_000_000_000)).collect();
        let table = FakeTable { rows: Mutex::new(rows) };
        let predictor = BudgetPredictor::new(table);
        let result = predictor.predict("generate", Tier::Powerful, 8.0, 2_000_000_000).await.unwrap();
        assert_eq!(result.budget, 100_000);
    }
}
