//! Six-factor step complexity scoring (§4.5).

use orchestra_config::OrchestrationConfig;
use orchestra_core::{Intent, Step, StepComplexity, StepComplexityFactors, StepComplexityRaw};
use regex::Regex;
use std::sync::LazyLock;

static TEMPLATE_REF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{[^}]*\}\}").unwrap());

/// Fixed reasoning-depth score for a step, keyed by step-kind and
/// (as a secondary match) the classified intent.
fn reasoning_depth(step_kind: &str, intent: Intent) -> f64 {
    let kind = step_kind.to_ascii_lowercase();
    if kind.contains("llm_decision") || intent == Intent::Generate {
        8.0
    } else if kind.contains("conditional") || intent == Intent::Conditional || intent == Intent::Validate {
        6.0
    } else if kind.contains("transform") || intent == Intent::Transform || intent == Intent::Summarize {
        4.0
    } else if intent == Intent::Extract || intent == Intent::Filter {
        3.0
    } else if kind.contains("action") || intent == Intent::Send {
        2.0
    } else {
        5.0
    }
}

/// Fixed output-complexity score for a step, using the same base table as
/// [`reasoning_depth`] with adjustments for transform aggregations and
/// mapping fan-out (params containing an "aggregate" key, or an array-typed
/// param value, each add weight).
fn output_complexity(step: &Step, intent: Intent) -> f64 {
    let base = reasoning_depth(&step.kind, intent);
    let mut adjustment = 0.0;
    if step.params.contains_key("aggregate") || step.params.keys().any(|k| k.contains("aggregate")) {
        adjustment += 2.0;
    }
    if step.params.values().any(|v| v.is_array()) {
        adjustment += 1.0;
    }
    (base + adjustment).clamp(0.0, 10.0)
}

/// Recursively count leaf conditions in a condition tree. `and`/`or`
/// combinators recurse into their `conditions` array; `not` recurses into
/// its single `condition`; anything else (a field-op leaf) counts as one.
fn count_condition_leaves(condition: &serde_json::Value) -> usize {
    match condition {
        serde_json::Value::Object(map) => {
            if let Some(serde_json::Value::Array(children)) = map.get("conditions") {
                children.iter().map(count_condition_leaves).sum()
            } else if let Some(child) = map.get("condition") {
                count_condition_leaves(child)
            } else {
                1
            }
        }
        serde_json::Value::Array(items) => items.iter().map(count_condition_leaves).sum(),
        _ => 0,
    }
}

fn raw_measurements(step: &Step) -> StepComplexityRaw {
    let prompt_length_chars = step.text_surface().chars().count();
    let params_json = serde_json::to_string(&step.params).unwrap_or_default();
    let context_json = serde_json::to_string(&step.context_variables).unwrap_or_default();
    let data_size_bytes = params_json.len() + context_json.len();
    let condition_count = step.condition.as_ref().map(count_condition_leaves).unwrap_or(0);

    let serialized = format!(
        "{} {} {} {}",
        step.prompt.as_deref().unwrap_or_default(),
        step.input_expression.as_deref().unwrap_or_default(),
        params_json,
        context_json
    );
    let context_depth = TEMPLATE_REF.find_iter(&serialized).count();

    StepComplexityRaw { prompt_length_chars, data_size_bytes, condition_count, context_depth }
}

/// Score a step's complexity against `config`'s bucket thresholds and
/// per-step-kind weights, falling back to the `"default"` weight set when
/// the step-kind has no dedicated entry.
pub fn score_step(step: &Step, intent: Intent, config: &OrchestrationConfig) -> StepComplexity {
    let raw = raw_measurements(step);

    let prompt_length = config
        .bucket_thresholds
        .get("prompt_length")
        .map(|b| b.bucket(raw.prompt_length_chars as f64))
        .unwrap_or(5.0);
    let data_size = config
        .bucket_thresholds
        .get("data_size")
        .map(|b| b.bucket(raw.data_size_bytes as f64))
        .unwrap_or(5.0);
    let condition_count = config
        .bucket_thresholds
        .get("condition_count")
        .map(|b| b.bucket(raw.condition_count as f64))
        .unwrap_or(5.0);
    let context_depth = config
        .bucket_thresholds
        .get("context_depth")
        .map(|b| b.bucket(raw.context_depth as f64))
        .unwrap_or(5.0);

    let factors = StepComplexityFactors {
        prompt_length,
        data_size,
        condition_count,
        context_depth,
        reasoning_depth: reasoning_depth(&step.kind, intent),
        output_complexity: output_complexity(step, intent),
    };

    let weights = config
        .complexity_weights
        .get(&step.kind)
        .or_else(|| config.complexity_weights.get("default"))
        .copied()
        .unwrap_or(orchestra_config::ComplexityWeights {
            prompt_length: 1.0 / 6.0,
            data_size: 1.0 / 6.0,
            condition_count: 1.0 / 6.0,
            context_depth: 1.0 / 6.0,
            reasoning_depth: 1.0 / 6.0,
            output_complexity: 1.0 / 6.0,
        });

    let composite = (factors.prompt_length * weights.prompt_length
        + factors.data_size * weights.data_size
        + factors.condition_count * weights.condition_count
        + factors.context_depth * weights.context_depth
        + factors.reasoning_depth * weights.reasoning_depth
        + factors.output_complexity * weights.output_complexity)
        .clamp(0.0, 10.0);

    StepComplexity { factors, raw, composite }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orchestra_core::{Intent, Step};
    use std::collections::HashMap;

    fn step(kind: &str, prompt: &str) -> Step {
        Step {
            id: "s1".into(),
            name: "step".into(),
            kind: kind.to_string(),
            plugin_key: None,
            prompt: Some(prompt.to_string()),
            params: HashMap::new(),
            input_expression: None,
            input_schema: None,
            output_schema: None,
            condition: None,
            context_variables: HashMap::new(),
            continue_on_error: false,
        }
    }

    #[test]
    fn composite_stays_in_bounds() {
        let cfg = OrchestrationConfig::defaults();
        let s = step("ai_processing", "generate a long report about quarterly revenue trends");
        let complexity = score_step(&s, Intent::Generate, &cfg);
        assert!(complexity.composite >= 0.0 && complexity.composite <= 10.0);
    }

    #[test]
    fn condition_leaves_count_recursively() {
        let mut s = step("conditional", "if balance > 0");
        s.condition = Some(serde_json::json!({
            "and": true,
            "conditions": [
                {"field": "balance", "op": "gt", "value": 0},
                {"not": true, "condition": {"field": "flagged", "op": "eq", "value": true}},
            ]
        }));
        let raw = raw_measurements(&s);
        assert_eq!(raw.condition_count, 2);
    }
}
