#![deny(missing_docs)]
//! # orchestra-routing — the Routing Service (§4.5)
//!
//! Scores step complexity, blends it with agent complexity, and selects an
//! LLM tier and model. [`route`] never fails outwardly — on internal
//! failure it falls back to the `balanced` tier with a documented default
//! model and logs the reason, per the routing-failure error kind.

mod complexity;
mod error;

pub use complexity::score_step;
pub use error::RoutingError;

use orchestra_core::{AgentAis, Intent, RoutingDecision, Step, StepComplexity, Tier};
use orchestra_config::{MixingWeights, OrchestrationConfig};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

/// Blend agent and step complexity into an effective score in `[0, 10]`.
/// If either side is unavailable, falls back to the agent score alone (or
/// `5.0` if the agent score is also unavailable).
pub fn effective_complexity(
    agent_ais: Option<AgentAis>,
    step_composite: Option<f64>,
    weights: MixingWeights,
) -> f64 {
    match (agent_ais, step_composite) {
        (Some(agent), Some(step)) => {
            (agent.combined_score * weights.agent + step * weights.step).clamp(0.0, 10.0)
        }
        (Some(agent), None) => agent.combined_score,
        (None, _) => 5.0,
    }
}

/// Select a tier from effective complexity. Ties at a threshold favour the
/// cheaper tier.
pub fn select_tier(effective: f64, thresholds: orchestra_config::TierThresholds) -> Tier {
    if effective <= thresholds.fast {
        Tier::Fast
    } else if effective <= thresholds.balanced {
        Tier::Balanced
    } else {
        Tier::Powerful
    }
}

/// AIS-mapped telemetry dimensions derived from the six complexity factors.
#[derive(Debug, Clone, Copy)]
pub struct AisMappedDimensions {
    /// `avg(prompt_length, data_size)`.
    pub token_complexity: f64,
    /// `avg(reasoning_depth, output_complexity)`.
    pub execution_complexity: f64,
    /// `condition_count` factor, reused as a workflow-shape signal.
    pub workflow_complexity: f64,
    /// `context_depth` factor, reused as a memory-pressure signal.
    pub memory_complexity: f64,
}

fn ais_mapped_dimensions(complexity: &StepComplexity) -> AisMappedDimensions {
    AisMappedDimensions {
        token_complexity: (complexity.factors.prompt_length + complexity.factors.data_size) / 2.0,
        execution_complexity: (complexity.factors.reasoning_depth + complexity.factors.output_complexity) / 2.0,
        workflow_complexity: complexity.factors.condition_count,
        memory_complexity: complexity.factors.context_depth,
    }
}

/// Everything persisted to the execution record after a routing decision
/// is finalized (§4.5 "Per-step logging").
#[derive(Debug, Clone)]
pub struct RoutingTelemetry {
    pub complexity: StepComplexity,
    pub ais_dimensions: AisMappedDimensions,
    pub agent_ais: Option<AgentAis>,
    pub effective_complexity: f64,
    pub decision: RoutingDecision,
}

/// Log per-step routing telemetry. Logging failures never abort execution —
/// this function cannot itself fail; it only emits a `tracing` event.
pub fn log_routing_telemetry(telemetry: &RoutingTelemetry) {
    tracing::info!(
        prompt_length = telemetry.complexity.factors.prompt_length,
        data_size = telemetry.complexity.factors.data_size,
        condition_count = telemetry.complexity.factors.condition_count,
        context_depth = telemetry.complexity.factors.context_depth,
        reasoning_depth = telemetry.complexity.factors.reasoning_depth,
        output_complexity = telemetry.complexity.factors.output_complexity,
        token_complexity = telemetry.ais_dimensions.token_complexity,
        execution_complexity = telemetry.ais_dimensions.execution_complexity,
        workflow_complexity = telemetry.ais_dimensions.workflow_complexity,
        memory_complexity = telemetry.ais_dimensions.memory_complexity,
        effective_complexity = telemetry.effective_complexity,
        tier = %telemetry.decision.tier,
        model = %telemetry.decision.model,
        provider = %telemetry.decision.provider,
        reason = %telemetry.decision.reason,
        "routing decision finalized"
    );
}

fn estimate_cost(budget_remaining: u64, cost_per_token: f64) -> Decimal {
    let raw = 0.7 * (budget_remaining as f64) * cost_per_token;
    Decimal::from_f64(raw).unwrap_or(Decimal::ZERO)
}

fn estimate_latency_ms(avg_latency_ms: u64, budget_remaining: u64, previous_failures: u32) -> u64 {
    let log_factor = ((budget_remaining.max(1) as f64).log10() / 3.0).clamp(0.5, 2.0);
    let failure_factor = 1.0 + 0.1 * previous_failures as f64;
    ((avg_latency_ms as f64) * log_factor * failure_factor).round() as u64
}

/// The documented `balanced`-tier fallback model used when no profile is
/// configured for the selected `(tier, intent)`.
fn fallback_model() -> orchestra_config::ModelProfile {
    orchestra_config::ModelProfile {
        provider: "dynamic".into(),
        model: "balanced-tier-default".into(),
        max_tokens: 4000,
        temperature: 0.6,
        cost_per_token: 0.000002,
        avg_latency_ms: 1200,
    }
}

/// Route one step: score its complexity, blend with agent complexity,
/// select a tier/model, and estimate cost/latency. Never fails outwardly —
/// a missing model profile degrades to `balanced` with the documented
/// default model and a `reason` explaining the fallback.
pub fn route(
    step: &Step,
    intent: Intent,
    agent_ais: Option<AgentAis>,
    budget_remaining: u64,
    previous_failures: u32,
    config: &OrchestrationConfig,
) -> (RoutingDecision, RoutingTelemetry) {
    let complexity = complexity::score_step(step, intent, config);
    let effective = effective_complexity(agent_ais, Some(complexity.composite), config.mixing_weights);
    let tier = select_tier(effective, config.tier_thresholds);

    let (profile, reason) = match config.models.get(&(tier, intent)) {
        Some(profile) => (
            profile.clone(),
            format!("effective complexity {effective:.2} selected tier {tier}"),
        ),
        None => {
            tracing::warn!(?tier, ?intent, "no model profile configured, falling back to balanced default");
            (fallback_model(), format!("no model configured for ({tier}, {intent:?}), falling back to balanced default"))
        }
    };

    let decision = RoutingDecision {
        tier,
        model: profile.model,
        provider: profile.provider,
        reason,
        estimated_cost: estimate_cost(budget_remaining, profile.cost_per_token),
        estimated_latency_ms: orchestra_core::DurationMs::from_millis(estimate_latency_ms(
            profile.avg_latency_ms,
            budget_remaining,
            previous_failures,
        )),
        agent_ais,
    };

    let telemetry = RoutingTelemetry {
        ais_dimensions: ais_mapped_dimensions(&complexity),
        complexity,
        agent_ais,
        effective_complexity: effective,
        decision: decision.clone(),
    };

    (decision, telemetry)
}
