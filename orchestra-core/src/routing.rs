//! Routing decisions: which tier and model a step executes against.

use crate::complexity::AgentAis;
use crate::duration::DurationMs;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One of three routing buckets, ordered cheapest-to-most-capable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Fast,
    Balanced,
    Powerful,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Tier::Fast => "fast",
            Tier::Balanced => "balanced",
            Tier::Powerful => "powerful",
        };
        write!(f, "{s}")
    }
}

/// The outcome of the Routing Service for one step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// Selected tier.
    pub tier: Tier,
    /// Selected model identifier.
    pub model: String,
    /// Selected provider identifier.
    pub provider: String,
    /// Human-readable reason for this routing choice.
    pub reason: String,
    /// Estimated dollar cost of executing this step.
    pub estimated_cost: Decimal,
    /// Estimated wall-clock latency.
    pub estimated_latency_ms: DurationMs,
    /// Agent AIS scores used in the decision, if available.
    #[serde(default)]
    pub agent_ais: Option<AgentAis>,
}
