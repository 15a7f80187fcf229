//! The closed set of step intents and the classifier's output shape.

use serde::{Deserialize, Serialize};

/// A step's functional intent, drawn from a closed ten-value set.
///
/// New intents require adding both the variant here and a handler in
/// `orchestra-handlers`'s registry — this is intentional, avoiding
/// open-world polymorphism over step behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Pull structured data out of unstructured or semi-structured input.
    Extract,
    /// Condense content while preserving its salient meaning.
    Summarize,
    /// Produce new content from a prompt (the default, least specific intent).
    Generate,
    /// Check content against a rule or schema and report pass/fail.
    Validate,
    /// Deliver content through an external channel (email, webhook, chat).
    Send,
    /// Reshape data from one representation to another.
    Transform,
    /// Branch workflow execution on a boolean or multi-way condition.
    Conditional,
    /// Combine multiple prior outputs into one.
    Aggregate,
    /// Narrow down a collection to matching elements.
    Filter,
    /// Augment existing content with additional derived detail.
    Enrich,
}

impl Intent {
    /// All ten intents, in the order Tier-1 pattern matching tests them.
    /// `summarize` precedes `extract` because "summarize" also contains
    /// words that would match the extract pattern.
    pub const PATTERN_ORDER: [Intent; 9] = [
        Intent::Summarize,
        Intent::Extract,
        Intent::Generate,
        Intent::Validate,
        Intent::Send,
        Intent::Transform,
        Intent::Filter,
        Intent::Conditional,
        Intent::Aggregate,
    ];

    /// The full ten-intent pattern order, including `enrich` as the final
    /// fallback pattern tested.
    pub const PATTERN_ORDER_FULL: [Intent; 10] = [
        Intent::Summarize,
        Intent::Extract,
        Intent::Generate,
        Intent::Validate,
        Intent::Send,
        Intent::Transform,
        Intent::Filter,
        Intent::Conditional,
        Intent::Aggregate,
        Intent::Enrich,
    ];

    /// The intent name as it appears in config keys and LLM prompts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Extract => "extract",
            Intent::Summarize => "summarize",
            Intent::Generate => "generate",
            Intent::Validate => "validate",
            Intent::Send => "send",
            Intent::Transform => "transform",
            Intent::Conditional => "conditional",
            Intent::Aggregate => "aggregate",
            Intent::Filter => "filter",
            Intent::Enrich => "enrich",
        }
    }

    /// Parse an intent from its config/wire name. Returns `None` for any
    /// value outside the closed set — callers must reject, not guess.
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "extract" => Intent::Extract,
            "summarize" => Intent::Summarize,
            "generate" => Intent::Generate,
            "validate" => Intent::Validate,
            "send" => Intent::Send,
            "transform" => Intent::Transform,
            "conditional" => Intent::Conditional,
            "aggregate" => Intent::Aggregate,
            "filter" => Intent::Filter,
            "enrich" => Intent::Enrich,
            _ => return None,
        })
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which tier of the classifier produced a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationMethod {
    /// Tier 1 — deterministic pattern match.
    Pattern,
    /// Tier 2 — fast LLM call.
    Llm,
    /// Tier 3 — context-enhanced LLM call.
    Enhanced,
    /// All tiers failed or disagreed unrecoverably; degraded result.
    Fallback,
}

/// The ambiguity tally's recommendation for what the orchestrator should
/// do about a step that matched more than one intent pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    /// Fewer than two patterns fired — no recommendation.
    #[default]
    None,
    /// Exactly two patterns fired — escalate to a higher classification tier.
    Escalate,
    /// Three or more patterns fired — the step likely does more than one
    /// thing and should be split before re-classification.
    SplitStep,
}

impl Recommendation {
    /// Map an ambiguity-pattern match count to its recommendation (spec
    /// §4.2: ≥3 matches recommends `split_step`, exactly 2 recommends
    /// `escalate`, fewer than 2 recommends nothing).
    pub fn from_match_count(count: usize) -> Self {
        match count {
            0 | 1 => Recommendation::None,
            2 => Recommendation::Escalate,
            _ => Recommendation::SplitStep,
        }
    }
}

/// An intent paired with a confidence and the reasoning that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentClassification {
    /// The classified intent.
    pub intent: Intent,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// Free-form reasoning string (pattern name, or LLM-provided rationale).
    pub reasoning: String,
    /// Which tier produced this classification.
    pub method: ClassificationMethod,
    /// Tier number, 1-3.
    pub tier: u8,
    /// Alternative candidates considered, if any.
    #[serde(default)]
    pub alternatives: Vec<Intent>,
    /// Whether the step matched more than one intent pattern.
    #[serde(default)]
    pub was_ambiguous: bool,
    /// Whether a second-opinion validation pass ran.
    #[serde(default)]
    pub was_validated: bool,
    /// What the ambiguity tally recommends doing about this step, if
    /// ambiguity detection is enabled.
    #[serde(default)]
    pub recommendation: Recommendation,
}

impl IntentClassification {
    /// Build a confident, unambiguous Tier-1 result — the common case in
    /// the deterministic pattern-match path.
    pub fn pattern(intent: Intent, confidence: f64, reasoning: impl Into<String>) -> Self {
        Self {
            intent,
            confidence,
            reasoning: reasoning.into(),
            method: ClassificationMethod::Pattern,
            tier: 1,
            alternatives: Vec::new(),
            was_ambiguous: false,
            was_validated: false,
            recommendation: Recommendation::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_outside_closed_set() {
        assert!(Intent::parse("delete").is_none());
        assert_eq!(Intent::parse("enrich"), Some(Intent::Enrich));
    }

    #[test]
    fn round_trips_through_as_str() {
        for intent in [
            Intent::Extract, Intent::Summarize, Intent::Generate, Intent::Validate,
            Intent::Send, Intent::Transform, Intent::Conditional, Intent::Aggregate,
            Intent::Filter, Intent::Enrich,
        ] {
            assert_eq!(Intent::parse(intent.as_str()), Some(intent));
        }
    }
}
