#![deny(missing_docs)]
//! # orchestra-classifier — the Intent Classifier (§4.2)
//!
//! Classifies a step into one of ten intents with a confidence and
//! reasoning, escalating from a deterministic pattern match (Tier 1)
//! through a fast LLM call (Tier 2) to a context-enhanced LLM call
//! (Tier 3) only when confidence or agreement is insufficient. Never
//! throws upward — failures degrade to a lower tier or to `generate` at
//! reduced confidence.

mod error;
mod patterns;

pub use error::ClassifierError;

use orchestra_config::OrchestrationConfig;
use orchestra_core::{
    ChatMessage, ChatMetadata, ClassificationMethod, DurationMs, Intent, IntentClassification,
    LlmProvider, Recommendation, Step,
};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// Extra context available only to Tier 3 (context-enhanced) escalation.
#[derive(Debug, Clone, Default)]
pub struct EscalationContext {
    /// The overall workflow goal, if known.
    pub workflow_goal: Option<String>,
    /// This step's 1-based index within the workflow.
    pub step_index: usize,
    /// Total step count in the workflow.
    pub total_steps: usize,
    /// Intents already assigned to earlier steps, in order.
    pub previous_intents: Vec<Intent>,
    /// Short descriptions of upcoming (not-yet-classified) steps.
    pub upcoming_descriptions: Vec<String>,
}

/// Toggles carried from the orchestrator's feature flags that affect
/// classifier behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifierFlags {
    pub validation_enabled: bool,
    pub ambiguity_detection_enabled: bool,
    pub bulletproof_enabled: bool,
}

/// Telemetry emitted for every classification, independent of the
/// resulting [`IntentClassification`] (§4.2 "Telemetry").
#[derive(Debug, Clone)]
pub struct ClassifierTelemetry {
    pub method: ClassificationMethod,
    pub tier: u8,
    pub intent: Intent,
    pub confidence: f64,
    pub latency_ms: DurationMs,
    pub tokens_used: u64,
    pub cost: Decimal,
    pub was_validated: bool,
    pub was_ambiguous: bool,
    pub recommendation: Recommendation,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    step_kind: String,
    plugin_key: Option<String>,
    prompt_prefix: String,
}

impl CacheKey {
    fn from_step(step: &Step) -> Self {
        let prefix: String = step.prompt.as_deref().unwrap_or_default().chars().take(100).collect();
        Self { step_kind: step.kind.clone(), plugin_key: step.plugin_key.clone(), prompt_prefix: prefix }
    }
}

/// The three-tier intent classifier.
pub struct IntentClassifier<P: LlmProvider> {
    provider: P,
    config: Arc<OrchestrationConfig>,
    cache: Mutex<HashMap<CacheKey, IntentClassification>>,
}

impl<P: LlmProvider> IntentClassifier<P> {
    /// Build a classifier against the given provider and config snapshot.
    pub fn new(provider: P, config: Arc<OrchestrationConfig>) -> Self {
        Self { provider, config, cache: Mutex::new(HashMap::new()) }
    }

    /// Classify one step, escalating tiers as needed. Always returns a
    /// usable classification — never an error.
    pub async fn classify(
        &self,
        step: &Step,
        flags: ClassifierFlags,
        escalation: Option<EscalationContext>,
    ) -> (IntentClassification, ClassifierTelemetry) {
        let started = Instant::now();
        let key = CacheKey::from_step(step);
        if let Some(cached) = self.cache.lock().await.get(&key).cloned() {
            let telemetry = ClassifierTelemetry {
                method: cached.method,
                tier: cached.tier,
                intent: cached.intent,
                confidence: cached.confidence,
                latency_ms: DurationMs::from(started.elapsed()),
                tokens_used: 0,
                cost: Decimal::ZERO,
                was_validated: cached.was_validated,
                was_ambiguous: cached.was_ambiguous,
                recommendation: cached.recommendation,
            };
            return (cached, telemetry);
        }

        let mut tokens_used: u64 = 0;
        let mut cost = Decimal::ZERO;

        let mut result = self.tier1(step);
        let match_count = patterns::match_count(&step.text_surface());
        let was_ambiguous = flags.ambiguity_detection_enabled && match_count >= 2;
        let recommendation = if flags.ambiguity_detection_enabled {
            Recommendation::from_match_count(match_count)
        } else {
            Recommendation::None
        };
        result.was_ambiguous = was_ambiguous;
        result.recommendation = recommendation;

        if result.confidence < self.config.classifier_thresholds.tier1_confidence
            || recommendation != Recommendation::None
        {
            let (tier2, used, spent) = self.tier2(step).await;
            tokens_used += used;
            cost += spent;
            result = tier2;

            if flags.validation_enabled && result.confidence < 0.9 {
                let (validation, used2, spent2) = self.tier2(step).await;
                tokens_used += used2;
                cost += spent2;
                let agreement = validation.intent == result.intent;
                let delta = (validation.confidence - result.confidence).abs();
                result.was_validated = true;
                if !agreement || delta > self.config.classifier_thresholds.disagreement {
                    if flags.bulletproof_enabled {
                        let (tier3, used3, spent3) =
                            self.tier3(step, escalation.as_ref(), &result).await;
                        tokens_used += used3;
                        cost += spent3;
                        result = tier3;
                    }
                }
            } else if flags.bulletproof_enabled
                && (result.confidence < self.config.classifier_thresholds.tier2_confidence
                    || recommendation == Recommendation::SplitStep)
            {
                let (tier3, used3, spent3) = self.tier3(step, escalation.as_ref(), &result).await;
                tokens_used += used3;
                cost += spent3;
                result = tier3;
            }
        }

        result.was_ambiguous = was_ambiguous;
        result.recommendation = recommendation;
        self.cache.lock().await.insert(key, result.clone());

        let telemetry = ClassifierTelemetry {
            method: result.method,
            tier: result.tier,
            intent: result.intent,
            confidence: result.confidence,
            latency_ms: DurationMs::from(started.elapsed()),
            tokens_used,
            cost,
            was_validated: result.was_validated,
            was_ambiguous: result.was_ambiguous,
            recommendation: result.recommendation,
        };
        (result, telemetry)
    }

    /// Tier 1 — deterministic pattern match. Never calls the provider.
    fn tier1(&self, step: &Step) -> IntentClassification {
        if step.input_expression.is_some() && step.prompt.is_some() {
            return IntentClassification::pattern(
                Intent::Generate,
                1.0,
                "explicit input expression and prompt present",
            );
        }

        if step.kind == "action" {
            let is_send = patterns::is_send_semantic(
                step.plugin_key.as_deref(),
                step.prompt.as_deref(),
            );
            return if is_send {
                IntentClassification::pattern(Intent::Send, 1.0, "action step matches send-semantic tokens")
            } else {
                IntentClassification::pattern(Intent::Extract, 1.0, "action step with no send-semantic tokens")
            };
        }

        if step.kind == "conditional" || step.kind.contains("branch") {
            return IntentClassification::pattern(Intent::Conditional, 1.0, "step kind is conditional/branch");
        }

        let text = step.text_surface();
        if let Some(intent) = patterns::first_match(&text) {
            return IntentClassification::pattern(intent, 0.92, format!("keyword pattern match for {intent}"));
        }

        IntentClassification {
            intent: Intent::Generate,
            confidence: 0.0,
            reasoning: "no tier-1 pattern matched".to_string(),
            method: ClassificationMethod::Pattern,
            tier: 1,
            alternatives: Vec::new(),
            was_ambiguous: false,
            was_validated: false,
            recommendation: Recommendation::None,
        }
    }

    /// Tier 2 — fast LLM classification. Returns `(classification,
    /// tokens_used, cost)`; cost is left at zero here since per-token
    /// pricing is a routing/config concern, not the classifier's.
    async fn tier2(&self, step: &Step) -> (IntentClassification, u64, Decimal) {
        let prompt = build_tier2_prompt(step);
        let messages = [ChatMessage::system(TIER2_SYSTEM_PROMPT), ChatMessage::user(prompt)];
        let metadata = ChatMetadata { component: Some("intent_classifier".into()), ..Default::default() };

        match self.provider.chat_completion("fast-classifier", &messages, 0.0, 200, &metadata).await {
            Ok(response) => {
                let tokens = (response.usage.prompt_tokens + response.usage.completion_tokens) as u64;
                match parse_classification_json(&response.content) {
                    Some((intent, confidence, reasoning)) => (
                        IntentClassification {
                            intent,
                            confidence,
                            reasoning,
                            method: ClassificationMethod::Llm,
                            tier: 2,
                            alternatives: Vec::new(),
                            was_ambiguous: false,
                            was_validated: false,
                            recommendation: Recommendation::None,
                        },
                        tokens,
                        Decimal::ZERO,
                    ),
                    None => {
                        tracing::warn!("tier-2 response unparseable, falling back to tier-1 best guess");
                        (self.tier1_or_generate_fallback(step), tokens, Decimal::ZERO)
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "tier-2 provider call failed, falling back to tier-1 best guess");
                (self.tier1_or_generate_fallback(step), 0, Decimal::ZERO)
            }
        }
    }

    fn tier1_or_generate_fallback(&self, step: &Step) -> IntentClassification {
        let best_guess = self.tier1(step);
        if best_guess.confidence > 0.0 {
            IntentClassification { method: ClassificationMethod::Fallback, ..best_guess }
        } else {
            IntentClassification {
                intent: Intent::Generate,
                confidence: 0.5,
                reasoning: "all classification tiers failed".to_string(),
                method: ClassificationMethod::Fallback,
                tier: 2,
                alternatives: Vec::new(),
                was_ambiguous: false,
                was_validated: false,
                recommendation: Recommendation::None,
            }
        }
    }

    /// Tier 3 — context-enhanced LLM classification.
    async fn tier3(
        &self,
        step: &Step,
        escalation: Option<&EscalationContext>,
        fallback: &IntentClassification,
    ) -> (IntentClassification, u64, Decimal) {
        let prompt = build_tier3_prompt(step, escalation);
        let messages = [ChatMessage::system(TIER2_SYSTEM_PROMPT), ChatMessage::user(prompt)];
        let metadata = ChatMetadata { component: Some("intent_classifier".into()), ..Default::default() };

        match self.provider.chat_completion("capable-classifier", &messages, 0.0, 400, &metadata).await {
            Ok(response) => {
                let tokens = (response.usage.prompt_tokens + response.usage.completion_tokens) as u64;
                match parse_classification_json(&response.content) {
                    Some((intent, confidence, reasoning)) => (
                        IntentClassification {
                            intent,
                            confidence,
                            reasoning,
                            method: ClassificationMethod::Enhanced,
                            tier: 3,
                            alternatives: Vec::new(),
                            was_ambiguous: false,
                            was_validated: true,
                            recommendation: Recommendation::None,
                        },
                        tokens,
                        Decimal::ZERO,
                    ),
                    None => {
                        tracing::warn!("tier-3 response unparseable, falling back to tier-2 output");
                        (fallback.clone(), tokens, Decimal::ZERO)
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "tier-3 provider call failed, falling back to tier-2 output");
                (fallback.clone(), 0, Decimal::ZERO)
            }
        }
    }
}

const TIER2_SYSTEM_PROMPT: &str = "You classify a workflow step into exactly one of ten intents: \
extract, summarize, generate, validate, send, transform, conditional, aggregate, filter, enrich. \
Respond with a single JSON object: {\"intent\": <one of the ten>, \"confidence\": <0..1>, \"reasoning\": <short string>}.";

fn build_tier2_prompt(step: &Step) -> String {
    format!(
        "Step kind: {}\nName: {}\nPrompt: {}\nPlugin: {}",
        step.kind,
        step.name,
        step.prompt.as_deref().unwrap_or(""),
        step.plugin_key.as_deref().unwrap_or("")
    )
}

fn build_tier3_prompt(step: &Step, escalation: Option<&EscalationContext>) -> String {
    let mut prompt = build_tier2_prompt(step);
    if let Some(ctx) = escalation {
        prompt.push_str(&format!(
            "\nWorkflow goal: {}\nStep {} of {}\nPrevious intents: {:?}\nUpcoming steps: {:?}",
            ctx.workflow_goal.as_deref().unwrap_or(""),
            ctx.step_index,
            ctx.total_steps,
            ctx.previous_intents,
            ctx.upcoming_descriptions
        ));
    }
    prompt
}

/// Parse the first JSON object found in `text`, rejecting any intent
/// outside the closed set.
fn parse_classification_json(text: &str) -> Option<(Intent, f64, String)> {
    let start = text.find('{')?;
    let end = find_matching_brace(text, start)?;
    let candidate = &text[start..=end];
    let value: serde_json::Value = serde_json::from_str(candidate).ok()?;
    let intent_str = value.get("intent")?.as_str()?;
    let intent = Intent::parse(intent_str)?;
    let confidence = value.get("confidence").and_then(|v| v.as_f64()).unwrap_or(0.5);
    let reasoning = value.get("reasoning").and_then(|v| v.as_str()).unwrap_or("").to_string();
    Some((intent, confidence, reasoning))
}

fn find_matching_brace(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
