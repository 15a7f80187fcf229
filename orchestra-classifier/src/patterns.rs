//! Tier-1 deterministic pattern matching (§4.2).

use orchestra_core::Intent;
use regex::Regex;
use std::sync::LazyLock;

/// Word-boundary keyword patterns for each intent, tested in
/// [`Intent::PATTERN_ORDER_FULL`] order. `summarize` precedes `extract`
/// because "summarize" also contains words ("extract the summary") that
/// would otherwise match extract first.
static KEYWORD_PATTERNS: LazyLock<Vec<(Intent, Regex)>> = LazyLock::new(|| {
    let build = |words: &[&str]| {
        let joined = words.join("|");
        Regex::new(&format!(r"(?i)\b({joined})\b")).expect("static pattern is valid regex")
    };
    vec![
        (Intent::Summarize, build(&["summarize", "summary", "condense", "tldr", "recap"])),
        (Intent::Extract, build(&["extract", "parse", "pull out", "scrape", "retrieve"])),
        (Intent::Generate, build(&["generate", "create", "write", "compose", "draft"])),
        (Intent::Validate, build(&["validate", "verify", "check", "confirm", "ensure"])),
        (Intent::Send, build(&["send", "email", "notify", "webhook", "slack", "sms", "push", "post", "publish"])),
        (Intent::Transform, build(&["transform", "convert", "reformat", "map", "translate"])),
        (Intent::Filter, build(&["filter", "exclude", "narrow", "where", "matching"])),
        (Intent::Conditional, build(&["if", "branch", "condition", "otherwise", "unless"])),
        (Intent::Aggregate, build(&["aggregate", "combine", "merge", "sum", "collect"])),
        (Intent::Enrich, build(&["enrich", "augment", "annotate", "append context", "supplement"])),
    ]
});

/// The send-semantic tokens that distinguish a `send` action step from a
/// default `extract` action step.
static SEND_TOKENS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(send|email|notify|webhook|slack|sms|push|post|publish)\b").unwrap()
});

/// Whether an action step's plugin key or prompt names a send-semantic
/// operation.
pub fn is_send_semantic(plugin_key: Option<&str>, prompt: Option<&str>) -> bool {
    plugin_key.is_some_and(|p| SEND_TOKENS.is_match(p)) || prompt.is_some_and(|p| SEND_TOKENS.is_match(p))
}

/// Test patterns in [`Intent::PATTERN_ORDER_FULL`] order, returning the
/// first intent whose pattern matches `text`.
pub fn first_match(text: &str) -> Option<Intent> {
    KEYWORD_PATTERNS.iter().find(|(_, re)| re.is_match(text)).map(|(intent, _)| *intent)
}

/// Count how many distinct intent patterns fire on `text`, for ambiguity
/// detection. Does not alter classification — only escalation/telemetry.
pub fn match_count(text: &str) -> usize {
    KEYWORD_PATTERNS.iter().filter(|(_, re)| re.is_match(text)).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarize_wins_over_extract_when_both_could_match() {
        // "summarize" itself does not contain "extract", but the intent
        // whose pattern is tested first on ambiguous text wins.
        let text = "summarize and extract the key points";
        assert_eq!(first_match(text), Some(Intent::Summarize));
    }

    #[test]
    fn send_tokens_detected() {
        assert!(is_send_semantic(Some("google-mail"), Some("email weekly summary")));
        assert!(!is_send_semantic(Some("google-sheets"), Some("read the spreadsheet")));
    }

    #[test]
    fn ambiguity_tally_counts_distinct_firing_patterns() {
        let text = "generate and validate the summary";
        assert!(match_count(text) >= 2);
    }
}
