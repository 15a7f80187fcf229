//! Non-LLM compression strategies: structural, template, truncate.

use orchestra_core::compression::estimate_tokens;
use orchestra_core::{Aggressiveness, CompressionResult, CompressionStrategy, Intent};
use regex::Regex;
use std::sync::LazyLock;

pub(crate) fn structural(content: &str, aggressiveness: Aggressiveness) -> CompressionResult {
    let compressed = match aggressiveness {
        Aggressiveness::Low => {
            // Collapse runs of spaces/tabs within a line; keep paragraph breaks.
            content
                .lines()
                .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
                .collect::<Vec<_>>()
                .join("\n")
        }
        Aggressiveness::Medium => content.split_whitespace().collect::<Vec<_>>().join(" "),
        Aggressiveness::High => {
            let collapsed = content.split_whitespace().collect::<Vec<_>>().join(" ");
            strip_bracket_and_punctuation_spacing(&collapsed)
        }
    };

    let quality = match aggressiveness {
        Aggressiveness::Low => 0.95,
        Aggressiveness::Medium => 0.85,
        Aggressiveness::High => 0.75,
    };

    finish(content, compressed, quality, CompressionStrategy::Structural)
}

fn strip_bracket_and_punctuation_spacing(s: &str) -> String {
    static BRACKET_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*([\[\](){}])\s*").unwrap());
    static PUNCT_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+([,.!?;:])").unwrap());
    let s = BRACKET_SPACE.replace_all(s, "$1");
    PUNCT_SPACE.replace_all(&s, "$1").into_owned()
}

pub(crate) fn template(content: &str, intent: Intent) -> CompressionResult {
    static FROM_TO: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)from (.+?) to (.+?)([.\n]|$)").unwrap());
    static FOR_EXAMPLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)for example").unwrap());

    let mut out = content.to_string();
    match intent {
        Intent::Summarize => {
            out = out.replace("Please summarize:", "Summarize:");
            out = out.replace("please summarize:", "Summarize:");
        }
        Intent::Transform => {
            out = FROM_TO.replace_all(&out, "$1→$2$3").into_owned();
        }
        _ => {}
    }
    out = FOR_EXAMPLE.replace_all(&out, "e.g.").into_owned();

    finish(content, out, 0.9, CompressionStrategy::Template)
}

pub(crate) fn truncate(content: &str, target_ratio: f64, aggressiveness: Aggressiveness) -> CompressionResult {
    let total_chars = content.chars().count();
    let target_chars = ((total_chars as f64) * target_ratio).round() as usize;

    if target_chars >= total_chars {
        return finish(content, content.to_string(), 0.9, CompressionStrategy::Truncate);
    }

    let cut_at = if aggressiveness == Aggressiveness::High {
        target_chars
    } else {
        nearest_sentence_boundary(content, target_chars).unwrap_or(target_chars)
    };

    let mut truncated: String = content.chars().take(cut_at).collect();
    let was_cut = cut_at < total_chars;
    if was_cut {
        truncated.push('…');
    }

    let preserved_ratio = (truncated.chars().count() as f64) / (total_chars.max(1) as f64);
    let quality = (0.9_f64).min(preserved_ratio * 1.1);

    finish(content, truncated, quality, CompressionStrategy::Truncate)
}

fn nearest_sentence_boundary(content: &str, target_chars: usize) -> Option<usize> {
    let chars: Vec<char> = content.chars().collect();
    let window_start = target_chars.saturating_sub(100);
    let window_end = (target_chars + 100).min(chars.len());

    let mut best: Option<usize> = None;
    let mut best_distance = usize::MAX;
    for (i, c) in chars.iter().enumerate().take(window_end).skip(window_start) {
        if matches!(c, '.' | '!' | '?') {
            let distance = target_chars.abs_diff(i);
            if distance < best_distance {
                best_distance = distance;
                best = Some(i + 1);
            }
        }
    }
    best
}

fn finish(original: &str, compressed: String, quality_score: f64, strategy: CompressionStrategy) -> CompressionResult {
    let input_tokens = estimate_tokens(original);
    let output_tokens = estimate_tokens(&compressed);
    let ratio = if input_tokens == 0 { 1.0 } else { (output_tokens as f64) / (input_tokens as f64) };
    CompressionResult {
        content: compressed,
        input_tokens,
        output_tokens,
        ratio,
        quality_score,
        strategy_used: strategy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_high_collapses_whitespace_and_bracket_spacing() {
        let result = structural("hello   ( world )  , foo", Aggressiveness::High);
        assert_eq!(result.content, "hello (world), foo");
        assert_eq!(result.quality_score, 0.75);
    }

    #[test]
    fn template_applies_intent_keyed_substitution() {
        let result = template("from apples to oranges.", Intent::Transform);
        assert!(result.content.contains('→'));
    }

    #[test]
    fn truncate_appends_ellipsis_when_cut() {
        let long = "Sentence one. Sentence two. Sentence three. Sentence four.";
        let result = truncate(long, 0.3, Aggressiveness::Medium);
        assert!(result.content.ends_with('…'));
        assert!(result.content.len() < long.len());
    }

    #[test]
    fn truncate_no_op_when_target_exceeds_length() {
        let short = "short";
        let result = truncate(short, 1.0, Aggressiveness::Medium);
        assert_eq!(result.content, short);
    }
}
