//! Quality gate: reduces an award when the message body does not meet the
//! tag's minimum substance requirement. Pure, no I/O.

use crate::catalog::HashtagRule;

/// Apply the rule's quality requirements to one hashtag use.
///
/// Returns the adjusted points plus an optional user-visible warning:
/// - below `min_words` the award halves (floor, minimum 1);
/// - a missing structural pattern drops the award to the rule's fixed
///   fallback value;
/// - otherwise full base points, no warning.
pub fn apply_quality(
    rule: &HashtagRule,
    content_words: usize,
    raw_text: &str,
) -> (i64, Option<String>) {
    if let Some(min_words) = rule.min_words {
        if content_words < min_words {
            let reduced = (rule.base_points / 2).max(1);
            let warning = format!(
                "#{}: necesita más desarrollo, tiene {} palabras y requiere {}",
                rule.keyword, content_words, min_words
            );
            return (reduced, Some(warning));
        }
    }

    if let Some(pattern_rule) = &rule.required_pattern {
        if !pattern_rule.pattern.is_match(raw_text) {
            let warning = format!(
                "#{}: incluye el formato '{}' para máximos puntos",
                rule.keyword, pattern_rule.hint
            );
            return (pattern_rule.fallback_points, Some(warning));
        }
    }

    (rule.base_points, None)
}
