//! The hashtag catalog: which tags earn points and under what conditions.
//!
//! The catalog is immutable after construction. `default_table` carries the
//! production values; tests and alternative deployments can inject any
//! consistent table through `with_rules`.

use crate::config::recommendation;
use crate::normalizer;
use regex::Regex;
use std::collections::HashMap;

/// Structural gate attached to a rule: the message body must contain the
/// pattern or the award drops to a fixed fallback.
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub pattern: Regex,
    /// Human-readable description of the expected format.
    pub hint: String,
    pub fallback_points: i64,
}

/// One catalogued hashtag keyword and its award conditions.
#[derive(Debug, Clone)]
pub struct HashtagRule {
    /// Folded keyword without the `#` marker.
    pub keyword: String,
    pub base_points: i64,
    /// Minimum content words required for full credit; below it the award
    /// is halved (floor, minimum 1).
    pub min_words: Option<usize>,
    pub required_pattern: Option<PatternRule>,
}

impl HashtagRule {
    pub fn basic(keyword: &str, base_points: i64) -> Self {
        Self {
            keyword: normalizer::normalize(keyword),
            base_points,
            min_words: None,
            required_pattern: None,
        }
    }

    pub fn with_min_words(keyword: &str, base_points: i64, min_words: usize) -> Self {
        Self {
            min_words: Some(min_words),
            ..Self::basic(keyword, base_points)
        }
    }

    pub fn with_pattern(keyword: &str, base_points: i64, rule: PatternRule) -> Self {
        Self {
            required_pattern: Some(rule),
            ..Self::basic(keyword, base_points)
        }
    }
}

/// Read-only keyword → rule map built once at startup.
pub struct HashtagCatalog {
    rules: HashMap<String, HashtagRule>,
}

impl HashtagCatalog {
    /// Build a catalog from an arbitrary rule set. Keywords are folded, so
    /// rules declared with accents collapse onto their plain form.
    pub fn with_rules(rules: Vec<HashtagRule>) -> Self {
        let rules = rules
            .into_iter()
            .map(|rule| (rule.keyword.clone(), rule))
            .collect();
        Self { rules }
    }

    /// The production point table.
    pub fn default_table() -> Self {
        let recommendation_rule = PatternRule {
            pattern: Regex::new(recommendation::PATTERN).expect("recommendation pattern"),
            hint: recommendation::FORMAT_HINT.to_string(),
            fallback_points: recommendation::FALLBACK_POINTS,
        };
        Self::with_rules(vec![
            // Alto valor
            HashtagRule::with_min_words("critica", 10, 100),
            HashtagRule::with_min_words("resena", 7, 50),
            HashtagRule::with_pattern("recomendacion", 5, recommendation_rule),
            // Participación media
            HashtagRule::basic("debate", 4),
            HashtagRule::basic("aporte", 3),
            HashtagRule::basic("cinefilo", 3),
            HashtagRule::basic("pelicula", 3),
            HashtagRule::basic("cine", 3),
            HashtagRule::basic("serie", 3),
            HashtagRule::basic("director", 3),
            HashtagRule::basic("oscar", 3),
            HashtagRule::basic("festival", 3),
            HashtagRule::basic("documental", 3),
            HashtagRule::basic("animacion", 3),
            HashtagRule::basic("clasico", 3),
            HashtagRule::basic("independiente", 3),
            // Participación baja
            HashtagRule::basic("actor", 2),
            HashtagRule::basic("genero", 2),
            HashtagRule::basic("pregunta", 2),
            HashtagRule::basic("ranking", 2),
            HashtagRule::basic("rankin", 2),
            // Mínimo
            HashtagRule::basic("spoiler", 1),
        ])
    }

    /// Look up a folded keyword. Unknown hashtags are not an error; callers
    /// simply skip them.
    pub fn lookup(&self, keyword: &str) -> Option<&HashtagRule> {
        self.rules.get(keyword)
    }

    /// Rules sorted by descending base points, then keyword. Used by the
    /// help renderer.
    pub fn rules_by_value(&self) -> Vec<&HashtagRule> {
        let mut rules: Vec<&HashtagRule> = self.rules.values().collect();
        rules.sort_by(|a, b| {
            b.base_points
                .cmp(&a.base_points)
                .then_with(|| a.keyword.cmp(&b.keyword))
        });
        rules
    }
}
