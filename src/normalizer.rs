//! Text normalization and hashtag extraction.
//!
//! Hashtags are matched on folded text (diacritics stripped, lowercased) so
//! that `#Reseña`, `#reseña` and `#resena` all resolve to the same catalog
//! keyword.

use once_cell::sync::Lazy;
use regex::Regex;

static HASHTAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"#(\w+)").expect("hashtag regex"));

/// Lowercase the text and strip the accents the Spanish tag set uses.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            'ç' => 'c',
            _ => c,
        })
        .collect()
}

/// Extract the bare keywords of all `#word` tokens in the message, folded,
/// in first-occurrence order with duplicates removed.
///
/// Never fails; text without hashtags yields an empty vector.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    let folded = normalize(text);
    let mut seen = Vec::new();
    for capture in HASHTAG_RE.captures_iter(&folded) {
        let keyword = &capture[1];
        if !seen.iter().any(|s| s == keyword) {
            seen.push(keyword.to_string());
        }
    }
    seen
}

/// Count the words of a message with all hashtag tokens removed, so tag
/// stuffing cannot move the count in either direction.
pub fn count_content_words(text: &str) -> usize {
    let without_tags = HASHTAG_RE.replace_all(text, "");
    without_tags.split_whitespace().count()
}
