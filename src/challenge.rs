//! Daily and weekly challenge bonuses.
//!
//! Challenge documents are owned by an external collaborator; this module
//! only consumes them. A document that cannot be parsed or that lacks a
//! usable trigger is treated as "no active challenge": a broken challenge
//! must never break scoring.

use crate::config::key;
use crate::normalizer;
use redis::Commands;
use serde::{Deserialize, Serialize};

/// A time-boxed bonus objective, matched against message content.
///
/// Either `hashtag` or `keywords` must be present; `min_words` optionally
/// vetoes matches on thin messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeSpec {
    #[serde(default)]
    pub hashtag: Option<String>,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    #[serde(default)]
    pub min_words: Option<usize>,
    #[serde(default)]
    pub bonus_points: i64,
}

impl ChallengeSpec {
    /// A spec is usable when it carries a trigger and a positive bonus.
    pub fn is_well_formed(&self) -> bool {
        let has_trigger = self.hashtag.as_deref().is_some_and(|h| !h.is_empty())
            || self.keywords.as_ref().is_some_and(|k| !k.is_empty());
        has_trigger && self.bonus_points > 0
    }

    /// Whether this challenge can only fire on messages carrying a `#` tag.
    pub fn requires_hashtag(&self) -> bool {
        self.hashtag.as_deref().is_some_and(|h| !h.is_empty())
    }
}

/// A bonus that fired for one message, tagged with its ledger sentinel.
#[derive(Debug, Clone)]
pub struct ChallengeBonus {
    pub label: &'static str,
    pub points: i64,
}

/// Evaluate one challenge against a message.
///
/// `hashtags` is the folded tag set already extracted from the text. Returns
/// the bonus to add, or `None` when the challenge is absent, malformed or
/// unmatched. Daily and weekly challenges are evaluated independently by
/// the caller; each contributes at most once per message.
pub fn evaluate_bonus(
    challenge: Option<&ChallengeSpec>,
    label: &'static str,
    text: &str,
    hashtags: &[String],
    content_words: usize,
) -> Option<ChallengeBonus> {
    let challenge = challenge?;
    if !challenge.is_well_formed() {
        log::warn!("ignoring malformed challenge spec for {}", label);
        return None;
    }

    let matched = if let Some(tag) = challenge.hashtag.as_deref().filter(|h| !h.is_empty()) {
        let wanted = normalizer::normalize(tag.trim_start_matches('#'));
        hashtags.iter().any(|h| *h == wanted)
    } else if let Some(keywords) = &challenge.keywords {
        let lowered = text.to_lowercase();
        keywords.iter().any(|k| lowered.contains(&k.to_lowercase()))
    } else {
        false
    };
    if !matched {
        return None;
    }

    if let Some(min_words) = challenge.min_words {
        if content_words < min_words {
            return None;
        }
    }

    Some(ChallengeBonus {
        label,
        points: challenge.bonus_points,
    })
}

/// Source of the currently active challenge documents.
pub trait ChallengeProvider {
    fn active_daily(&self) -> Option<ChallengeSpec>;
    fn active_weekly(&self) -> Option<ChallengeSpec>;
}

/// Reads challenge documents stored as JSON strings in Redis. Operators set
/// the keys with a TTL matching the challenge period; an expired key simply
/// means no challenge is active.
pub struct RedisChallengeProvider {
    redis_client: redis::Client,
}

impl RedisChallengeProvider {
    pub fn new(redis_url: &str) -> anyhow::Result<Self> {
        let redis_client = redis::Client::open(redis_url)?;
        Ok(Self { redis_client })
    }

    fn fetch(&self, redis_key: &str) -> Option<ChallengeSpec> {
        let mut conn = match self.redis_client.get_connection() {
            Ok(conn) => conn,
            Err(err) => {
                log::warn!("challenge lookup unavailable: {}", err);
                return None;
            }
        };
        let raw: Option<String> = match conn.get(redis_key) {
            Ok(raw) => raw,
            Err(err) => {
                log::warn!("challenge lookup failed for {}: {}", redis_key, err);
                return None;
            }
        };
        let raw = raw?;
        match serde_json::from_str::<ChallengeSpec>(&raw) {
            Ok(spec) => Some(spec),
            Err(err) => {
                log::warn!("malformed challenge document at {}: {}", redis_key, err);
                None
            }
        }
    }
}

impl ChallengeProvider for RedisChallengeProvider {
    fn active_daily(&self) -> Option<ChallengeSpec> {
        self.fetch(key::CHALLENGE_DAILY_KEY)
    }

    fn active_weekly(&self) -> Option<ChallengeSpec> {
        self.fetch(key::CHALLENGE_WEEKLY_KEY)
    }
}
