//! The canonical scoring decision.
//!
//! Every inbound text message goes through `score_message` exactly once:
//! extract tags, rate-limit, quality-gate, merge bonuses, and persist the
//! result as a single base ledger write plus at most one write per fired
//! challenge. All surrounding handler code is glue around this call.

use crate::catalog::HashtagCatalog;
use crate::challenge::{evaluate_bonus, ChallengeBonus, ChallengeSpec};
use crate::config::bonus;
use crate::ledger::{clip_message_text, PointsAward, PointsLedger, StorageError};
use crate::normalizer::{count_content_words, extract_hashtags};
use crate::quality::apply_quality;
use crate::spam_guard::SpamGuard;
use chrono::{DateTime, Utc};

/// Inbound message event as delivered by the transport layer.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub user_id: u64,
    pub username: String,
    pub chat_id: i64,
    pub message_id: i32,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Outcome for one extracted hashtag.
#[derive(Debug, Clone)]
pub struct HashtagAward {
    pub keyword: String,
    pub points: i64,
    pub suppressed: bool,
    pub quality_penalized: bool,
    pub warning: Option<String>,
}

/// The full scoring outcome for one message, consumed by the reply renderer
/// and already persisted (when there was anything to persist).
#[derive(Debug, Clone)]
pub struct ScoringEvent {
    pub user_id: u64,
    pub chat_id: i64,
    pub message_id: i32,
    /// Per-hashtag outcomes in first-occurrence order.
    pub matched: Vec<HashtagAward>,
    /// Sum of per-hashtag points after spam and quality adjustment.
    pub base_points: i64,
    pub length_bonus: i64,
    pub challenge_bonuses: Vec<ChallengeBonus>,
    pub total_points: i64,
}

impl ScoringEvent {
    fn empty(message: &InboundMessage) -> Self {
        Self {
            user_id: message.user_id,
            chat_id: message.chat_id,
            message_id: message.message_id,
            matched: Vec::new(),
            base_points: 0,
            length_bonus: 0,
            challenge_bonuses: Vec::new(),
            total_points: 0,
        }
    }

    pub fn warnings(&self) -> Vec<&str> {
        self.matched
            .iter()
            .filter_map(|award| award.warning.as_deref())
            .collect()
    }

    pub fn has_warnings(&self) -> bool {
        self.matched.iter().any(|award| award.warning.is_some())
    }

    /// True when there is nothing to persist and nothing to tell the user.
    pub fn is_noop(&self) -> bool {
        self.total_points == 0 && !self.has_warnings()
    }

    /// First hashtag that actually scored; reported as the primary tag in
    /// ledger metadata.
    pub fn primary_keyword(&self) -> Option<&str> {
        self.matched
            .iter()
            .find(|award| !award.suppressed && award.points > 0)
            .map(|award| award.keyword.as_str())
    }
}

/// Composes normalizer, catalog, spam guard, quality gate and bonus
/// evaluator into one atomic decision per message.
pub struct ScoringPipeline<L> {
    catalog: HashtagCatalog,
    guard: SpamGuard,
    ledger: L,
}

impl<L: PointsLedger> ScoringPipeline<L> {
    pub fn new(catalog: HashtagCatalog, ledger: L) -> Self {
        Self {
            catalog,
            guard: SpamGuard::new(),
            ledger,
        }
    }

    pub fn catalog(&self) -> &HashtagCatalog {
        &self.catalog
    }

    pub fn guard(&self) -> &SpamGuard {
        &self.guard
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Score one message and persist the outcome.
    ///
    /// Zero-point events with no warnings are returned without touching the
    /// ledger. A failed ledger write surfaces as `StorageError` and is not
    /// retried here; an award increment is not idempotent, so retry policy
    /// belongs to the caller.
    pub fn score_message(
        &self,
        message: &InboundMessage,
        daily: Option<&ChallengeSpec>,
        weekly: Option<&ChallengeSpec>,
    ) -> Result<ScoringEvent, StorageError> {
        let mut event = ScoringEvent::empty(message);

        let hashtags = extract_hashtags(&message.text);
        if hashtags.is_empty() && !matchable_without_tag(daily) && !matchable_without_tag(weekly) {
            return Ok(event);
        }

        let content_words = count_content_words(&message.text);

        for keyword in &hashtags {
            let Some(rule) = self.catalog.lookup(keyword) else {
                continue;
            };
            if !self
                .guard
                .check_and_record(message.user_id, keyword, message.timestamp)
            {
                event.matched.push(HashtagAward {
                    keyword: keyword.clone(),
                    points: 0,
                    suppressed: true,
                    quality_penalized: false,
                    warning: Some(format!(
                        "#{}: detectado spam, usa hashtags con moderación",
                        keyword
                    )),
                });
                continue;
            }
            let (points, warning) = apply_quality(rule, content_words, &message.text);
            event.base_points += points;
            event.matched.push(HashtagAward {
                keyword: keyword.clone(),
                points,
                suppressed: false,
                quality_penalized: warning.is_some(),
                warning,
            });
        }

        // The detail bonus rides on a scored hashtag; a long message earns
        // nothing by length alone.
        if event.base_points > 0
            && message.text.chars().count() > bonus::LENGTH_THRESHOLD_CHARS
        {
            event.length_bonus = bonus::LENGTH_BONUS_POINTS;
        }

        if let Some(fired) = evaluate_bonus(
            daily,
            bonus::DAILY_CHALLENGE_LABEL,
            &message.text,
            &hashtags,
            content_words,
        ) {
            event.challenge_bonuses.push(fired);
        }
        if let Some(fired) = evaluate_bonus(
            weekly,
            bonus::WEEKLY_CHALLENGE_LABEL,
            &message.text,
            &hashtags,
            content_words,
        ) {
            event.challenge_bonuses.push(fired);
        }

        let challenge_total: i64 = event.challenge_bonuses.iter().map(|b| b.points).sum();
        event.total_points = event.base_points + event.length_bonus + challenge_total;

        if event.is_noop() {
            return Ok(event);
        }

        let base_write = event.base_points + event.length_bonus;
        if base_write > 0 {
            let primary = event.primary_keyword().unwrap_or("aporte");
            self.ledger.add_points(&PointsAward {
                user_id: message.user_id,
                username: message.username.clone(),
                points: base_write,
                label: format!("#{}", primary),
                message_text: clip_message_text(&message.text),
                chat_id: message.chat_id,
                message_id: message.message_id,
                is_challenge_bonus: false,
            })?;
        }
        for fired in &event.challenge_bonuses {
            if fired.points > 0 {
                self.ledger.add_points(&PointsAward {
                    user_id: message.user_id,
                    username: message.username.clone(),
                    points: fired.points,
                    label: fired.label.to_string(),
                    message_text: clip_message_text(&message.text),
                    chat_id: message.chat_id,
                    message_id: message.message_id,
                    is_challenge_bonus: true,
                })?;
            }
        }

        if event.total_points > 0 {
            log::info!(
                "user {} earned {} points in chat {}",
                message.user_id,
                event.total_points,
                message.chat_id
            );
        }
        Ok(event)
    }
}

/// Whether a challenge could fire on a message that carries no `#` marker.
fn matchable_without_tag(challenge: Option<&ChallengeSpec>) -> bool {
    challenge.is_some_and(|c| c.is_well_formed() && !c.requires_hashtag())
}
