//! The point ledger: durable accounting of awards per user.
//!
//! The scoring pipeline only sees the narrow `PointsLedger` trait; the
//! Redis implementation owns every key, field and trim decision. Tests run
//! against `MemoryLedger`, which records the same rows in process memory.

use crate::config::{field, key, suffix, AWARD_TEXT_LIMIT, MAX_AWARD_ROWS};
use crate::levels;
use chrono::Utc;
use redis::Commands;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

/// The single hard failure the scoring core can produce: the ledger write
/// did not complete. Callers decide whether and how to retry; the pipeline
/// never does.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("point store unavailable: {0}")]
    Unavailable(#[from] redis::RedisError),
    #[error("award row could not be encoded: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// One award to record: either the merged base+length credit for a message
/// or a single challenge bonus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointsAward {
    pub user_id: u64,
    pub username: String,
    pub points: i64,
    /// Primary hashtag (with `#`) or a challenge sentinel label.
    pub label: String,
    /// Originating message text, truncated for context.
    pub message_text: String,
    pub chat_id: i64,
    pub message_id: i32,
    pub is_challenge_bonus: bool,
}

/// Aggregate stats for one user.
#[derive(Debug, Clone)]
pub struct UserStats {
    pub username: String,
    pub points: i64,
    pub level: u32,
}

/// One row of the ranking.
#[derive(Debug, Clone)]
pub struct RankedUser {
    pub user_id: u64,
    pub username: String,
    pub points: i64,
    pub level: u32,
}

/// Narrow interface between the scoring core and durable storage.
pub trait PointsLedger {
    /// Record one award and return the user's new total. Called at most once
    /// per scored message per bonus category.
    fn add_points(&self, award: &PointsAward) -> Result<i64, StorageError>;

    fn user_stats(&self, user_id: u64) -> Result<Option<UserStats>, StorageError>;

    fn top_users(&self, limit: usize) -> Result<Vec<RankedUser>, StorageError>;

    /// Per-hashtag usage counters for a user, most used first. Challenge
    /// bonus rows are excluded by construction.
    fn hashtag_counts(&self, user_id: u64) -> Result<Vec<(String, u64)>, StorageError>;
}

/// Award row as persisted in the per-chat log, with the award timestamp.
#[derive(Debug, Serialize)]
struct StoredAward<'a> {
    #[serde(flatten)]
    award: &'a PointsAward,
    awarded_at: i64,
}

/// Redis-backed ledger.
///
/// Layout per user: a hash (`cine:users:<id>`) with username, points, level
/// and update time; a member of the `cine:ranking` sorted set scored by
/// total points; a frequency hash (`cine:users:<id>:hashtags`) counting
/// non-challenge labels. Each chat keeps a capped JSON log of recent awards.
pub struct RedisLedger {
    redis_client: redis::Client,
}

impl RedisLedger {
    pub fn new(redis_url: &str) -> anyhow::Result<Self> {
        let redis_client = redis::Client::open(redis_url)?;
        Ok(Self { redis_client })
    }
}

impl PointsLedger for RedisLedger {
    fn add_points(&self, award: &PointsAward) -> Result<i64, StorageError> {
        let mut conn = self.redis_client.get_connection()?;
        let user_key = format!("{}{}", key::USERS_PREFIX, award.user_id);

        let new_total: i64 = conn.hincr(&user_key, field::POINTS, award.points)?;
        let _: () = conn.hset(&user_key, field::USERNAME, &award.username)?;
        let _: () = conn.hset(&user_key, field::LEVEL, levels::calculate_level(new_total))?;
        let _: () = conn.hset(&user_key, field::UPDATED_AT, Utc::now().timestamp())?;
        let _: () = conn.zadd(key::RANKING_KEY, award.user_id, new_total)?;

        if !award.is_challenge_bonus {
            let freq_key = format!("{}{}{}", key::USERS_PREFIX, award.user_id, suffix::HASHTAGS);
            let _: i64 = conn.hincr(&freq_key, &award.label, 1)?;
        }

        let row = serde_json::to_string(&StoredAward {
            award,
            awarded_at: Utc::now().timestamp(),
        })?;
        let log_key = format!("{}{}", key::AWARDS_PREFIX, award.chat_id);
        let _: () = conn.lpush(&log_key, row)?;
        let _: () = conn.ltrim(&log_key, 0, MAX_AWARD_ROWS - 1)?;

        log::info!(
            "recorded {} points for user {} ({})",
            award.points,
            award.user_id,
            award.label
        );
        Ok(new_total)
    }

    fn user_stats(&self, user_id: u64) -> Result<Option<UserStats>, StorageError> {
        let mut conn = self.redis_client.get_connection()?;
        let user_key = format!("{}{}", key::USERS_PREFIX, user_id);
        let points: Option<i64> = conn.hget(&user_key, field::POINTS)?;
        let Some(points) = points else {
            return Ok(None);
        };
        let username: Option<String> = conn.hget(&user_key, field::USERNAME)?;
        Ok(Some(UserStats {
            username: username.unwrap_or_else(|| "anónimo".to_string()),
            points,
            level: levels::calculate_level(points),
        }))
    }

    fn top_users(&self, limit: usize) -> Result<Vec<RankedUser>, StorageError> {
        let mut conn = self.redis_client.get_connection()?;
        let stop = limit.saturating_sub(1) as isize;
        let ranked: Vec<(u64, i64)> = conn.zrevrange_withscores(key::RANKING_KEY, 0, stop)?;

        let mut top = Vec::with_capacity(ranked.len());
        for (user_id, points) in ranked {
            let user_key = format!("{}{}", key::USERS_PREFIX, user_id);
            let username: Option<String> = conn.hget(&user_key, field::USERNAME)?;
            top.push(RankedUser {
                user_id,
                username: username.unwrap_or_else(|| "anónimo".to_string()),
                points,
                level: levels::calculate_level(points),
            });
        }
        Ok(top)
    }

    fn hashtag_counts(&self, user_id: u64) -> Result<Vec<(String, u64)>, StorageError> {
        let mut conn = self.redis_client.get_connection()?;
        let freq_key = format!("{}{}{}", key::USERS_PREFIX, user_id, suffix::HASHTAGS);
        let counts: HashMap<String, u64> = conn.hgetall(&freq_key)?;
        let mut counts: Vec<(String, u64)> = counts.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(counts)
    }
}

#[derive(Default)]
struct MemoryLedgerState {
    awards: Vec<PointsAward>,
    totals: HashMap<u64, i64>,
    usernames: HashMap<u64, String>,
}

/// In-memory ledger recording the same rows as `RedisLedger`. Used by the
/// test suites and usable as a throwaway backend for local runs.
#[derive(Default)]
pub struct MemoryLedger {
    state: Mutex<MemoryLedgerState>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every award recorded so far, in call order.
    pub fn awards(&self) -> Vec<PointsAward> {
        self.state.lock().expect("ledger lock poisoned").awards.clone()
    }

    pub fn total_for(&self, user_id: u64) -> i64 {
        self.state
            .lock()
            .expect("ledger lock poisoned")
            .totals
            .get(&user_id)
            .copied()
            .unwrap_or(0)
    }
}

impl PointsLedger for MemoryLedger {
    fn add_points(&self, award: &PointsAward) -> Result<i64, StorageError> {
        let mut state = self.state.lock().expect("ledger lock poisoned");
        let total = state.totals.entry(award.user_id).or_insert(0);
        *total += award.points;
        let total = *total;
        state.usernames.insert(award.user_id, award.username.clone());
        state.awards.push(award.clone());
        Ok(total)
    }

    fn user_stats(&self, user_id: u64) -> Result<Option<UserStats>, StorageError> {
        let state = self.state.lock().expect("ledger lock poisoned");
        Ok(state.totals.get(&user_id).map(|points| UserStats {
            username: state
                .usernames
                .get(&user_id)
                .cloned()
                .unwrap_or_else(|| "anónimo".to_string()),
            points: *points,
            level: levels::calculate_level(*points),
        }))
    }

    fn top_users(&self, limit: usize) -> Result<Vec<RankedUser>, StorageError> {
        let state = self.state.lock().expect("ledger lock poisoned");
        let mut top: Vec<RankedUser> = state
            .totals
            .iter()
            .map(|(user_id, points)| RankedUser {
                user_id: *user_id,
                username: state
                    .usernames
                    .get(user_id)
                    .cloned()
                    .unwrap_or_else(|| "anónimo".to_string()),
                points: *points,
                level: levels::calculate_level(*points),
            })
            .collect();
        top.sort_by(|a, b| b.points.cmp(&a.points).then_with(|| a.user_id.cmp(&b.user_id)));
        top.truncate(limit);
        Ok(top)
    }

    fn hashtag_counts(&self, user_id: u64) -> Result<Vec<(String, u64)>, StorageError> {
        let state = self.state.lock().expect("ledger lock poisoned");
        let mut counts: HashMap<String, u64> = HashMap::new();
        for award in &state.awards {
            if award.user_id == user_id && !award.is_challenge_bonus {
                *counts.entry(award.label.clone()).or_insert(0) += 1;
            }
        }
        let mut counts: Vec<(String, u64)> = counts.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(counts)
    }
}

/// Truncate message text to the stored context limit without splitting a
/// character.
pub fn clip_message_text(text: &str) -> String {
    text.chars().take(AWARD_TEXT_LIMIT).collect()
}
