//! Centralized configuration: point tables, gate thresholds, and Redis keys.
//!
//! The numeric values here are product configuration, not engineering law:
//! the scoring pipeline only depends on their shape (base value, minimum-word
//! gate, pattern gate, window size). Deployments may swap the table without
//! touching any logic.

/// **Redis Key Prefixes:** identify categories of data stored in Redis.
pub mod key {
    /// Prefix for user point hashes (e.g. `"cine:users:<user_id>"`).
    pub const USERS_PREFIX: &str = "cine:users:";
    /// Sorted set ranking all users by total points.
    pub const RANKING_KEY: &str = "cine:ranking";
    /// Prefix for per-chat award logs (e.g. `"cine:awards:<chat_id>"`).
    pub const AWARDS_PREFIX: &str = "cine:awards:";
    /// Key holding the active daily challenge document (JSON, set with TTL).
    pub const CHALLENGE_DAILY_KEY: &str = "cine:challenge:daily";
    /// Key holding the active weekly challenge document (JSON, set with TTL).
    pub const CHALLENGE_WEEKLY_KEY: &str = "cine:challenge:weekly";
}

/// **Redis Key Suffixes:** common endings for composite Redis keys.
pub mod suffix {
    /// Suffix for a user's hashtag frequency hash (e.g. `"<user_id>:hashtags"`).
    pub const HASHTAGS: &str = ":hashtags";
}

/// **Redis Hash Field Names:** keys within the per-user hash.
pub mod field {
    /// Field storing the username of the point earner.
    pub const USERNAME: &str = "username";
    /// Field storing the user's accumulated points.
    pub const POINTS: &str = "points";
    /// Field storing the user's current level, recomputed on every award.
    pub const LEVEL: &str = "level";
    /// Field storing the Unix timestamp of the last award.
    pub const UPDATED_AT: &str = "updated_at";
}

/// Anti-abuse window applied per (user, hashtag) pair.
pub mod spam {
    /// Sliding window duration in seconds (5 minutes).
    pub const WINDOW_SECS: i64 = 300;
    /// Maximum uses of the same hashtag inside one window.
    pub const MAX_USES_PER_WINDOW: u32 = 3;
    /// Windows idle longer than this are evicted by the background sweep.
    pub const EVICT_AFTER_SECS: i64 = 3600;
    /// Sweep interval in seconds.
    pub const SWEEP_INTERVAL_SECS: u64 = 3600;
}

/// Message-level bonuses merged into the single per-message award.
pub mod bonus {
    /// Character count a message must exceed to earn the detail bonus.
    pub const LENGTH_THRESHOLD_CHARS: usize = 150;
    /// Points added for a detailed message.
    pub const LENGTH_BONUS_POINTS: i64 = 2;
    /// Ledger label marking a daily-challenge bonus row. Distinct from any
    /// user hashtag so frequency displays can exclude challenge credit.
    pub const DAILY_CHALLENGE_LABEL: &str = "(reto_diario)";
    /// Ledger label marking a weekly-challenge bonus row.
    pub const WEEKLY_CHALLENGE_LABEL: &str = "(reto_semanal)";
}

/// Structural requirement for the recommendation tag.
pub mod recommendation {
    /// A recommendation must contain a "Title, Country, Year" triple.
    pub const PATTERN: &str = r"[A-Za-z\s]+,\s*[A-Za-z\s]+,\s*\d{4}";
    /// Format hint echoed back to the user when the pattern is missing.
    pub const FORMAT_HINT: &str = "Título, País, Año";
    /// Points awarded when the tag is used without the full format.
    pub const FALLBACK_POINTS: i64 = 3;
}

/// Number of award rows retained per chat in the ledger log.
pub const MAX_AWARD_ROWS: isize = 200;

/// Awards store at most this many characters of the originating message.
pub const AWARD_TEXT_LIMIT: usize = 200;

/// Promo phrases that trigger a friendly anti-spam reminder in the chat.
/// Checked against lowercased raw text by the message handler, outside the
/// scoring decision.
pub const SPAM_WATCHWORDS: &[&str] = &[
    "gratis",
    "oferta",
    "descuento",
    "promoción",
    "gana dinero",
    "click aquí",
];
