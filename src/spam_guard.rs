//! Per-(user, hashtag) rate limiting.
//!
//! State lives in process memory for the lifetime of the bot; losing it on
//! restart is acceptable. A background sweep evicts idle windows so the map
//! stays bounded on long uptimes.

use crate::config::spam;
use chrono::{DateTime, Utc};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::time::{sleep, Duration};

#[derive(Debug, Clone, Copy)]
struct SpamWindow {
    count: u32,
    window_start: DateTime<Utc>,
}

/// Sliding-window usage counter keyed by (user, hashtag).
///
/// All mutation happens under one lock, so two near-simultaneous messages
/// from the same user cannot both slip under the threshold.
pub struct SpamGuard {
    windows: Mutex<HashMap<(u64, String), SpamWindow>>,
}

impl SpamGuard {
    pub fn new() -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Record one use of `keyword` by `user_id` and decide whether it may
    /// earn points. Must be called at most once per (user, hashtag, message).
    ///
    /// A window older than the configured duration resets on use. Within the
    /// window the count keeps incrementing even once suppressed, so a
    /// spammer cannot outwait the cap by continuing to post.
    pub fn check_and_record(&self, user_id: u64, keyword: &str, now: DateTime<Utc>) -> bool {
        let mut windows = self.windows.lock().expect("spam window lock poisoned");
        match windows.entry((user_id, keyword.to_string())) {
            Entry::Vacant(slot) => {
                slot.insert(SpamWindow {
                    count: 1,
                    window_start: now,
                });
                true
            }
            Entry::Occupied(mut slot) => {
                let window = slot.get_mut();
                let age = now.signed_duration_since(window.window_start).num_seconds();
                if age > spam::WINDOW_SECS {
                    window.count = 1;
                    window.window_start = now;
                    true
                } else {
                    window.count += 1;
                    window.count <= spam::MAX_USES_PER_WINDOW
                }
            }
        }
    }

    /// Drop windows whose last reset is older than the eviction horizon.
    /// Returns how many entries were removed.
    pub fn evict_stale(&self, now: DateTime<Utc>) -> usize {
        let mut windows = self.windows.lock().expect("spam window lock poisoned");
        let before = windows.len();
        windows.retain(|_, window| {
            now.signed_duration_since(window.window_start).num_seconds() <= spam::EVICT_AFTER_SECS
        });
        before - windows.len()
    }

    /// Number of live windows, for diagnostics.
    pub fn tracked_windows(&self) -> usize {
        self.windows.lock().expect("spam window lock poisoned").len()
    }

    /// Low-priority maintenance loop; run from a spawned task.
    pub async fn start_eviction_sweep(&self) {
        loop {
            sleep(Duration::from_secs(spam::SWEEP_INTERVAL_SECS)).await;
            let evicted = self.evict_stale(Utc::now());
            if evicted > 0 {
                log::info!("evicted {} idle spam windows", evicted);
            }
        }
    }
}

impl Default for SpamGuard {
    fn default() -> Self {
        Self::new()
    }
}
