use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::time::Duration;

use chrono::DateTime;
use chrono::Utc;

use super::Clock;
use super::SystemClock;

/// Quota consumption for one key, e.g. `contact:203.0.113.7`
#[derive(Debug, Clone, Copy)]
struct RateLimitEntry {
    count: u32,
    window_reset_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Denied { retry_after_seconds: u64 },
}

/// Fixed-window counter (not sliding): the first request of a window fixes
/// its end, and the count only resets once that moment has passed.
///
/// Lives in process memory; one instance is shared by every worker via
/// `web::Data`. The whole check-and-increment happens under one lock, so two
/// concurrent requests cannot both see `count < max` and overshoot the quota.
pub struct RateLimiter {
    entries: Mutex<HashMap<String, RateLimitEntry>>,
    clock: Arc<dyn Clock>,
}

impl Default for RateLimiter {
    fn default() -> Self { Self::new(Arc::new(SystemClock)) }
}

impl RateLimiter {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    pub fn check(
        &self,
        key: &str,
        max: u32,
        window: Duration,
    ) -> RateLimitDecision {
        let now = self.clock.now();
        let window = chrono::Duration::from_std(window).unwrap_or(chrono::Duration::MAX);
        let mut entries = self.lock();

        match entries.get_mut(key) {
            Some(entry) if now <= entry.window_reset_at => {
                if entry.count < max {
                    entry.count += 1;
                    return RateLimitDecision::Allowed;
                }
                let remaining_ms =
                    (entry.window_reset_at - now).num_milliseconds().max(0) as u64;
                RateLimitDecision::Denied {
                    retry_after_seconds: remaining_ms.div_ceil(1000).max(1),
                }
            }
            // absent, or the window has ended
            _ => {
                entries.insert(
                    key.to_string(),
                    RateLimitEntry {
                        count: 1,
                        window_reset_at: now
                            .checked_add_signed(window)
                            .unwrap_or(DateTime::<Utc>::MAX_UTC),
                    },
                );
                RateLimitDecision::Allowed
            }
        }
    }

    /// Drop every entry whose window has ended; returns how many went.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| now <= entry.window_reset_at);
        before - entries.len()
    }

    pub fn len(&self) -> usize { self.lock().len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    // every update is a single field write, so a table left behind by a
    // panicking holder is still consistent
    fn lock(&self) -> MutexGuard<'_, HashMap<String, RateLimitEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
