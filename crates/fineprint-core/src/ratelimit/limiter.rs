use crate::ratelimit::clock::{Clock, SystemClock};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Admission timestamps for one key, oldest first
#[derive(Debug, Default)]
struct RateBucket {
    admitted: VecDeque<Instant>,
    /// Window of the most recent call, used by the sweep
    window: Duration,
}

impl RateBucket {
    /// Drop admissions at least `window` old. Admissions are appended in
    /// clock order, so expired entries are always at the front.
    fn purge(&mut self, now: Instant, window: Duration) {
        while let Some(&oldest) = self.admitted.front() {
            if now.saturating_duration_since(oldest) >= window {
                self.admitted.pop_front();
            } else {
                break;
            }
        }
    }

    fn live_count(&self, now: Instant, window: Duration) -> usize {
        self.admitted
            .iter()
            .filter(|&&t| now.saturating_duration_since(t) < window)
            .count()
    }
}

/// Per-key sliding-window counter
///
/// The key map is guarded by one lock held only long enough to find or
/// create a bucket; the purge/compare/append step runs under that bucket's
/// own lock, so callers on unrelated keys only contend on the lookup.
pub struct SlidingWindowLimiter {
    buckets: Mutex<HashMap<String, Arc<Mutex<RateBucket>>>>,
    clock: Arc<dyn Clock>,
}

impl SlidingWindowLimiter {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Admit one request for `key` if fewer than `limit` were admitted in
    /// the trailing `window`
    ///
    /// A denied request is not recorded. The purge, the comparison, and the
    /// append happen atomically with respect to other callers on `key`.
    pub fn is_allowed(&self, key: &str, limit: usize, window: Duration) -> bool {
        let bucket = self.bucket(key);
        let mut bucket = bucket.lock().unwrap_or_else(PoisonError::into_inner);

        let now = self.clock.now();
        bucket.window = window;
        bucket.purge(now, window);

        if bucket.admitted.len() >= limit {
            tracing::debug!(
                limit_key = key,
                limit,
                window_secs = window.as_secs(),
                "rate limit exceeded"
            );
            return false;
        }

        bucket.admitted.push_back(now);
        true
    }

    /// Number of admissions for `key` inside the trailing `window`
    ///
    /// Read-only: nothing is purged or recorded.
    pub fn current_count(&self, key: &str, window: Duration) -> usize {
        let bucket = {
            let buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
            match buckets.get(key) {
                Some(bucket) => Arc::clone(bucket),
                None => return 0,
            }
        };
        let bucket = bucket.lock().unwrap_or_else(PoisonError::into_inner);
        bucket.live_count(self.clock.now(), window)
    }

    /// Purge every idle bucket and drop the ones left empty
    ///
    /// Buckets currently held by an in-flight call are skipped. Returns the
    /// number of buckets removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        let before = buckets.len();

        // Callers clone the Arc only while holding the map lock, which we
        // hold here, so a count of 1 means no call can be touching it.
        buckets.retain(|_, bucket| {
            if Arc::strong_count(bucket) > 1 {
                return true;
            }
            let mut state = bucket.lock().unwrap_or_else(PoisonError::into_inner);
            let window = state.window;
            state.purge(now, window);
            !state.admitted.is_empty()
        });

        let removed = before - buckets.len();
        tracing::debug!(removed, remaining = buckets.len(), "rate limiter sweep");
        removed
    }

    /// Number of keys currently tracked
    pub fn bucket_count(&self) -> usize {
        self.buckets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn bucket(&self, key: &str) -> Arc<Mutex<RateBucket>> {
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(buckets.entry(key.to_string()).or_default())
    }
}

impl Default for SlidingWindowLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SlidingWindowLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlidingWindowLimiter")
            .field("buckets", &self.bucket_count())
            .field("clock", &self.clock)
            .finish()
    }
}
