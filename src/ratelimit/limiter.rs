//! Sliding-Window Rate Limiter
//!
//! Keeps the timestamps of recent accepted requests per key. A request is admitted when
//! fewer than `max_requests` accepted requests fall inside the trailing window; rejected
//! requests are not recorded, so a throttled client recovers as soon as old hits expire.

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;
use std::time::{Duration, Instant};

/// How often (in calls) the whole key map is swept for expired buckets.
pub const SWEEP_EVERY_CALLS: u64 = 200;

/// Limit applied to one class of requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatePolicy {
    pub max_requests: usize,
    pub window: Duration,
}

impl RatePolicy {
    pub const fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }
}

struct Bucket {
    hits: VecDeque<Instant>,
    window: Duration,
}

impl Bucket {
    fn prune(&mut self, now: Instant) {
        while let Some(oldest) = self.hits.front() {
            if now.saturating_duration_since(*oldest) < self.window {
                break;
            }
            self.hits.pop_front();
        }
    }
}

#[derive(Default)]
struct LimiterState {
    buckets: HashMap<String, Bucket>,
    calls: u64,
}

/// Rate limiter with its own lock, independent of the registration board.
#[derive(Default)]
pub struct RateLimiter {
    state: Mutex<LimiterState>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow(&self, key: &str, max_requests: usize, window: Duration) -> bool {
        self.allow_at(key, max_requests, window, Instant::now())
    }

    pub fn check(&self, key: &str, policy: &RatePolicy) -> bool {
        self.allow(key, policy.max_requests, policy.window)
    }

    /// [`allow`](Self::allow) evaluated at an explicit instant.
    pub fn allow_at(&self, key: &str, max_requests: usize, window: Duration, now: Instant) -> bool {
        let mut state = self.state.lock();

        state.calls = state.calls.wrapping_add(1);
        if state.calls % SWEEP_EVERY_CALLS == 0 {
            sweep(&mut state.buckets, now);
        }

        let bucket = state.buckets.entry(key.to_string()).or_insert_with(|| Bucket {
            hits: VecDeque::new(),
            window,
        });
        bucket.window = window;
        bucket.prune(now);

        if bucket.hits.len() >= max_requests {
            return false;
        }

        bucket.hits.push_back(now);
        true
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.state.lock().buckets.len()
    }
}

fn sweep(buckets: &mut HashMap<String, Bucket>, now: Instant) {
    let before = buckets.len();
    buckets.retain(|_, bucket| {
        bucket.prune(now);
        !bucket.hits.is_empty()
    });

    let removed = before - buckets.len();
    if removed > 0 {
        tracing::debug!("Rate limiter swept {} idle keys", removed);
    }
}

/// Limiter key for a caller: the authenticated id when known, the peer address otherwise.
/// `scope` separates independent limits for the same caller.
pub fn client_key(scope: &str, user_id: Option<&str>, addr: Option<IpAddr>) -> String {
    match (user_id, addr) {
        (Some(id), _) => format!("{}:uid:{}", scope, id),
        (None, Some(ip)) => format!("{}:ip:{}", scope, ip),
        (None, None) => format!("{}:anonymous", scope),
    }
}
