//! Per-client admission gate for search requests
//!
//! A sliding sixty-second window of request instants per client, plus a
//! cooldown once the limit is exceeded. The engine itself assumes it is
//! only called after admission succeeded; this gate sits in front of it
//! at the caller layer. Client state is bounded by an LRU so an open
//! endpoint cannot grow the map without limit.

use lru::LruCache;
use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::SearchConfig;

/// Length of the sliding window
const WINDOW: Duration = Duration::from_secs(60);

/// Maximum number of clients tracked simultaneously
const MAX_TRACKED_CLIENTS: usize = 1000;

/// Admission decision for a search request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionDecision {
    /// Request is allowed to proceed
    Allow,
    /// Request rejected; retry after the given duration
    Deny { retry_after: Duration },
}

/// Sliding window of one client's request instants
#[derive(Debug, Default)]
struct RateWindow {
    requests: VecDeque<Instant>,
    cooldown_until: Option<Instant>,
}

impl RateWindow {
    fn prune(&mut self, now: Instant) {
        while let Some(front) = self.requests.front() {
            if now.duration_since(*front) >= WINDOW {
                self.requests.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Sliding-window rate limiter keyed by client identity
pub struct SearchRateLimiter {
    windows: Mutex<LruCache<String, RateWindow>>,
    rate_limit: usize,
    cooldown: Duration,
}

impl SearchRateLimiter {
    /// Create a limiter admitting `rate_limit` requests per client per
    /// minute, with the given cooldown once exceeded
    #[must_use]
    pub fn new(rate_limit: usize, cooldown: Duration) -> Self {
        let capacity =
            NonZeroUsize::new(MAX_TRACKED_CLIENTS).expect("BUG: client capacity is zero");
        Self {
            windows: Mutex::new(LruCache::new(capacity)),
            rate_limit,
            cooldown,
        }
    }

    /// Limiter using the configured rate and cooldown
    #[must_use]
    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(config.rate_limit(), config.cooldown())
    }

    /// Decide whether a client may start a new search
    ///
    /// Allowed requests are recorded in the client's window; exceeding
    /// the limit starts the cooldown and rejects until it expires.
    pub async fn check(&self, client_id: &str) -> AdmissionDecision {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        let window = windows.get_or_insert_mut(client_id.to_string(), RateWindow::default);

        window.prune(now);

        if let Some(until) = window.cooldown_until {
            if now < until {
                let retry_after = until.duration_since(now);
                warn!("Client {client_id} in cooldown for another {retry_after:?}");
                return AdmissionDecision::Deny { retry_after };
            }
            window.cooldown_until = None;
        }

        if window.requests.len() >= self.rate_limit {
            warn!(
                "Rate limit exceeded for client {client_id} ({}/{} requests); cooling down for {:?}",
                window.requests.len(),
                self.rate_limit,
                self.cooldown
            );
            window.cooldown_until = Some(now + self.cooldown);
            return AdmissionDecision::Deny {
                retry_after: self.cooldown,
            };
        }

        window.requests.push_back(now);
        debug!(
            "Request admitted for client {client_id} ({}/{} in window)",
            window.requests.len(),
            self.rate_limit
        );
        AdmissionDecision::Allow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_admits_up_to_limit() {
        let limiter = SearchRateLimiter::new(3, Duration::from_secs(60));
        for _ in 0..3 {
            assert_eq!(limiter.check("a").await, AdmissionDecision::Allow);
        }
        assert!(matches!(
            limiter.check("a").await,
            AdmissionDecision::Deny { .. }
        ));
    }

    #[tokio::test]
    async fn test_cooldown_keeps_denying() {
        let limiter = SearchRateLimiter::new(1, Duration::from_secs(60));
        assert_eq!(limiter.check("a").await, AdmissionDecision::Allow);
        assert!(matches!(
            limiter.check("a").await,
            AdmissionDecision::Deny { .. }
        ));
        // Still cooling down even though the window itself would admit
        assert!(matches!(
            limiter.check("a").await,
            AdmissionDecision::Deny { .. }
        ));
    }

    #[tokio::test]
    async fn test_clients_are_independent() {
        let limiter = SearchRateLimiter::new(1, Duration::from_secs(60));
        assert_eq!(limiter.check("a").await, AdmissionDecision::Allow);
        assert_eq!(limiter.check("b").await, AdmissionDecision::Allow);
        assert!(matches!(
            limiter.check("a").await,
            AdmissionDecision::Deny { .. }
        ));
        assert!(matches!(
            limiter.check("b").await,
            AdmissionDecision::Deny { .. }
        ));
    }

    #[tokio::test]
    async fn test_deny_reports_retry_delay() {
        let limiter = SearchRateLimiter::new(1, Duration::from_secs(30));
        assert_eq!(limiter.check("a").await, AdmissionDecision::Allow);
        match limiter.check("a").await {
            AdmissionDecision::Deny { retry_after } => {
                assert_eq!(retry_after, Duration::from_secs(30));
            }
            AdmissionDecision::Allow => panic!("expected denial"),
        }
    }
}
