//! Per-address sliding-window rate limiting.
//!
//! Each client address keeps a log of request instants inside the current
//! window. A request is admitted while the log holds fewer than
//! `max_requests` entries. State is in-memory and resets on restart.

use std::collections::VecDeque;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;

use crate::config::RateLimitConfig;
use crate::http::error::ApiError;
use crate::observability::metrics;

/// Idle addresses are swept after this many checks.
const PRUNE_EVERY: u64 = 1024;

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u32, reset_after: Duration },
    Limited { retry_after: Duration },
}

/// Sliding-window request counter keyed by client address.
pub struct RateLimiter {
    windows: DashMap<IpAddr, VecDeque<Instant>>,
    window: Duration,
    max_requests: u32,
    checks: AtomicU64,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            windows: DashMap::new(),
            window,
            max_requests,
            checks: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(Duration::from_millis(config.window_ms), config.max_requests)
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Check and count one request from `addr`.
    pub fn check(&self, addr: IpAddr) -> Decision {
        self.check_at(addr, Instant::now())
    }

    pub fn check_at(&self, addr: IpAddr, now: Instant) -> Decision {
        if self.checks.fetch_add(1, Ordering::Relaxed) % PRUNE_EVERY == PRUNE_EVERY - 1 {
            self.prune(now);
        }

        let mut log = self.windows.entry(addr).or_default();
        while let Some(&oldest) = log.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                log.pop_front();
            } else {
                break;
            }
        }

        if log.len() >= self.max_requests as usize {
            let oldest = log.front().copied().unwrap_or(now);
            return Decision::Limited {
                retry_after: self.window.saturating_sub(now.saturating_duration_since(oldest)),
            };
        }

        log.push_back(now);
        let oldest = log.front().copied().unwrap_or(now);
        Decision::Allowed {
            remaining: self.max_requests - log.len() as u32,
            reset_after: self.window.saturating_sub(now.saturating_duration_since(oldest)),
        }
    }

    /// Drop addresses whose whole log has aged out.
    pub fn prune(&self, now: Instant) {
        let window = self.window;
        self.windows.retain(|_, log| {
            log.back()
                .is_some_and(|&last| now.saturating_duration_since(last) < window)
        });
    }

    /// Number of addresses currently tracked.
    pub fn tracked(&self) -> usize {
        self.windows.len()
    }
}

fn ceil_secs(d: Duration) -> u64 {
    d.as_millis().div_ceil(1000) as u64
}

/// Middleware enforcing the per-address ceiling.
pub async fn rate_limit_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(limiter): State<Arc<RateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match limiter.check(addr.ip()) {
        Decision::Allowed {
            remaining,
            reset_after,
        } => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert("ratelimit-limit", HeaderValue::from(limiter.max_requests()));
            headers.insert("ratelimit-remaining", HeaderValue::from(remaining));
            headers.insert("ratelimit-reset", HeaderValue::from(ceil_secs(reset_after)));
            response
        }
        Decision::Limited { retry_after } => {
            tracing::warn!(client = %addr.ip(), path = %request.uri().path(), "Rate limit exceeded");
            metrics::record_rate_limited();
            ApiError::RateLimited {
                limit: limiter.max_requests(),
                retry_after_secs: ceil_secs(retry_after).max(1),
            }
            .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(last: u8) -> IpAddr {
        IpAddr::from([10, 0, 0, last])
    }

    #[test]
    fn test_ceiling_plus_one_is_limited() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 100);
        let now = Instant::now();
        for i in 0..100 {
            match limiter.check_at(ip(1), now) {
                Decision::Allowed { remaining, .. } => assert_eq!(remaining, 99 - i),
                other => panic!("request {i} limited: {other:?}"),
            }
        }
        assert!(matches!(limiter.check_at(ip(1), now), Decision::Limited { .. }));
    }

    #[test]
    fn test_addresses_are_independent() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 1);
        let now = Instant::now();
        assert!(matches!(limiter.check_at(ip(1), now), Decision::Allowed { .. }));
        assert!(matches!(limiter.check_at(ip(2), now), Decision::Allowed { .. }));
        assert!(matches!(limiter.check_at(ip(1), now), Decision::Limited { .. }));
    }

    #[test]
    fn test_window_slides() {
        let limiter = RateLimiter::new(Duration::from_secs(10), 2);
        let start = Instant::now();
        limiter.check_at(ip(1), start);
        limiter.check_at(ip(1), start + Duration::from_secs(5));

        match limiter.check_at(ip(1), start + Duration::from_secs(6)) {
            Decision::Limited { retry_after } => assert_eq!(retry_after, Duration::from_secs(4)),
            other => panic!("expected limit, got {other:?}"),
        }

        // The first request ages out; the second still counts.
        assert!(matches!(
            limiter.check_at(ip(1), start + Duration::from_secs(10)),
            Decision::Allowed { remaining: 0, .. }
        ));
        assert!(matches!(
            limiter.check_at(ip(1), start + Duration::from_secs(11)),
            Decision::Limited { .. }
        ));
    }

    #[test]
    fn test_rejected_requests_do_not_extend_window() {
        let limiter = RateLimiter::new(Duration::from_secs(10), 1);
        let start = Instant::now();
        limiter.check_at(ip(1), start);
        for s in 1..10 {
            limiter.check_at(ip(1), start + Duration::from_secs(s));
        }
        assert!(matches!(
            limiter.check_at(ip(1), start + Duration::from_secs(10)),
            Decision::Allowed { .. }
        ));
    }

    #[test]
    fn test_prune_drops_idle_addresses() {
        let limiter = RateLimiter::new(Duration::from_secs(1), 5);
        let start = Instant::now();
        limiter.check_at(ip(1), start);
        limiter.check_at(ip(2), start + Duration::from_millis(900));
        assert_eq!(limiter.tracked(), 2);

        limiter.prune(start + Duration::from_millis(1500));
        assert_eq!(limiter.tracked(), 1);
    }

    #[test]
    fn test_ceil_secs() {
        assert_eq!(ceil_secs(Duration::from_millis(0)), 0);
        assert_eq!(ceil_secs(Duration::from_millis(1)), 1);
        assert_eq!(ceil_secs(Duration::from_millis(1000)), 1);
        assert_eq!(ceil_secs(Duration::from_millis(1001)), 2);
    }
}
