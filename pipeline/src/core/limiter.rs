//! Per-key sliding-window rate limiting
//!
//! Each protected endpoint family owns its own limiter instance, so
//! generation can be capped more conservatively than read listing.
//! Entries whose window has elapsed are treated as absent; a periodic
//! sweep discards them to bound memory.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::debug;

/// Key used when no client-identifying header is present
///
/// Without a trusted reverse proxy all anonymous callers share this
/// bucket; a deployment concern, not a limiter bug.
const DEFAULT_CLIENT_KEY: &str = "anonymous";

/// Outcome of one admission check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

#[derive(Debug)]
struct WindowEntry {
    count: u32,
    reset_at: DateTime<Utc>,
}

/// Sliding-window-by-bucket rate limiter
///
/// Check-and-increment is a single locked operation; at most one live
/// window exists per key.
pub struct RateLimiter {
    max_requests: u32,
    window: chrono::Duration,
    entries: Mutex<HashMap<String, WindowEntry>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        let window = chrono::Duration::milliseconds(window.as_millis() as i64);
        Self {
            max_requests,
            window,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Admit or deny one request for `key`
    pub async fn check(&self, key: &str) -> RateLimitDecision {
        let now = Utc::now();
        let mut entries = self.entries.lock().await;

        match entries.get_mut(key) {
            Some(entry) if entry.reset_at > now => {
                if entry.count >= self.max_requests {
                    debug!("Rate limit exceeded for key {key}");
                    RateLimitDecision {
                        allowed: false,
                        remaining: 0,
                        reset_at: entry.reset_at,
                    }
                } else {
                    entry.count += 1;
                    RateLimitDecision {
                        allowed: true,
                        remaining: self.max_requests - entry.count,
                        reset_at: entry.reset_at,
                    }
                }
            }
            // First request for this key, or its window has elapsed
            _ => {
                let reset_at = now + self.window;
                entries.insert(key.to_string(), WindowEntry { count: 1, reset_at });
                RateLimitDecision {
                    allowed: true,
                    remaining: self.max_requests.saturating_sub(1),
                    reset_at,
                }
            }
        }
    }

    /// Discard entries whose window has already elapsed
    pub async fn sweep(&self) {
        let now = Utc::now();
        let mut entries = self.entries.lock().await;
        entries.retain(|_, entry| entry.reset_at > now);
    }

    /// Number of live entries; used by tests and the sweep task's logging
    pub async fn entry_count(&self) -> usize {
        self.entries.lock().await.len()
    }
}

/// Derive a caller identity from forwarding headers
///
/// Prefers the forwarded-for header's first hop, then the direct
/// connection header, then a fixed single-tenant fallback.
pub fn client_key(forwarded_for: Option<&str>, real_ip: Option<&str>) -> String {
    if let Some(forwarded) = forwarded_for {
        if let Some(first_hop) = forwarded.split(',').next() {
            let first_hop = first_hop.trim();
            if !first_hop.is_empty() {
                return first_hop.to_string();
            }
        }
    }
    if let Some(ip) = real_ip {
        let ip = ip.trim();
        if !ip.is_empty() {
            return ip.to_string();
        }
    }
    DEFAULT_CLIENT_KEY.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_request_allowed() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        let decision = limiter.check("10.0.0.1").await;

        assert!(decision.allowed);
        assert_eq!(decision.remaining, 2);
        assert!(decision.reset_at > Utc::now());
    }

    #[tokio::test]
    async fn test_ceiling_denies_next_call() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));

        for _ in 0..3 {
            assert!(limiter.check("10.0.0.1").await.allowed);
        }

        let denied = limiter.check("10.0.0.1").await;
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
    }

    #[tokio::test]
    async fn test_keys_have_independent_windows() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));

        assert!(limiter.check("10.0.0.1").await.allowed);
        assert!(!limiter.check("10.0.0.1").await.allowed);
        assert!(limiter.check("10.0.0.2").await.allowed);
    }

    #[tokio::test]
    async fn test_window_reopens_after_reset() {
        let limiter = RateLimiter::new(1, Duration::from_millis(20));

        assert!(limiter.check("10.0.0.1").await.allowed);
        assert!(!limiter.check("10.0.0.1").await.allowed);

        tokio::time::sleep(Duration::from_millis(30)).await;

        let fresh = limiter.check("10.0.0.1").await;
        assert!(fresh.allowed);
        assert_eq!(fresh.remaining, 0); // fresh window, ceiling 1, count 1
    }

    #[tokio::test]
    async fn test_sweep_discards_elapsed_entries() {
        let limiter = RateLimiter::new(5, Duration::from_millis(10));

        limiter.check("10.0.0.1").await;
        limiter.check("10.0.0.2").await;
        assert_eq!(limiter.entry_count().await, 2);

        tokio::time::sleep(Duration::from_millis(20)).await;
        limiter.sweep().await;
        assert_eq!(limiter.entry_count().await, 0);
    }

    #[tokio::test]
    async fn test_sweep_keeps_live_entries() {
        let limiter = RateLimiter::new(5, Duration::from_secs(60));
        limiter.check("10.0.0.1").await;

        limiter.sweep().await;
        assert_eq!(limiter.entry_count().await, 1);
    }

    #[test]
    fn test_client_key_prefers_forwarded_first_hop() {
        let key = client_key(Some("203.0.113.7, 10.0.0.1"), Some("192.168.1.1"));
        assert_eq!(key, "203.0.113.7");
    }

    #[test]
    fn test_client_key_falls_back_to_real_ip() {
        assert_eq!(client_key(None, Some("192.168.1.1")), "192.168.1.1");
        assert_eq!(client_key(Some("  "), Some("192.168.1.1")), "192.168.1.1");
    }

    #[test]
    fn test_client_key_default_when_headers_absent() {
        assert_eq!(client_key(None, None), "anonymous");
    }
}
