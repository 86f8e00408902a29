//! Fixed-window request counters keyed by client address.
//!
//! A window opens with the first request from an address and lasts
//! `Quota::window`. Requests inside the window are counted; once the count
//! reaches `Quota::max_requests` further requests are rejected until a
//! request arrives after the window has elapsed, which opens a new one.
//!
//! State is process-local. Running several processes behind a balancer
//! multiplies the effective ceiling by the process count.

use std::net::IpAddr;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// How many requests a single address may make per window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quota {
    pub max_requests: u32,
    pub window: Duration,
}

impl Quota {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            // A zero ceiling would reject everything forever.
            max_requests: max_requests.max(1),
            window,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Outcome of [`FixedWindowLimiter::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    /// Rejected; the current window closes after `retry_after`.
    Limited { retry_after: Duration },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }
}

#[derive(Debug)]
pub struct FixedWindowLimiter {
    name: String,
    quota: Quota,
    windows: DashMap<IpAddr, Window>,
}

impl FixedWindowLimiter {
    pub fn new(name: impl Into<String>, quota: Quota) -> Self {
        Self {
            name: name.into(),
            quota,
            windows: DashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quota(&self) -> Quota {
        self.quota
    }

    pub fn check(&self, key: IpAddr) -> Decision {
        self.check_at(key, Instant::now())
    }

    /// Counts one request from `key` arriving at `now`.
    pub fn check_at(&self, key: IpAddr, now: Instant) -> Decision {
        // The entry guard holds the shard lock, so the read-modify-write
        // below is atomic per key.
        let mut window = self.windows.entry(key).or_insert(Window {
            started: now,
            count: 0,
        });

        let elapsed = now.saturating_duration_since(window.started);
        if elapsed >= self.quota.window {
            window.started = now;
            window.count = 0;
        }

        if window.count >= self.quota.max_requests {
            let elapsed = now.saturating_duration_since(window.started);
            return Decision::Limited {
                retry_after: self.quota.window.saturating_sub(elapsed),
            };
        }

        window.count += 1;
        Decision::Allowed
    }

    /// Drops windows that have fully elapsed. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    pub fn purge_expired_at(&self, now: Instant) -> usize {
        let before = self.windows.len();
        let window_len = self.quota.window;
        self.windows
            .retain(|_, window| now.saturating_duration_since(window.started) < window_len);
        let removed = before.saturating_sub(self.windows.len());
        if removed > 0 {
            tracing::debug!(limiter = %self.name, removed, "purged expired rate limit windows");
        }
        removed
    }

    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }
}
