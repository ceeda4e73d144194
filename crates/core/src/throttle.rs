//! Per-client token buckets and the consecutive-failure login lockout.
//!
//! Counters live in process memory behind a `Mutex`. Running more than one
//! instance of the service requires backing these by a shared store instead;
//! the types here are the single-instance implementation of that contract.
//!
//! Every public operation has an `*_at` variant taking an explicit
//! [`Instant`] so tests can drive the clock.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// RateLimiter
// ---------------------------------------------------------------------------

/// Fixed-window rate limiter: up to `max_points` consumptions per key per
/// window. The window restarts `window` after the first consumption in it.
pub struct RateLimiter {
    max_points: u32,
    window: Duration,
    buckets: Mutex<HashMap<String, Window>>,
}

struct Window {
    started: Instant,
    used: u32,
}

impl RateLimiter {
    pub fn new(max_points: u32, window: Duration) -> Self {
        Self {
            max_points,
            window,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Consume one point for `key`. Returns `false` when the bucket is
    /// empty; an empty bucket is left untouched.
    pub fn try_consume(&self, key: &str) -> bool {
        self.try_consume_at(key, Instant::now())
    }

    pub fn try_consume_at(&self, key: &str, now: Instant) -> bool {
        let mut buckets = self.buckets.lock().expect("rate limiter lock poisoned");
        let window = buckets.entry(key.to_string()).or_insert(Window {
            started: now,
            used: 0,
        });

        if now.duration_since(window.started) >= self.window {
            window.started = now;
            window.used = 0;
        }

        if window.used >= self.max_points {
            return false;
        }
        window.used += 1;
        true
    }
}

// ---------------------------------------------------------------------------
// LoginThrottle
// ---------------------------------------------------------------------------

/// Consecutive-failure lockout, independent of the auth rate bucket.
///
/// Reaching `max_failures` locks the key for `lockout`. A lock is checked
/// before the auth bucket is consumed, a success clears the counter, and an
/// expired lock self-clears (counter included) on the next check.
pub struct LoginThrottle {
    max_failures: u32,
    lockout: Duration,
    entries: Mutex<HashMap<String, FailureRecord>>,
}

struct FailureRecord {
    count: u32,
    locked_until: Option<Instant>,
}

impl LoginThrottle {
    pub fn new(max_failures: u32, lockout: Duration) -> Self {
        Self {
            max_failures,
            lockout,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Is `key` currently locked out?
    pub fn is_locked(&self, key: &str) -> bool {
        self.is_locked_at(key, Instant::now())
    }

    pub fn is_locked_at(&self, key: &str, now: Instant) -> bool {
        let mut entries = self.entries.lock().expect("login throttle lock poisoned");
        match entries.get(key) {
            None => false,
            Some(record) => match record.locked_until {
                Some(until) if until > now => true,
                Some(_) => {
                    // Lockout expired: forget the key entirely.
                    entries.remove(key);
                    false
                }
                None => false,
            },
        }
    }

    /// Record one failed attempt. Returns `true` when this failure tripped
    /// the lockout.
    pub fn record_failure(&self, key: &str) -> bool {
        self.record_failure_at(key, Instant::now())
    }

    pub fn record_failure_at(&self, key: &str, now: Instant) -> bool {
        let mut entries = self.entries.lock().expect("login throttle lock poisoned");
        let record = entries.entry(key.to_string()).or_insert(FailureRecord {
            count: 0,
            locked_until: None,
        });
        record.count += 1;
        if record.count >= self.max_failures {
            record.locked_until = Some(now + self.lockout);
            return true;
        }
        false
    }

    /// Reset the counter after a successful authentication.
    pub fn clear(&self, key: &str) {
        let mut entries = self.entries.lock().expect("login throttle lock poisoned");
        entries.remove(key);
    }
}
