use std::net::IpAddr;
use std::time::{Duration, Instant};

use dashmap::DashMap;

const SIGNIN_WINDOW: Duration = Duration::from_secs(15 * 60);
const SIGNIN_MAX_FAILURES: u32 = 5;

const RESEND_WINDOW: Duration = Duration::from_secs(10 * 60);
const RESEND_MAX_REQUESTS: u32 = 3;

/// Per-email sign-in brute force limiter. Keys are used as given; callers
/// pass normalized emails.
pub struct SigninRateLimiter {
    /// email -> (failed_count, window_start)
    entries: DashMap<String, (u32, Instant)>,
}

impl Default for SigninRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl SigninRateLimiter {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Check if a sign-in attempt is allowed: 5 failures per 15 minutes.
    /// Does not count the attempt; call `record_failure()` on a bad password.
    pub fn check(&self, email: &str) -> Result<(), u64> {
        let now = Instant::now();

        let Some(entry) = self.entries.get(email) else {
            return Ok(());
        };

        let (count, start) = entry.value();

        if now.duration_since(*start) > SIGNIN_WINDOW {
            return Ok(());
        }

        if *count >= SIGNIN_MAX_FAILURES {
            let elapsed = now.duration_since(*start).as_secs();
            return Err(SIGNIN_WINDOW.as_secs().saturating_sub(elapsed));
        }

        Ok(())
    }

    pub fn record_failure(&self, email: &str) {
        let now = Instant::now();

        let mut entry = self.entries.entry(email.to_string()).or_insert((0, now));
        let (count, start) = entry.value_mut();

        if now.duration_since(*start) > SIGNIN_WINDOW {
            *count = 1;
            *start = now;
        } else {
            *count += 1;
        }
    }

    pub fn clear(&self, email: &str) {
        self.entries.remove(email);
    }

    /// Remove stale entries older than the given duration.
    pub fn cleanup(&self, max_age: Duration) {
        let now = Instant::now();
        self.entries.retain(|_, (_, start)| now.duration_since(*start) < max_age);
    }
}

/// Limits verification email resends per (email, client IP) pair. Every
/// request counts, successful or not. Emails are expected to be normalized.
pub struct ResendRateLimiter {
    /// (email, ip) -> (count, window_start)
    entries: DashMap<(String, IpAddr), (u32, Instant)>,
}

impl Default for ResendRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResendRateLimiter {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Count a request. Returns Err with retry-after seconds once the window
    /// holds more than 3 requests.
    pub fn hit(&self, email: &str, ip: IpAddr) -> Result<(), u64> {
        let now = Instant::now();

        let mut entry = self
            .entries
            .entry((email.to_string(), ip))
            .or_insert((0, now));
        let (count, start) = entry.value_mut();

        if now.duration_since(*start) > RESEND_WINDOW {
            *count = 1;
            *start = now;
            return Ok(());
        }

        if *count >= RESEND_MAX_REQUESTS {
            let elapsed = now.duration_since(*start).as_secs();
            return Err(RESEND_WINDOW.as_secs().saturating_sub(elapsed));
        }

        *count += 1;
        Ok(())
    }

    pub fn cleanup(&self, max_age: Duration) {
        let now = Instant::now();
        self.entries.retain(|_, (_, start)| now.duration_since(*start) < max_age);
    }
}
