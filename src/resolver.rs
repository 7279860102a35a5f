//! Rate-limited, retrying place-name resolution.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::model::Resolution;
use crate::traits::{Geocoder, Sleeper, ThreadSleeper};

/// Pause between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Fixed(Duration),
    /// Doubles per attempt, capped at `max`.
    Exponential { base: Duration, max: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::Fixed(Duration::from_secs(2)),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Delay after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { base, max } => {
                let exponent = attempt.saturating_sub(1).min(16);
                base.saturating_mul(1 << exponent).min(max)
            }
        }
    }
}

/// Enforces a minimum spacing between outbound requests.
///
/// The resolver owns one limiter and every worker of a run goes through
/// it, so spacing is global rather than per thread. The lock is held
/// across the pause.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_tick: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_tick: Mutex::new(None),
        }
    }

    /// Blocks until a request may be issued, then records it.
    pub fn acquire(&self, sleeper: &dyn Sleeper) {
        let mut guard = self.last_tick.lock();
        if let Some(prev) = *guard {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                sleeper.sleep(self.min_interval - elapsed);
            }
        }
        *guard = Some(Instant::now());
    }
}

/// Wraps a [`Geocoder`] with pacing and a retry policy.
///
/// Never fails: exhausted retries and rejected requests both come back as
/// [`Resolution::Unresolved`].
pub struct Resolver<G> {
    geocoder: G,
    policy: RetryPolicy,
    limiter: RateLimiter,
    sleeper: Arc<dyn Sleeper>,
}

impl<G: Geocoder> Resolver<G> {
    pub fn new(geocoder: G, policy: RetryPolicy, min_interval: Duration) -> Self {
        Self {
            geocoder,
            policy,
            limiter: RateLimiter::new(min_interval),
            sleeper: Arc::new(ThreadSleeper),
        }
    }

    /// Replaces the sleeper used for pacing and backoff.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn geocoder(&self) -> &G {
        &self.geocoder
    }

    pub fn resolve(&self, query: &str) -> Resolution {
        self.resolve_until(query, || false)
            .unwrap_or(Resolution::Unresolved)
    }

    /// Like [`Resolver::resolve`], but gives up as soon as `aborted` returns
    /// true. It is checked before every request and before every backoff
    /// pause; `None` means the lookup was abandoned, not that it failed.
    pub fn resolve_until<A>(&self, query: &str, aborted: A) -> Option<Resolution>
    where
        A: Fn() -> bool,
    {
        for attempt in 1..=self.policy.max_attempts {
            if aborted() {
                debug!(query, attempt, "geocode abandoned");
                return None;
            }
            self.limiter.acquire(self.sleeper.as_ref());
            debug!(query, attempt, "geocode attempt");

            match self.geocoder.geocode(query) {
                Ok(found) => return Some(Resolution::from(found)),
                Err(err) if err.is_transient() => {
                    warn!(query, attempt, max_attempts = self.policy.max_attempts, error = %err, "geocode attempt failed");
                    if attempt < self.policy.max_attempts && !aborted() {
                        self.sleeper.sleep(self.policy.delay_after(attempt));
                    }
                }
                Err(err) => {
                    warn!(query, error = %err, "geocode rejected");
                    return Some(Resolution::Unresolved);
                }
            }
        }

        warn!(query, "geocode retries exhausted");
        Some(Resolution::Unresolved)
    }
}
