//! # Sliding-window rate limiter.
//!
//! [`RateLimiter`] admits at most `max_calls` acquisitions in any window of length `window`.
//! Each admission records its timestamp; timestamps older than `window` are evicted lazily
//! on the next call.
//!
//! ```text
//! acquire():
//!   loop {
//!     evict stamps with now - stamp >= window
//!     len < max_calls ? push(now) → return
//!     sleep(oldest + window - now)
//!   }
//! ```
//!
//! The limiter is cheap to clone; clones share one window. Timestamps use
//! [`tokio::time::Instant`] so paused-clock tests observe the same waits as real time.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

/// Limiter settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum admissions per window. `0` disables the limiter.
    pub max_calls: usize,
    /// Window length.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    /// 10 calls per second.
    fn default() -> Self {
        Self {
            max_calls: 10,
            window: Duration::from_secs(1),
        }
    }
}

struct Inner {
    max_calls: usize,
    window: Duration,
    calls: Mutex<VecDeque<Instant>>,
}

/// Shared sliding-window limiter.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Inner>,
}

impl RateLimiter {
    /// Creates a limiter admitting `max_calls` per `window`.
    ///
    /// `max_calls == 0` or a zero `window` produce a limiter that never waits.
    pub fn new(max_calls: usize, window: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                max_calls,
                window,
                calls: Mutex::new(VecDeque::with_capacity(max_calls.min(1024))),
            }),
        }
    }

    /// Creates a limiter from config.
    pub fn from_config(cfg: RateLimitConfig) -> Self {
        Self::new(cfg.max_calls, cfg.window)
    }

    /// Maximum admissions per window.
    pub fn max_calls(&self) -> usize {
        self.inner.max_calls
    }

    /// Window length.
    pub fn window(&self) -> Duration {
        self.inner.window
    }

    #[inline]
    fn unlimited(&self) -> bool {
        self.inner.max_calls == 0 || self.inner.window.is_zero()
    }

    /// Waits until an admission is available, then records it.
    ///
    /// Cancel-safe: a dropped future records nothing.
    pub async fn acquire(&self) {
        if self.unlimited() {
            return;
        }
        loop {
            let wait = match self.admit(Instant::now()) {
                Ok(()) => return,
                Err(wait) => wait,
            };
            tokio::time::sleep(wait).await;
        }
    }

    /// Records an admission if one is available right now.
    pub fn try_acquire(&self) -> bool {
        self.unlimited() || self.admit(Instant::now()).is_ok()
    }

    /// Admissions available right now without waiting.
    pub fn available(&self) -> usize {
        if self.unlimited() {
            return usize::MAX;
        }
        let mut calls = self.inner.calls.lock();
        self.evict(&mut calls, Instant::now());
        self.inner.max_calls.saturating_sub(calls.len())
    }

    /// Either records `now` or returns how long to wait before the oldest stamp expires.
    fn admit(&self, now: Instant) -> Result<(), Duration> {
        let mut calls = self.inner.calls.lock();
        self.evict(&mut calls, now);
        if calls.len() < self.inner.max_calls {
            calls.push_back(now);
            return Ok(());
        }
        match calls.front() {
            Some(&oldest) => Err((oldest + self.inner.window).saturating_duration_since(now)),
            None => Err(self.inner.window),
        }
    }

    fn evict(&self, calls: &mut VecDeque<Instant>, now: Instant) {
        while let Some(&front) = calls.front() {
            if now.saturating_duration_since(front) >= self.inner.window {
                calls.pop_front();
            } else {
                break;
            }
        }
    }
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("max_calls", &self.inner.max_calls)
            .field("window", &self.inner.window)
            .field("recorded", &self.inner.calls.lock().len())
            .finish()
    }
}
