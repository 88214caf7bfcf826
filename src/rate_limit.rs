//! Sliding-window call limiter for one reading session.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::ReadingError;

pub const DEFAULT_MAX_CALLS: usize = 6;
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Accepts at most `max_calls` attempts within any `window`.
///
/// Pruning happens lazily on each attempt; there are no timers.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    max_calls: usize,
    window: Duration,
    calls: VecDeque<Instant>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CALLS, DEFAULT_WINDOW)
    }
}

impl RateLimiter {
    pub fn new(max_calls: usize, window: Duration) -> Self {
        Self {
            max_calls,
            window,
            calls: VecDeque::new(),
        }
    }

    /// Prune calls older than the window, then record `now` if under the limit.
    /// A rejected attempt is not recorded.
    pub fn try_acquire_at(&mut self, now: Instant) -> Result<(), ReadingError> {
        self.prune(now);

        if self.calls.len() >= self.max_calls {
            debug!(
                in_window = self.calls.len(),
                max = self.max_calls,
                "rate_limit_rejected"
            );
            return Err(ReadingError::RateLimited {
                max: self.max_calls,
                window_secs: self.window.as_secs(),
            });
        }

        self.calls.push_back(now);
        Ok(())
    }

    /// Calls currently counted against the window (as of the last attempt).
    pub fn in_window(&self) -> usize {
        self.calls.len()
    }

    fn prune(&mut self, now: Instant) {
        while let Some(&oldest) = self.calls.front() {
            if now.saturating_duration_since(oldest) < self.window {
                break;
            }
            self.calls.pop_front();
        }
    }
}
