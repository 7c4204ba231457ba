//! Round-trip rate measurement over whole one-second windows.

use std::time::{Duration, Instant};

/// Minimum window length before a rate is published.
pub const RATE_WINDOW: Duration = Duration::from_millis(1000);

/// Counts completed round trips and publishes a per-second rate once each
/// window is at least [`RATE_WINDOW`] long.
///
/// `count` is always the number of completions since `window_start`; both are
/// reset together in [`RateCounter::poll`].
#[derive(Debug, Clone)]
pub struct RateCounter {
    window_start: Instant,
    count: u32,
    last_published: Option<u32>,
}

impl RateCounter {
    pub fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            count: 0,
            last_published: None,
        }
    }

    /// Record one completed round trip.
    pub fn record_completion(&mut self) {
        self.count = self.count.saturating_add(1);
    }

    /// Publish `round(count / elapsed_secs)` if the window has run for at
    /// least one second, then start a new window at `now`.
    ///
    /// Returns `None` while the current window is still partial.
    pub fn poll(&mut self, now: Instant) -> Option<u32> {
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < RATE_WINDOW {
            return None;
        }

        let rate = (f64::from(self.count) / elapsed.as_secs_f64()).round() as u32;
        self.count = 0;
        self.window_start = now;
        self.last_published = Some(rate);
        Some(rate)
    }

    /// Completions in the current, unfinished window.
    pub fn pending(&self) -> u32 {
        self.count
    }

    /// The most recently published rate.
    pub fn last_published(&self) -> Option<u32> {
        self.last_published
    }
}
