//! Rolling-window rate limiter.
//!
//! Admits at most `capacity` calls whose admission timestamps fall inside
//! any trailing window of `period`. Waiters are served in arrival order: the
//! turn is handed out by a fair async mutex, and only the holder of the turn
//! sleeps until the oldest admission leaves the window.

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

pub struct RateLimiter {
    capacity: usize,
    period: Duration,
    /// Admission timestamps, oldest first.
    window: Mutex<VecDeque<Instant>>,
    /// FIFO queue of callers waiting for a slot.
    turn: tokio::sync::Mutex<()>,
}

impl RateLimiter {
    /// A zero capacity is treated as one.
    #[must_use]
    pub fn new(capacity: u32, period: Duration) -> Self {
        let capacity = usize::try_from(capacity.max(1)).unwrap_or(usize::MAX);
        Self {
            capacity,
            period,
            window: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            turn: tokio::sync::Mutex::new(()),
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Wait until one more call fits in the window, then reserve it.
    ///
    /// Dropping the future while it waits reserves nothing and passes the
    /// turn to the next waiter.
    pub async fn acquire(&self) {
        let _turn = self.turn.lock().await;
        loop {
            let wake_at = {
                let mut window = self.window.lock();
                let now = Instant::now();
                self.evict(&mut window, now);
                if window.len() < self.capacity {
                    window.push_back(now);
                    return;
                }
                window.front().map(|oldest| *oldest + self.period)
            };
            if let Some(wake_at) = wake_at {
                tracing::debug!(
                    capacity = self.capacity,
                    wait_ms = wake_at.saturating_duration_since(Instant::now()).as_millis(),
                    "Rate window full, waiting for a slot"
                );
                tokio::time::sleep_until(wake_at).await;
            }
        }
    }

    /// Calls admitted within the trailing window as of now.
    #[must_use]
    pub fn calls_in_window(&self) -> usize {
        let now = Instant::now();
        self.window
            .lock()
            .iter()
            .filter(|admitted| now.saturating_duration_since(**admitted) < self.period)
            .count()
    }

    fn evict(&self, window: &mut VecDeque<Instant>, now: Instant) {
        while let Some(oldest) = window.front() {
            if now.saturating_duration_since(*oldest) >= self.period {
                window.pop_front();
            } else {
                break;
            }
        }
    }
}
