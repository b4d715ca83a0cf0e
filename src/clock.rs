//! Wall-clock source and periodic tick source for the scheduler
//!
//! The scheduler never sleeps until a deadline. It stores absolute instants
//! and re-evaluates them whenever the tick source fires, so expiry is
//! detected at most one tick late.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior};

/// Source of "now" for the scheduler service
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock anchored once at construction and advanced by the tokio
/// monotonic clock.
///
/// Wall-clock jumps after construction are ignored. Under a paused tokio
/// runtime it advances with `tokio::time::advance`.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    anchor_wall: DateTime<Utc>,
    anchor_instant: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::anchored_at(Utc::now())
    }

    /// Anchor the clock at an explicit wall-clock instant
    pub fn anchored_at(anchor_wall: DateTime<Utc>) -> Self {
        Self {
            anchor_wall,
            anchor_instant: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = self.anchor_instant.elapsed();
        // Elapsed time since process start always fits in a TimeDelta
        self.anchor_wall + chrono::Duration::from_std(elapsed).unwrap_or_default()
    }
}

/// Periodic tick source with no logic of its own
pub struct Ticker {
    interval: Interval,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        let mut interval = tokio::time::interval(period);
        // A late tick is evaluated once, not replayed in a burst
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval }
    }

    pub async fn tick(&mut self) {
        self.interval.tick().await;
    }

    /// Restart the period from now
    pub fn reset(&mut self) {
        self.interval.reset();
    }
}
