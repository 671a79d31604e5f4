//! Poll cadence of the switch loop
//!
//! The loop only ever waits through a [`Ticker`], so tests can drive it
//! without real timers.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

/// Waits until the next poll is due
#[async_trait]
pub trait Ticker: Send {
    async fn tick(&mut self);
}

/// Fixed-period ticker backed by a tokio interval.
///
/// Must be created inside a tokio runtime with the time driver enabled.
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    pub fn new(period: Duration) -> Self {
        // First tick one period from now, not immediately
        let mut interval = time::interval_at(Instant::now() + period, period);
        // A slow monitor command should not cause a burst of catch-up polls
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) {
        self.interval.tick().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_tick_waits_a_full_period() {
        let period = Duration::from_millis(30);
        let mut ticker = IntervalTicker::new(period);

        let start = std::time::Instant::now();
        ticker.tick().await;
        assert!(start.elapsed() >= Duration::from_millis(25));
    }
}
