//! Synthetic progress shown while a summarize request is in flight.
//!
//! The value carries no information about real completion. It creeps up by a
//! random step per tick and never passes `PROGRESS_CAP`; only the controller
//! publishes 100, once the response is in.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior};

/// Highest value the ticker can reach on its own.
pub const PROGRESS_CAP: f64 = 90.0;

/// Largest advance per tick, in percentage points.
pub const MAX_STEP: f64 = 15.0;

pub(crate) struct ProgressTicker {
    interval: Interval,
    percent: f64,
    rng: StdRng,
}

impl ProgressTicker {
    /// First tick fires one `period` after start.
    pub fn start(period: Duration) -> Self {
        Self::with_rng(period, StdRng::from_entropy())
    }

    fn with_rng(period: Duration, rng: StdRng) -> Self {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self {
            interval,
            percent: 0.0,
            rng,
        }
    }

    /// Wait for the next tick and return the new percentage.
    pub async fn tick(&mut self) -> u8 {
        self.interval.tick().await;
        self.advance()
    }

    fn advance(&mut self) -> u8 {
        let step = self.rng.gen::<f64>() * MAX_STEP;
        self.percent = (self.percent + step).min(PROGRESS_CAP);
        self.percent as u8
    }
}
