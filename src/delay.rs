use crate::random::random_int;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, TimeZone};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;

/// Inclusive range of whole seconds to wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct DelayRange {
    pub min: u64,
    pub max: u64,
}

impl DelayRange {
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub const fn fixed(secs: u64) -> Self {
        Self { min: secs, max: secs }
    }

    pub fn is_valid(&self) -> bool {
        self.min <= self.max
    }
}

#[async_trait]
pub trait Pause: Send + Sync {
    /// Waits for a duration drawn from `range` and reports how long it was.
    async fn pause(&self, range: DelayRange) -> Result<Duration>;
}

/// Sleeps on the tokio timer for a uniformly drawn number of seconds.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomPause;

/// `None` when the wake-up time is past what chrono can represent.
fn wake_time<Tz: TimeZone>(now: DateTime<Tz>, secs: u64) -> Option<DateTime<Tz>> {
    let delta = TimeDelta::try_seconds(i64::try_from(secs).ok()?)?;
    now.checked_add_signed(delta)
}

#[async_trait]
impl Pause for RandomPause {
    async fn pause(&self, range: DelayRange) -> Result<Duration> {
        let secs = random_int(&mut rand::thread_rng(), range.min, range.max)?;

        if secs > 60 {
            if let Some(until) = wake_time(Local::now(), secs) {
                info!(
                    "⏳ sleeping until {} ({}m {}s)",
                    until.format("%H:%M:%S"),
                    secs / 60,
                    secs % 60
                );
            }
        }

        let duration = Duration::from_secs(secs);
        sleep(duration).await;
        Ok(duration)
    }
}
