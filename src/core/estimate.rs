//! Hold-time estimate: a running mean of self-timed turns and the wait
//! prediction derived from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::clock::Clock;
use super::store::Store;
use crate::config::EstimateConfig;
use crate::error::StoreError;

/// Persisted running average.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Estimate {
    #[serde(default)]
    pub average_hold_duration: Duration,

    #[serde(default)]
    pub sample_count: u32,
}

impl Estimate {
    /// Fold one more duration into the mean.
    pub fn add_one(self, duration: Duration) -> Estimate {
        let count = self.sample_count.saturating_add(1);
        let total = self
            .average_hold_duration
            .saturating_mul(self.sample_count)
            .saturating_add(duration);
        Estimate {
            average_hold_duration: total / count,
            sample_count: count,
        }
    }

    /// Expected wait for someone with `ahead` participants in front of them.
    ///
    /// Everyone strictly behind the holder costs a full average; the holder
    /// costs whatever is left of an average turn, never less than zero.
    pub fn predict_wait_time(
        &self,
        ahead: usize,
        hold_started_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Duration {
        if ahead == 0 {
            return Duration::ZERO;
        }
        let average = self.average_hold_duration;
        let elapsed = hold_started_at
            .and_then(|start| (now - start).to_std().ok())
            .unwrap_or(Duration::ZERO);
        let queued = average.saturating_mul(u32::try_from(ahead - 1).unwrap_or(u32::MAX));
        queued.saturating_add(average.saturating_sub(elapsed))
    }
}

/// Inclusive range of hold durations considered genuine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlausibilityBand {
    pub min: Duration,
    pub max: Duration,
}

impl Default for PlausibilityBand {
    fn default() -> Self {
        Self {
            min: Duration::from_secs(15 * 60),
            max: Duration::from_secs(2 * 60 * 60),
        }
    }
}

impl From<&EstimateConfig> for PlausibilityBand {
    fn from(config: &EstimateConfig) -> Self {
        Self {
            min: Duration::from_secs(config.min_plausible_secs),
            max: Duration::from_secs(config.max_plausible_secs),
        }
    }
}

impl PlausibilityBand {
    pub fn contains(&self, duration: Duration) -> bool {
        duration >= self.min && duration <= self.max
    }
}

/// Owns the persisted [`Estimate`].
pub struct EstimateTracker {
    store: Arc<dyn Store<Estimate>>,
    band: PlausibilityBand,
    clock: Arc<dyn Clock>,
}

impl EstimateTracker {
    pub fn new(store: Arc<dyn Store<Estimate>>, band: PlausibilityBand, clock: Arc<dyn Clock>) -> Self {
        Self { store, band, clock }
    }

    pub fn band(&self) -> PlausibilityBand {
        self.band
    }

    pub fn current(&self) -> Result<Estimate, StoreError> {
        self.store.read()
    }

    /// Record `duration` if it lies inside the band. Returns whether it was recorded.
    pub fn record_if_plausible(&self, duration: Duration) -> Result<bool, StoreError> {
        if !self.band.contains(duration) {
            tracing::info!("Hold time discarded: {:?}", duration);
            return Ok(false);
        }
        let updated = self.store.read()?.add_one(duration);
        self.store.save(&updated)?;
        tracing::info!(
            "Hold time recorded: {:?}, average now {:?} over {} samples",
            duration,
            updated.average_hold_duration,
            updated.sample_count
        );
        Ok(true)
    }

    pub fn predict_wait_time(
        &self,
        ahead: usize,
        hold_started_at: Option<DateTime<Utc>>,
    ) -> Result<Duration, StoreError> {
        Ok(self
            .store
            .read()?
            .predict_wait_time(ahead, hold_started_at, self.clock.now()))
    }
}
