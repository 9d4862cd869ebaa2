//! Feeds self-timed hold durations into the estimate.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::core::estimate::EstimateTracker;
use crate::error::ListenerError;
use crate::events::{HolderChanged, Listener, QueueEvent};

/// Remembers the last holder change. When the next one is caused by the
/// participant who became holder in the last one, the gap between the two is
/// a genuine hold time. Forced removals by anyone else are ignored, and so
/// are watchdog hand-offs away from a holder who never acknowledged.
pub struct HoldTimeListener {
    tracker: Arc<EstimateTracker>,
    previous: Mutex<Option<HolderChanged>>,
}

impl HoldTimeListener {
    pub fn new(tracker: Arc<EstimateTracker>) -> Self {
        Self {
            tracker,
            previous: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Listener for HoldTimeListener {
    fn name(&self) -> &str {
        "hold-time-estimate"
    }

    async fn on_event(&self, event: &QueueEvent) -> Result<(), ListenerError> {
        let QueueEvent::HolderChanged(changed) = event else {
            return Ok(());
        };
        let previous = self
            .previous
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(changed.clone());

        let Some(previous) = previous else {
            return Ok(());
        };
        if previous.current.as_deref() != Some(changed.actor.as_str()) {
            return Ok(());
        }
        if changed.timed_out {
            tracing::debug!("Not timing {}: the turn timed out", changed.actor);
            return Ok(());
        }
        match (changed.at - previous.at).to_std() {
            Ok(duration) => {
                self.tracker.record_if_plausible(duration)?;
            }
            Err(_) => {
                tracing::warn!(
                    "Holder change at {} precedes the previous one at {}",
                    changed.at,
                    previous.at
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::SystemClock;
    use crate::core::estimate::{Estimate, PlausibilityBand};
    use crate::core::store::{MemoryStore, Store};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t(minutes: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn ev(current: &str, previous: &str, actor: &str, at: DateTime<Utc>) -> QueueEvent {
        let id = |s: &str| (!s.is_empty()).then(|| s.to_string());
        QueueEvent::HolderChanged(HolderChanged {
            current: id(current),
            previous: id(previous),
            actor: actor.to_string(),
            at,
            timed_out: false,
        })
    }

    fn listener() -> (HoldTimeListener, Arc<MemoryStore<Estimate>>) {
        let store = Arc::new(MemoryStore::<Estimate>::default());
        let tracker = EstimateTracker::new(
            store.clone(),
            PlausibilityBand::default(),
            Arc::new(SystemClock),
        );
        (HoldTimeListener::new(Arc::new(tracker)), store)
    }

    fn minutes(n: u64) -> std::time::Duration {
        std::time::Duration::from_secs(n * 60)
    }

    #[tokio::test]
    async fn test_first_in_queue() {
        let (listener, store) = listener();

        listener.on_event(&ev("123", "", "123", t(0))).await.unwrap();
        listener.on_event(&ev("abc", "123", "123", t(35))).await.unwrap();

        assert_eq!(
            store.read().unwrap(),
            Estimate {
                average_hold_duration: minutes(35),
                sample_count: 1
            }
        );
    }

    #[tokio::test]
    async fn test_too_long_and_too_short() {
        let (listener, store) = listener();

        listener.on_event(&ev("1", "", "1", t(0))).await.unwrap();
        listener.on_event(&ev("2", "1", "1", t(180))).await.unwrap();
        listener.on_event(&ev("3", "2", "2", t(183))).await.unwrap();

        assert_eq!(store.read().unwrap(), Estimate::default());
    }

    #[tokio::test]
    async fn test_in_middle_of_queue() {
        let (listener, store) = listener();

        listener.on_event(&ev("1", "2", "1", t(0))).await.unwrap();
        listener.on_event(&ev("3", "1", "1", t(35))).await.unwrap();

        assert_eq!(store.read().unwrap().sample_count, 1);
    }

    #[tokio::test]
    async fn test_forced_removal_ignored() {
        let (listener, store) = listener();

        listener.on_event(&ev("1", "2", "1", t(0))).await.unwrap();
        listener.on_event(&ev("3", "1", "4", t(35))).await.unwrap();

        assert_eq!(store.read().unwrap(), Estimate::default());
    }

    #[tokio::test]
    async fn test_timed_out_turn_ignored() {
        let (listener, store) = listener();

        listener.on_event(&ev("1", "", "1", t(0))).await.unwrap();
        let QueueEvent::HolderChanged(mut timed_out) = ev("2", "1", "1", t(20)) else {
            unreachable!()
        };
        timed_out.timed_out = true;
        listener
            .on_event(&QueueEvent::HolderChanged(timed_out))
            .await
            .unwrap();
        assert_eq!(store.read().unwrap(), Estimate::default());

        // The next holder is timed from the hand-off.
        listener.on_event(&ev("3", "2", "2", t(50))).await.unwrap();
        assert_eq!(
            store.read().unwrap(),
            Estimate {
                average_hold_duration: minutes(30),
                sample_count: 1
            }
        );
    }

    #[tokio::test]
    async fn test_only_immediately_preceding_event_counts() {
        let (listener, store) = listener();

        listener.on_event(&ev("1", "", "1", t(0))).await.unwrap();
        listener.on_event(&ev("2", "1", "9", t(20))).await.unwrap();
        // "1" is no longer the previous holder of record.
        listener.on_event(&ev("3", "2", "1", t(60))).await.unwrap();

        assert_eq!(store.read().unwrap(), Estimate::default());
    }

    #[tokio::test]
    async fn test_many_events() {
        let (listener, store) = listener();

        for i in 1..=100i64 {
            listener
                .on_event(&ev(
                    &i.to_string(),
                    &(i - 1).to_string(),
                    &(i - 1).to_string(),
                    t(i * 35),
                ))
                .await
                .unwrap();
        }

        assert_eq!(
            store.read().unwrap(),
            Estimate {
                average_hold_duration: minutes(35),
                sample_count: 99
            }
        );
    }

    #[tokio::test]
    async fn test_store_failure_surfaces() {
        let (listener, store) = listener();
        listener.on_event(&ev("1", "", "1", t(0))).await.unwrap();

        store.set_failing(true);
        let err = listener.on_event(&ev("2", "1", "1", t(30))).await.unwrap_err();
        assert!(matches!(err, ListenerError::Store(_)));
    }
}
