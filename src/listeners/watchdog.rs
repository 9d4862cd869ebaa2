//! Ack watchdog: moves the turn on when a new holder never acknowledges it.
//!
//! Every holder assignment arms one timer for that holder. When it fires, the
//! orchestrator re-checks the holder and the sleeping flag under its lock, so a
//! timer that outlived its assignment just fails a guard and is dropped.
//! Re-arming for a holder who got the turn back aborts their older timer,
//! otherwise it would cut the new ack window short.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::core::orchestrator::Orchestrator;
use crate::core::state::ParticipantId;
use crate::error::{ListenerError, QueueError};
use crate::events::{Listener, QueueEvent};
use crate::gateway::MessageGateway;

pub const PASSED_WHILE_AWAY_TEXT: &str =
    "Your turn passed to the next person while you were away.";
pub const ALONE_WHILE_AWAY_TEXT: &str =
    "I would have passed your turn while you were away, but you are alone in the queue.";

pub struct SleepWatchdog {
    orchestrator: Weak<Orchestrator>,
    gateway: Arc<dyn MessageGateway>,
    ack_timeout: Duration,
    timers: Mutex<HashMap<ParticipantId, JoinHandle<()>>>,
}

impl SleepWatchdog {
    pub fn new(
        orchestrator: &Arc<Orchestrator>,
        gateway: Arc<dyn MessageGateway>,
        ack_timeout: Duration,
    ) -> Self {
        Self {
            orchestrator: Arc::downgrade(orchestrator),
            gateway,
            ack_timeout,
            timers: Mutex::new(HashMap::new()),
        }
    }

    fn arm(&self, holder: &str) {
        let orchestrator = self.orchestrator.clone();
        let gateway = self.gateway.clone();
        let ack_timeout = self.ack_timeout;
        let timer_holder = holder.to_string();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(ack_timeout).await;
            let Some(orchestrator) = orchestrator.upgrade() else {
                tracing::debug!("Ack timer for {} fired after shutdown", timer_holder);
                return;
            };
            fire(&orchestrator, gateway.as_ref(), &timer_holder).await;
        });

        let mut timers = self.timers.lock().unwrap_or_else(|e| e.into_inner());
        timers.retain(|_, timer| !timer.is_finished());
        if let Some(stale) = timers.insert(holder.to_string(), handle) {
            stale.abort();
        }
        tracing::debug!("Armed {:?} ack timer for {}", ack_timeout, holder);
    }
}

async fn fire(orchestrator: &Orchestrator, gateway: &dyn MessageGateway, holder: &str) {
    let text = match orchestrator.auto_reassign_from_sleeping_holder(holder).await {
        Ok(()) => PASSED_WHILE_AWAY_TEXT,
        Err(QueueError::NoOneToPassTo) => {
            tracing::info!("Holder {} is asleep but alone in the queue", holder);
            ALONE_WHILE_AWAY_TEXT
        }
        Err(e @ (QueueError::NotHolder | QueueError::NotSleeping)) => {
            tracing::debug!("Ack timer for {} is stale: {}", holder, e);
            return;
        }
        Err(e) => {
            tracing::warn!("Could not pass the turn away from {}: {}", holder, e);
            return;
        }
    };
    if let Err(e) = gateway.send(holder, text).await {
        tracing::warn!("Failed to tell {} about their turn: {}", holder, e);
    }
}

#[async_trait]
impl Listener for SleepWatchdog {
    fn name(&self) -> &str {
        "sleep-watchdog"
    }

    async fn on_event(&self, event: &QueueEvent) -> Result<(), ListenerError> {
        if let QueueEvent::HolderChanged(changed) = event {
            if let Some(holder) = &changed.current {
                self.arm(holder);
            }
        }
        Ok(())
    }
}
