//! Queue orchestrator: the lock-serialized state machine behind every queue command.
//!
//! Each mutating operation runs read → mutate → persist under one lock, derives
//! events from the before/after snapshots while still holding it, and queues
//! them on the bus before the lock is released, so every listener sees changes
//! in commit order. Listeners themselves run on their own tasks. A failed read or save aborts the
//! operation with [`QueueError::StoreUnavailable`]; the previously persisted
//! record stays authoritative and no events are emitted.

use std::sync::Arc;
use tokio::sync::Mutex;

use super::clock::Clock;
use super::state::{ParticipantId, QueueState};
use super::store::Store;
use crate::error::QueueError;
use crate::events::{self, EventBus, QueueEvent};

pub type Result<T> = std::result::Result<T, QueueError>;

/// What a mutation produced, besides the new state.
struct Applied<R> {
    value: R,
    bulk_removed: Vec<ParticipantId>,
    timed_out: bool,
}

impl<R> Applied<R> {
    fn value(value: R) -> Self {
        Self {
            value,
            bulk_removed: Vec::new(),
            timed_out: false,
        }
    }
}

pub struct Orchestrator {
    store: Mutex<Arc<dyn Store<QueueState>>>,
    bus: EventBus,
    clock: Arc<dyn Clock>,
}

impl Orchestrator {
    /// Build an orchestrator over `store`, which must be readable right now.
    pub fn new(
        store: Arc<dyn Store<QueueState>>,
        bus: EventBus,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let initial = store.read()?;
        tracing::info!("Queue loaded with {} participant(s)", initial.len());
        Ok(Self {
            store: Mutex::new(store),
            bus,
            clock,
        })
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Append `participant` to the end of the queue.
    pub async fn add(&self, participant: &str) -> Result<()> {
        self.mutate(participant, |q| {
            if q.contains(participant) {
                return Err(QueueError::AlreadyPresent);
            }
            q.entries.push(participant.to_string());
            Ok(Applied::value(()))
        })
        .await?;
        tracing::info!("{} joined the queue", participant);
        Ok(())
    }

    /// Remove `participant`, keeping everyone else in order. `actor` is whoever asked.
    pub async fn remove_by_id(&self, participant: &str, actor: &str) -> Result<()> {
        self.mutate(actor, |q| {
            if q.is_empty() {
                return Err(QueueError::QueueEmpty);
            }
            let index = q.position_of(participant).ok_or(QueueError::NotPresent)?;
            q.entries.remove(index);
            Ok(Applied::value(()))
        })
        .await?;
        tracing::info!("{} removed from the queue by {}", participant, actor);
        Ok(())
    }

    /// Remove the current holder and return their id.
    pub async fn pop_head(&self, actor: &str) -> Result<ParticipantId> {
        let popped = self
            .mutate(actor, |q| {
                if q.is_empty() {
                    return Err(QueueError::QueueEmpty);
                }
                Ok(Applied::value(q.entries.remove(0)))
            })
            .await?;
        tracing::info!("{} popped from the head of the queue by {}", popped, actor);
        Ok(popped)
    }

    /// Empty the queue. Returns the removed ids in their prior order.
    pub async fn clear_all(&self, actor: &str) -> Result<Vec<ParticipantId>> {
        let removed = self
            .mutate(actor, |q| {
                if q.is_empty() {
                    return Err(QueueError::QueueEmpty);
                }
                let removed = std::mem::take(&mut q.entries);
                Ok(Applied {
                    value: removed.clone(),
                    bulk_removed: removed,
                    timed_out: false,
                })
            })
            .await?;
        tracing::info!("Queue cleared by {} ({} removed)", actor, removed.len());
        Ok(removed)
    }

    /// Voluntary hand-off: the holder swaps places with the second in line.
    pub async fn pass_turn(&self, actor: &str) -> Result<()> {
        self.mutate(actor, |q| {
            if !q.is_holder(actor) {
                return Err(QueueError::NotHolder);
            }
            if q.len() < 2 {
                return Err(QueueError::NoOneToPassTo);
            }
            q.swap_first_two();
            Ok(Applied::value(()))
        })
        .await?;
        tracing::info!("{} passed the turn", actor);
        Ok(())
    }

    /// The holder confirms they are awake and using their turn.
    pub async fn acknowledge(&self, actor: &str) -> Result<()> {
        self.mutate(actor, |q| {
            if !q.is_holder(actor) {
                return Err(QueueError::NotHolder);
            }
            if !q.holder_sleeping {
                return Err(QueueError::NotSleeping);
            }
            q.holder_sleeping = false;
            Ok(Applied::value(()))
        })
        .await?;
        tracing::info!("{} acknowledged their turn", actor);
        Ok(())
    }

    /// Move the turn away from a holder who never acknowledged it.
    ///
    /// Only the ack watchdog calls this. The guards make a stale timer a no-op.
    pub(crate) async fn auto_reassign_from_sleeping_holder(&self, holder: &str) -> Result<()> {
        self.mutate(holder, |q| {
            if !q.holder_sleeping {
                return Err(QueueError::NotSleeping);
            }
            if !q.is_holder(holder) {
                return Err(QueueError::NotHolder);
            }
            if q.len() < 2 {
                return Err(QueueError::NoOneToPassTo);
            }
            q.holder_sleeping = false;
            q.swap_first_two();
            Ok(Applied {
                timed_out: true,
                ..Applied::value(())
            })
        })
        .await?;
        tracing::info!("Turn passed away from sleeping holder {}", holder);
        Ok(())
    }

    /// Consistent read-only copy of the queue.
    pub async fn snapshot(&self) -> Result<QueueState> {
        let store = self.store.lock().await;
        Ok(store.read()?)
    }

    async fn mutate<R, F>(&self, actor: &str, apply: F) -> Result<R>
    where
        F: FnOnce(&mut QueueState) -> Result<Applied<R>>,
    {
        let store = self.store.lock().await;
        let before = store.read()?;
        let mut after = before.clone();
        let applied = apply(&mut after)?;

        let now = self.clock.now();
        let mut events = events::derive(&before, &after, actor, now, &applied.bulk_removed);
        if applied.timed_out {
            for event in &mut events {
                if let QueueEvent::HolderChanged(changed) = event {
                    changed.timed_out = true;
                }
            }
        }
        if before.holder() != after.holder() {
            after.mark_holder_assigned(now);
        }

        store.save(&after)?;

        if !events.is_empty() {
            tracing::debug!("Derived {} event(s) from change by {}", events.len(), actor);
        }
        // Never blocks; listeners run after the guard drops.
        self.bus.publish(events);
        drop(store);
        Ok(applied.value)
    }
}
