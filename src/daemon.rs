//! Wires stores, orchestrator, estimate tracker and listeners together.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Settings;
use crate::core::{
    Clock, Estimate, EstimateTracker, JsonFileStore, Orchestrator, PlausibilityBand, QueueState,
    Store, SystemClock,
};
use crate::directory::ParticipantDirectory;
use crate::error::Result;
use crate::events::EventBus;
use crate::gateway::MessageGateway;
use crate::listeners;

pub const QUEUE_FILE: &str = "queue.json";
pub const ESTIMATE_FILE: &str = "estimate.json";

pub fn queue_path(settings: &Settings) -> Result<PathBuf> {
    Ok(settings.queue.data_dir()?.join(QUEUE_FILE))
}

pub fn estimate_path(settings: &Settings) -> Result<PathBuf> {
    Ok(settings.queue.data_dir()?.join(ESTIMATE_FILE))
}

/// A running queue with its listeners attached.
pub struct Daemon {
    pub orchestrator: Arc<Orchestrator>,
    pub tracker: Arc<EstimateTracker>,
    pub directory: Arc<ParticipantDirectory>,
    pub clock: Arc<dyn Clock>,
    pub ack_timeout: Duration,
}

impl Daemon {
    /// Open the JSON stores under the configured data directory.
    /// Must be called inside a tokio runtime.
    pub fn open(settings: &Settings, gateway: Arc<dyn MessageGateway>) -> Result<Self> {
        let queue_store = Arc::new(JsonFileStore::<QueueState>::new(queue_path(settings)?));
        let estimate_store = Arc::new(JsonFileStore::<Estimate>::new(estimate_path(settings)?));
        tracing::info!("Queue store: {}", queue_store.path().display());

        Self::with_stores(
            settings,
            queue_store,
            estimate_store,
            gateway,
            Arc::new(SystemClock),
        )
    }

    pub fn with_stores(
        settings: &Settings,
        queue_store: Arc<dyn Store<QueueState>>,
        estimate_store: Arc<dyn Store<Estimate>>,
        gateway: Arc<dyn MessageGateway>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let ack_timeout = settings.queue.ack_timeout();
        let orchestrator = Arc::new(Orchestrator::new(queue_store, EventBus::new(), clock.clone())?);
        let tracker = Arc::new(EstimateTracker::new(
            estimate_store,
            PlausibilityBand::from(&settings.estimate),
            clock.clone(),
        ));
        let directory = Arc::new(ParticipantDirectory::new());

        listeners::register_defaults(
            &orchestrator,
            tracker.clone(),
            gateway,
            directory.clone(),
            ack_timeout,
        );

        Ok(Self {
            orchestrator,
            tracker,
            directory,
            clock,
            ack_timeout,
        })
    }
}
