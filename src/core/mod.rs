//! Core module - queue state, persistence, estimates and the orchestrator.
//!
//! This module contains the heart of TurnQueue:
//! - The persisted queue record and its store
//! - The hold-time estimate
//! - The lock-serialized orchestrator that owns every queue mutation

pub mod clock;
pub mod estimate;
pub mod orchestrator;
pub mod state;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use estimate::{Estimate, EstimateTracker, PlausibilityBand};
pub use orchestrator::Orchestrator;
pub use state::{ParticipantId, QueueState};
pub use store::{JsonFileStore, MemoryStore, Store};
