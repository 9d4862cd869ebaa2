//! TurnQueue library root.

pub mod cli;
pub mod config;
pub mod core;
pub mod daemon;
pub mod directory;
pub mod error;
pub mod events;
pub mod gateway;
pub mod listeners;
pub mod logging;
pub mod telegram;

#[cfg(test)]
mod testing;

pub use cli::Commands;
pub use config::{load_settings, Settings};
pub use core::{Estimate, EstimateTracker, Orchestrator, ParticipantId, QueueState};
pub use daemon::Daemon;
pub use error::{Error, QueueError, Result};
pub use events::{EventBus, EventKind, Listener, QueueEvent};
pub use gateway::{LogGateway, MessageGateway};
pub use telegram::run_telegram_daemon;
