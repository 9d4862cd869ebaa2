//! Reactive listeners attached to the event bus.

pub mod hold_time;
pub mod notify;
pub mod watchdog;

use std::sync::Arc;
use std::time::Duration;

use crate::core::estimate::EstimateTracker;
use crate::core::orchestrator::Orchestrator;
use crate::directory::Directory;
use crate::events::EventKind;
use crate::gateway::MessageGateway;

pub use hold_time::HoldTimeListener;
pub use notify::{HolderNotifier, RemovalNotifier, SecondInLineNotifier};
pub use watchdog::SleepWatchdog;

/// Attach the standard listener set to the orchestrator's bus.
pub fn register_defaults(
    orchestrator: &Arc<Orchestrator>,
    tracker: Arc<EstimateTracker>,
    gateway: Arc<dyn MessageGateway>,
    directory: Arc<dyn Directory>,
    ack_timeout: Duration,
) {
    let bus = orchestrator.bus();
    bus.subscribe(
        &[EventKind::HolderChanged],
        Arc::new(HolderNotifier::new(gateway.clone(), ack_timeout)),
    );
    bus.subscribe(
        &[EventKind::HolderChanged],
        Arc::new(SleepWatchdog::new(orchestrator, gateway.clone(), ack_timeout)),
    );
    bus.subscribe(
        &[EventKind::HolderChanged],
        Arc::new(HoldTimeListener::new(tracker)),
    );
    bus.subscribe(
        &[EventKind::SecondInLineChanged],
        Arc::new(SecondInLineNotifier::new(gateway.clone())),
    );
    bus.subscribe(
        &[EventKind::ParticipantRemoved],
        Arc::new(RemovalNotifier::new(gateway, directory)),
    );
}

/// Compact human duration: `1h 5m`, `7m`, `40s`.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    match (hours, minutes) {
        (0, 0) => format!("{}s", seconds),
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h {}m", h, m),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(0)), "0s");
        assert_eq!(format_duration(Duration::from_secs(40)), "40s");
        assert_eq!(format_duration(Duration::from_secs(420)), "7m");
        assert_eq!(format_duration(Duration::from_secs(7200)), "2h");
        assert_eq!(format_duration(Duration::from_secs(3900)), "1h 5m");
    }
}
