//! Listeners that tell participants about queue changes through the gateway.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use super::format_duration;
use crate::directory::{display_name, Directory};
use crate::error::ListenerError;
use crate::events::{Listener, QueueEvent};
use crate::gateway::MessageGateway;

pub const NEXT_IN_LINE_TEXT: &str = "You are next in line. Get ready!";

pub fn your_turn_text(ack_timeout: Duration) -> String {
    format!(
        "Your turn has come! Send /ack within {} or the turn passes to the next person.",
        format_duration(ack_timeout)
    )
}

pub fn removed_text(by: &str) -> String {
    format!("You were removed from the queue by {}.", by)
}

/// Tells a new holder that the turn is theirs and how long they have to ack.
pub struct HolderNotifier {
    gateway: Arc<dyn MessageGateway>,
    ack_timeout: Duration,
}

impl HolderNotifier {
    pub fn new(gateway: Arc<dyn MessageGateway>, ack_timeout: Duration) -> Self {
        Self {
            gateway,
            ack_timeout,
        }
    }
}

#[async_trait]
impl Listener for HolderNotifier {
    fn name(&self) -> &str {
        "holder-notifier"
    }

    async fn on_event(&self, event: &QueueEvent) -> Result<(), ListenerError> {
        let QueueEvent::HolderChanged(changed) = event else {
            return Ok(());
        };
        let Some(holder) = &changed.current else {
            return Ok(());
        };
        self.gateway
            .send(holder, &your_turn_text(self.ack_timeout))
            .await?;
        Ok(())
    }
}

/// Warns the participant who just moved into position 1.
pub struct SecondInLineNotifier {
    gateway: Arc<dyn MessageGateway>,
}

impl SecondInLineNotifier {
    pub fn new(gateway: Arc<dyn MessageGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Listener for SecondInLineNotifier {
    fn name(&self) -> &str {
        "second-in-line-notifier"
    }

    async fn on_event(&self, event: &QueueEvent) -> Result<(), ListenerError> {
        if let QueueEvent::SecondInLineChanged(changed) = event {
            self.gateway.send(&changed.current, NEXT_IN_LINE_TEXT).await?;
        }
        Ok(())
    }
}

/// Tells each participant dropped by a bulk clear who cleared them.
pub struct RemovalNotifier {
    gateway: Arc<dyn MessageGateway>,
    directory: Arc<dyn Directory>,
}

impl RemovalNotifier {
    pub fn new(gateway: Arc<dyn MessageGateway>, directory: Arc<dyn Directory>) -> Self {
        Self { gateway, directory }
    }
}

#[async_trait]
impl Listener for RemovalNotifier {
    fn name(&self) -> &str {
        "removal-notifier"
    }

    async fn on_event(&self, event: &QueueEvent) -> Result<(), ListenerError> {
        let QueueEvent::ParticipantRemoved(removed) = event else {
            return Ok(());
        };
        if removed.removed == removed.actor {
            return Ok(());
        }
        let by = display_name(self.directory.as_ref(), &removed.actor);
        self.gateway.send(&removed.removed, &removed_text(&by)).await?;
        Ok(())
    }
}
