//! Outbound messaging contract used by the listeners.

use async_trait::async_trait;

use crate::error::GatewayError;

/// Delivers a text to a participant. Best effort: callers log failures and move on.
#[async_trait]
pub trait MessageGateway: Send + Sync {
    async fn send(&self, recipient: &str, text: &str) -> Result<(), GatewayError>;
}

/// Gateway that only writes to the log. Stands in for Telegram in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogGateway;

#[async_trait]
impl MessageGateway for LogGateway {
    async fn send(&self, recipient: &str, text: &str) -> Result<(), GatewayError> {
        tracing::info!("Message to {}: {}", recipient, text);
        Ok(())
    }
}
