//! Error types for TurnQueue.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Persistence failures from a [`Store`](crate::core::store::Store).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Outcome kinds of queue operations. Callers decide the user-facing text.
#[derive(Error, Debug)]
pub enum QueueError {
    #[error("participant is already in the queue")]
    AlreadyPresent,

    #[error("participant is not in the queue")]
    NotPresent,

    #[error("queue is empty")]
    QueueEmpty,

    #[error("participant is not the current holder")]
    NotHolder,

    #[error("no one to pass the turn to")]
    NoOneToPassTo,

    #[error("holder is not sleeping")]
    NotSleeping,

    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

/// Messaging gateway failures.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Failures raised inside an event listener. Logged and dropped by the bus.
#[derive(Error, Debug)]
pub enum ListenerError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Telegram error: {0}")]
    Telegram(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl QueueError {
    /// True for the kinds a stale timer or a repeated command produces,
    /// as opposed to persistence failures.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, QueueError::StoreUnavailable(_))
    }
}
