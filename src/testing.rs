//! Test doubles shared by the unit tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;

use crate::error::{GatewayError, ListenerError};
use crate::events::{Listener, QueueEvent};
use crate::gateway::MessageGateway;

const WAIT: Duration = Duration::from_secs(5);
const SETTLE: Duration = Duration::from_millis(20);

struct Recorder<T> {
    sender: UnboundedSender<T>,
    receiver: Mutex<UnboundedReceiver<T>>,
}

impl<T> Recorder<T> {
    fn new() -> Self {
        let (sender, receiver) = unbounded_channel();
        Self {
            sender,
            receiver: Mutex::new(receiver),
        }
    }

    fn push(&self, item: T) {
        let _ = self.sender.send(item);
    }

    async fn next_within(&self, wait: Duration) -> T {
        let mut receiver = self.receiver.lock().await;
        tokio::time::timeout(wait, receiver.recv())
            .await
            .expect("timed out waiting for a recorded item")
            .expect("recorder closed")
    }

    async fn is_quiet(&self) -> bool {
        tokio::time::sleep(SETTLE).await;
        self.receiver.lock().await.try_recv().is_err()
    }
}

/// Listener that remembers every event it receives.
pub struct RecordingListener {
    events: Recorder<QueueEvent>,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Recorder::new(),
        })
    }

    pub async fn next(&self) -> QueueEvent {
        self.events.next_within(WAIT).await
    }

    pub async fn next_within(&self, wait: Duration) -> QueueEvent {
        self.events.next_within(wait).await
    }

    /// True if nothing else arrives once pending work has had a chance to run.
    pub async fn is_quiet(&self) -> bool {
        self.events.is_quiet().await
    }
}

#[async_trait]
impl Listener for RecordingListener {
    fn name(&self) -> &str {
        "recording"
    }

    async fn on_event(&self, event: &QueueEvent) -> Result<(), ListenerError> {
        self.events.push(event.clone());
        Ok(())
    }
}

/// Gateway that records outgoing messages and can be told to fail.
pub struct RecordingGateway {
    messages: Recorder<(String, String)>,
    failing: AtomicBool,
}

impl RecordingGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            messages: Recorder::new(),
            failing: AtomicBool::new(false),
        })
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn next(&self) -> (String, String) {
        self.messages.next_within(WAIT).await
    }

    pub async fn next_within(&self, wait: Duration) -> (String, String) {
        self.messages.next_within(wait).await
    }

    pub async fn is_quiet(&self) -> bool {
        self.messages.is_quiet().await
    }
}

#[async_trait]
impl MessageGateway for RecordingGateway {
    async fn send(&self, recipient: &str, text: &str) -> Result<(), GatewayError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(GatewayError::Delivery("gateway down".to_string()));
        }
        self.messages.push((recipient.to_string(), text.to_string()));
        Ok(())
    }
}
