//! Robot bus abstraction.
//!
//! The gateway consumes telemetry topics and publishes command topics
//! through the [`RobotBus`] trait. The production backend speaks the
//! rosbridge JSON protocol over a WebSocket ([`RosbridgeBus`]); an
//! in-process backend ([`MemoryBus`]) backs tests and robot-free bench
//! runs.

pub mod memory;
pub mod rosbridge;

use std::marker::PhantomData;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::ArgusResult;

pub use memory::MemoryBus;
pub use rosbridge::RosbridgeBus;

/// Publish/subscribe transport to the robot side.
///
/// Publishing is best effort: a failure is reported to the caller but
/// nothing is retried or queued by the bus itself.
#[async_trait]
pub trait RobotBus: Send + Sync {
    /// Declare intent to publish `topic` carrying `message_type`.
    async fn advertise(&self, topic: &str, message_type: &str) -> ArgusResult<()>;

    /// Publish one JSON payload to `topic`.
    async fn publish(&self, topic: &str, payload: Value) -> ArgusResult<()>;

    /// Open a subscription delivering every raw sample on `topic`.
    async fn subscribe(&self, topic: &str) -> ArgusResult<RawSubscription>;
}

/// Stream of raw JSON samples from one topic.
#[derive(Debug)]
pub struct RawSubscription {
    topic: String,
    receiver: mpsc::UnboundedReceiver<Value>,
}

impl RawSubscription {
    pub(crate) fn new(topic: impl Into<String>, receiver: mpsc::UnboundedReceiver<Value>) -> Self {
        Self {
            topic: topic.into(),
            receiver,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Next raw sample; `None` once the bus side is gone.
    pub async fn recv(&mut self) -> Option<Value> {
        self.receiver.recv().await
    }

    /// Non-blocking poll. `None` covers both "nothing queued" and
    /// "closed"; callers that care use [`recv`](Self::recv).
    pub fn try_recv(&mut self) -> Option<Value> {
        self.receiver.try_recv().ok()
    }

    /// Decode samples into `T`, skipping any that do not fit.
    pub fn typed<T: DeserializeOwned>(self) -> Subscription<T> {
        Subscription {
            raw: self,
            _marker: PhantomData,
        }
    }
}

/// Typed view over a [`RawSubscription`].
///
/// Samples that fail to decode are logged and skipped: a misbehaving
/// publisher degrades its own topic, never the relay.
#[derive(Debug)]
pub struct Subscription<T> {
    raw: RawSubscription,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> Subscription<T> {
    pub fn topic(&self) -> &str {
        self.raw.topic()
    }

    /// Next decodable sample; `None` once the bus side is gone.
    pub async fn recv(&mut self) -> Option<T> {
        while let Some(value) = self.raw.recv().await {
            match serde_json::from_value(value) {
                Ok(sample) => return Some(sample),
                Err(error) => {
                    debug!(topic = %self.raw.topic(), %error, "skipping malformed sample");
                }
            }
        }
        None
    }
}
