//! In-process bus backend.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::bus::{RawSubscription, RobotBus};
use crate::error::ArgusResult;

/// Loopback bus for tests and robot-free runs.
///
/// Publishes are delivered synchronously to every local subscriber of
/// the topic, mirroring the echo a rosbridge server produces when the
/// gateway subscribes to a topic it also publishes on.
#[derive(Debug, Default, Clone)]
pub struct MemoryBus {
    routes: Arc<Mutex<HashMap<String, Vec<mpsc::UnboundedSender<Value>>>>>,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subscriptions on `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.routes.lock().get(topic).map_or(0, Vec::len)
    }
}

#[async_trait]
impl RobotBus for MemoryBus {
    async fn advertise(&self, _topic: &str, _message_type: &str) -> ArgusResult<()> {
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: Value) -> ArgusResult<()> {
        let mut routes = self.routes.lock();
        if let Some(subscribers) = routes.get_mut(topic) {
            subscribers.retain(|tx| tx.send(payload.clone()).is_ok());
        }
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> ArgusResult<RawSubscription> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.routes.lock().entry(topic.to_string()).or_default().push(tx);
        Ok(RawSubscription::new(topic, rx))
    }
}
