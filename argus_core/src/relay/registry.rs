use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::protocol::ViewerEvent;

/// Frames queued per session before newer broadcast frames start being
/// dropped for that session.
pub const SESSION_QUEUE_DEPTH: usize = 32;

/// Registry of connected viewer sessions.
///
/// Fan-out serializes an event once and hands every session queue a
/// shared reference. Sends never block: a full queue loses the frame
/// (the next tick carries fresher data anyway) and a queue whose
/// session is gone is pruned on the spot. The registry lock covers the
/// whole iteration, and dead entries are collected before removal, so
/// a session loop removing itself concurrently cannot corrupt an
/// in-flight broadcast.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<Uuid, mpsc::Sender<Arc<String>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session. Returns its id and the queue its loop
    /// drains.
    pub fn add(&self) -> (Uuid, mpsc::Receiver<Arc<String>>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(SESSION_QUEUE_DEPTH);
        self.sessions.lock().insert(id, tx);
        (id, rx)
    }

    pub fn remove(&self, id: Uuid) -> bool {
        self.sessions.lock().remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    /// Push one event to every session. Returns how many queues took it.
    pub fn broadcast(&self, event: &ViewerEvent) -> usize {
        let text = match serde_json::to_string(event) {
            Ok(text) => Arc::new(text),
            Err(error) => {
                warn!(%error, "dropping unserializable event");
                return 0;
            }
        };
        self.broadcast_text(text)
    }

    /// Push one pre-serialized frame to every session.
    pub fn broadcast_text(&self, text: Arc<String>) -> usize {
        let mut sessions = self.sessions.lock();
        let mut delivered = 0;
        let mut dead = Vec::new();
        for (id, tx) in sessions.iter() {
            match tx.try_send(text.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    debug!(session = %id, "session queue full, dropping frame");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => dead.push(*id),
            }
        }
        for id in dead {
            debug!(session = %id, "pruning closed session");
            sessions.remove(&id);
        }
        delivered
    }
}
