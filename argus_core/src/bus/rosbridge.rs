//! rosbridge protocol backend.
//!
//! Speaks the rosbridge v2 JSON protocol over a WebSocket: `subscribe`
//! and `advertise` declarations going out, `publish` frames in both
//! directions. One reader task demultiplexes incoming samples to topic
//! subscribers; one writer task serializes outgoing frames so callers
//! never contend on the socket.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info};

use crate::bus::{RawSubscription, RobotBus};
use crate::error::{ArgusError, ArgusResult};

type TopicRoutes = Arc<Mutex<HashMap<String, Vec<mpsc::UnboundedSender<Value>>>>>;

/// Client connection to a rosbridge server.
#[derive(Debug)]
pub struct RosbridgeBus {
    writer: mpsc::UnboundedSender<Message>,
    routes: TopicRoutes,
}

impl RosbridgeBus {
    /// Connect to a rosbridge endpoint, e.g. `ws://robot:9090`.
    ///
    /// Fails fast on an unreachable server: startup policy (retry,
    /// backoff, giving up) belongs to the caller.
    pub async fn connect(url: &str) -> ArgusResult<Self> {
        let (socket, _) = connect_async(url).await.map_err(ArgusError::bus)?;
        info!(url, "connected to rosbridge");
        let (mut sink, mut stream) = socket.split();

        let (writer, mut outgoing) = mpsc::unbounded_channel::<Message>();
        tokio::spawn(async move {
            while let Some(frame) = outgoing.recv().await {
                if let Err(error) = sink.send(frame).await {
                    error!(%error, "rosbridge write failed, dropping connection");
                    break;
                }
            }
        });

        let routes: TopicRoutes = Arc::new(Mutex::new(HashMap::new()));
        let reader_routes = routes.clone();
        tokio::spawn(async move {
            while let Some(item) = stream.next().await {
                match item {
                    Ok(Message::Text(text)) => dispatch(&reader_routes, &text),
                    Ok(Message::Close(_)) => {
                        info!("rosbridge closed the connection");
                        break;
                    }
                    // Pings are answered by the protocol layer on read.
                    Ok(_) => {}
                    Err(error) => {
                        error!(%error, "rosbridge read failed, dropping connection");
                        break;
                    }
                }
            }
            // Dropping the routes wakes every subscription with `None`.
            reader_routes.lock().clear();
        });

        Ok(Self { writer, routes })
    }

    fn send_frame(&self, frame: Value) -> ArgusResult<()> {
        self.writer
            .send(Message::Text(frame.to_string()))
            .map_err(|_| ArgusError::Bus("rosbridge connection closed".into()))
    }
}

#[async_trait]
impl RobotBus for RosbridgeBus {
    async fn advertise(&self, topic: &str, message_type: &str) -> ArgusResult<()> {
        self.send_frame(json!({
            "op": "advertise",
            "topic": topic,
            "type": message_type,
        }))
    }

    async fn publish(&self, topic: &str, payload: Value) -> ArgusResult<()> {
        self.send_frame(json!({
            "op": "publish",
            "topic": topic,
            "msg": payload,
        }))
    }

    async fn subscribe(&self, topic: &str) -> ArgusResult<RawSubscription> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.routes.lock().entry(topic.to_string()).or_default().push(tx);
        self.send_frame(json!({
            "op": "subscribe",
            "topic": topic,
        }))?;
        Ok(RawSubscription::new(topic, rx))
    }
}

/// Route one incoming rosbridge frame to the matching subscribers.
///
/// Senders whose receiver is gone are dropped from the route on the
/// spot. Non-`publish` ops (status, service traffic) are ignored.
fn dispatch(routes: &TopicRoutes, raw: &str) {
    let mut frame: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(error) => {
            debug!(%error, "unparseable rosbridge frame");
            return;
        }
    };

    let op = frame.get("op").and_then(Value::as_str);
    if op != Some("publish") {
        debug!(op = op.unwrap_or("<none>"), "ignoring rosbridge frame");
        return;
    }

    let topic = match frame.get("topic").and_then(Value::as_str) {
        Some(topic) => topic.to_string(),
        None => {
            debug!("publish frame without topic");
            return;
        }
    };
    let msg = frame
        .get_mut("msg")
        .map(Value::take)
        .unwrap_or(Value::Null);

    let mut routes = routes.lock();
    if let Some(subscribers) = routes.get_mut(&topic) {
        subscribers.retain(|tx| tx.send(msg.clone()).is_ok());
    }
}
