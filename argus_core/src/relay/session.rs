//! Per-session broadcast loop.
//!
//! Each connected viewer gets one task that owns its socket, so command
//! intake stays low-latency while telemetry leaves on a fixed cadence,
//! and a stalled peer only ever harms itself.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ArgusResult;
use crate::protocol::ViewerEvent;
use crate::relay::router::CommandRouter;
use crate::telemetry::{RobotState, TelemetrySnapshot};

/// Sending half of a session socket.
#[async_trait]
pub trait SessionSink: Send {
    async fn send_text(&mut self, text: String) -> ArgusResult<()>;
    async fn send_pong(&mut self, payload: Vec<u8>) -> ArgusResult<()>;
}

/// Receiving half of a session socket.
#[async_trait]
pub trait SessionStream: Send {
    /// Next inbound item; `None` when the transport is gone.
    async fn next_input(&mut self) -> Option<SessionInput>;
}

/// Inbound socket traffic the session loop reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionInput {
    Text(String),
    Ping(Vec<u8>),
    Close,
    /// Frames the relay has no use for (binary payloads, pongs).
    Ignored,
}

/// Build one broadcast tick's frames, in wire order: pose plus traveled
/// distance when a fix exists (else the time placeholder), then battery
/// and map when sampled, then the status label, always last.
pub fn telemetry_frame(snapshot: &TelemetrySnapshot) -> Vec<ViewerEvent> {
    let mut frame = Vec::with_capacity(5);
    match &snapshot.pose {
        Some(pose) => {
            frame.push(ViewerEvent::pose(pose));
            frame.push(ViewerEvent::distance(snapshot.distance_m));
        }
        None => frame.push(ViewerEvent::time(snapshot.patrol_min)),
    }
    if let Some(battery) = &snapshot.battery {
        frame.push(ViewerEvent::battery(battery));
    }
    if let Some(map) = &snapshot.map {
        frame.push(ViewerEvent::map(map));
    }
    frame.push(ViewerEvent::state(snapshot.status));
    frame
}

/// Drive one session until it disconnects.
///
/// Emits the telemetry frame on every cadence tick, forwards queued
/// out-of-band pushes, answers pings, and hands inbound text to the
/// command router. Exits on peer close, on the first failed send, or
/// once the push queue is gone from the registry side.
pub(crate) async fn drive<W, R>(
    id: Uuid,
    state: &RobotState,
    router: &CommandRouter,
    mut queue: mpsc::Receiver<Arc<String>>,
    cadence: Duration,
    mut sink: W,
    mut stream: R,
) where
    W: SessionSink,
    R: SessionStream,
{
    let mut ticker = time::interval(cadence);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    'session: loop {
        tokio::select! {
            _ = ticker.tick() => {
                let snapshot = state.snapshot();
                for event in telemetry_frame(&snapshot) {
                    let text = match serde_json::to_string(&event) {
                        Ok(text) => text,
                        Err(error) => {
                            warn!(session = %id, %error, "skipping unserializable frame");
                            continue;
                        }
                    };
                    if sink.send_text(text).await.is_err() {
                        debug!(session = %id, "send failed, closing session");
                        break 'session;
                    }
                }
            }
            pushed = queue.recv() => match pushed {
                Some(text) => {
                    if sink.send_text((*text).clone()).await.is_err() {
                        debug!(session = %id, "send failed, closing session");
                        break 'session;
                    }
                }
                None => break 'session,
            },
            input = stream.next_input() => match input {
                Some(SessionInput::Text(raw)) => router.route_text(&raw).await,
                Some(SessionInput::Ping(payload)) => {
                    if sink.send_pong(payload).await.is_err() {
                        break 'session;
                    }
                }
                Some(SessionInput::Ignored) => {}
                Some(SessionInput::Close) | None => {
                    debug!(session = %id, "peer closed");
                    break 'session;
                }
            },
        }
    }
}
