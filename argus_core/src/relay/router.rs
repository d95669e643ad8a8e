use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::bus::RobotBus;
use crate::messages::{PatrolAction, PatrolCommand, Twist};
use crate::protocol::{ClientCommand, ViewerEvent};
use crate::relay::registry::SessionRegistry;
use crate::relay::Topics;
use crate::telemetry::RobotState;

/// Dispatches decoded session commands to bus publications and state
/// mutations.
///
/// Commands are best effort end to end: a bus publish failure is
/// logged and forgotten, and the issuing session is never sent an
/// error. Stale viewers simply catch up on the next tick.
pub struct CommandRouter {
    state: Arc<RobotState>,
    registry: Arc<SessionRegistry>,
    bus: Arc<dyn RobotBus>,
    topics: Topics,
}

impl CommandRouter {
    pub fn new(
        state: Arc<RobotState>,
        registry: Arc<SessionRegistry>,
        bus: Arc<dyn RobotBus>,
        topics: Topics,
    ) -> Self {
        Self {
            state,
            registry,
            bus,
            topics,
        }
    }

    /// Decode and dispatch one raw inbound frame. Payloads that do not
    /// decode to a known command are dropped here.
    pub async fn route_text(&self, raw: &str) {
        match serde_json::from_str::<ClientCommand>(raw) {
            Ok(command) => self.route(command).await,
            Err(error) => debug!(%error, "dropping undecodable inbound frame"),
        }
    }

    pub async fn route(&self, command: ClientCommand) {
        match command {
            ClientCommand::Patrol { action } => self.handle_patrol(action).await,
            ClientCommand::CmdVel { linear, angular } => {
                self.publish_velocity(Twist::new(linear, angular)).await;
            }
        }
    }

    /// Publish the patrol verb, update distance/timer/status, and push
    /// the new label to every session before returning.
    async fn handle_patrol(&self, action: PatrolAction) {
        info!(action = action.as_str(), "patrol command");
        self.publish(&self.topics.patrol, &PatrolCommand::new(action))
            .await;
        if action == PatrolAction::Stop {
            self.publish_velocity(Twist::zero()).await;
        }
        let label = self.state.apply_patrol(action);
        self.registry.broadcast(&ViewerEvent::state(label));
    }

    async fn publish_velocity(&self, velocity: Twist) {
        self.publish(&self.topics.cmd_vel, &velocity).await;
    }

    /// Best-effort bus publish: failures are logged, not retried, and
    /// not reported back to the session.
    async fn publish<T: Serialize>(&self, topic: &str, message: &T) {
        let payload = match serde_json::to_value(message) {
            Ok(payload) => payload,
            Err(error) => {
                warn!(topic, %error, "failed to encode bus message");
                return;
            }
        };
        if let Err(error) = self.bus.publish(topic, payload).await {
            warn!(topic, %error, "bus publish failed");
        }
    }
}
