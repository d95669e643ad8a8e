//! The relay engine: bus telemetry pumped into the state cache on one
//! side, per-session broadcast loops and command routing on the other.

pub mod registry;
pub mod router;
pub mod session;

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::bus::{RobotBus, Subscription};
use crate::error::{ArgusError, ArgusResult};
use crate::messages::{BatteryState, OccupancyGrid, PoseEstimate, Twist};
use crate::protocol::ViewerEvent;
use crate::telemetry::RobotState;

pub use registry::{SessionRegistry, SESSION_QUEUE_DEPTH};
pub use router::CommandRouter;
pub use session::{telemetry_frame, SessionInput, SessionSink, SessionStream};

/// Bus topic names the relay consumes and publishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Topics {
    /// Localization estimates (consumed).
    pub pose: String,
    /// Occupancy grid (consumed).
    pub map: String,
    /// Battery reports (consumed).
    pub battery: String,
    /// Velocity commands (published, and consumed back as the echo that
    /// drives motion classification).
    pub cmd_vel: String,
    /// Patrol verbs (published).
    pub patrol: String,
}

impl Default for Topics {
    fn default() -> Self {
        Self {
            pose: "/amcl_pose".to_string(),
            map: "/map".to_string(),
            battery: "/battery".to_string(),
            cmd_vel: "/cmd_vel".to_string(),
            patrol: "/patrol_cmd".to_string(),
        }
    }
}

/// Relay tuning.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub topics: Topics,
    /// Per-session telemetry push interval.
    pub cadence: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            topics: Topics::default(),
            cadence: Duration::from_millis(500),
        }
    }
}

/// Owns the state cache and session registry, pumps bus telemetry into
/// the cache, and drives one broadcast loop per connected session.
pub struct Relay {
    state: Arc<RobotState>,
    registry: Arc<SessionRegistry>,
    router: Arc<CommandRouter>,
    bus: Arc<dyn RobotBus>,
    config: RelayConfig,
}

impl Relay {
    pub fn new(bus: Arc<dyn RobotBus>, config: RelayConfig) -> Self {
        let state = Arc::new(RobotState::new());
        let registry = Arc::new(SessionRegistry::new());
        let router = Arc::new(CommandRouter::new(
            state.clone(),
            registry.clone(),
            bus.clone(),
            config.topics.clone(),
        ));
        Self {
            state,
            registry,
            router,
            bus,
            config,
        }
    }

    /// Advertise the command topics and spawn one pump task per
    /// telemetry topic.
    ///
    /// Must complete before sessions are accepted: a bus that cannot
    /// provide these subscriptions is a startup failure, not something
    /// to limp along without.
    pub async fn start(&self) -> ArgusResult<()> {
        // Session tickers cannot run on a zero period; refuse it up
        // front instead of panicking inside every session task.
        if self.config.cadence.is_zero() {
            return Err(ArgusError::Config(
                "cadence must be greater than zero".to_string(),
            ));
        }

        let topics = &self.config.topics;
        self.bus
            .advertise(&topics.cmd_vel, "geometry_msgs/Twist")
            .await?;
        self.bus.advertise(&topics.patrol, "std_msgs/String").await?;

        let pose = self
            .bus
            .subscribe(&topics.pose)
            .await?
            .typed::<PoseEstimate>();
        let map = self
            .bus
            .subscribe(&topics.map)
            .await?
            .typed::<OccupancyGrid>();
        let battery = self
            .bus
            .subscribe(&topics.battery)
            .await?
            .typed::<BatteryState>();
        let velocity = self.bus.subscribe(&topics.cmd_vel).await?.typed::<Twist>();

        let state = self.state.clone();
        spawn_pump(pose, move |estimate: PoseEstimate| {
            state.update_pose(estimate.pose.pose);
        });
        let state = self.state.clone();
        spawn_pump(map, move |grid| state.update_map(grid));
        let state = self.state.clone();
        spawn_pump(battery, move |sample| state.update_battery(sample));

        // Motion transitions go out immediately rather than waiting for
        // each session's next tick.
        let state = self.state.clone();
        let registry = self.registry.clone();
        spawn_pump(velocity, move |sample| {
            if let Some(motion) = state.update_velocity(sample) {
                debug!(state = motion.label(), "motion transition");
                registry.broadcast(&ViewerEvent::state(motion.label()));
            }
        });

        info!(
            cadence_ms = self.config.cadence.as_millis() as u64,
            "relay started"
        );
        Ok(())
    }

    /// Serve one connected session to completion.
    pub async fn serve_session<W, R>(&self, sink: W, stream: R)
    where
        W: SessionSink,
        R: SessionStream,
    {
        let (id, queue) = self.registry.add();
        info!(session = %id, sessions = self.registry.len(), "session connected");
        session::drive(
            id,
            &self.state,
            &self.router,
            queue,
            self.config.cadence,
            sink,
            stream,
        )
        .await;
        self.registry.remove(id);
        info!(session = %id, sessions = self.registry.len(), "session closed");
    }

    pub fn state(&self) -> &Arc<RobotState> {
        &self.state
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn session_count(&self) -> usize {
        self.registry.len()
    }
}

/// One pump task: drain a typed subscription into the cache until the
/// bus side ends.
fn spawn_pump<T, F>(mut subscription: Subscription<T>, mut apply: F)
where
    T: DeserializeOwned + Send + 'static,
    F: FnMut(T) + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(sample) = subscription.recv().await {
            apply(sample);
        }
        warn!(topic = %subscription.topic(), "telemetry stream ended");
    });
}
