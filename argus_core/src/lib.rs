//! # ARGUS Core
//!
//! Relay engine for the ARGUS patrol-robot telemetry gateway.
//!
//! ARGUS bridges a robot's pub/sub bus to any number of viewer sessions
//! over persistent bidirectional connections: telemetry fans out to
//! every session on a fixed cadence, control commands flow from any
//! session back to the bus. This crate provides the building blocks:
//!
//! - **Messages**: typed bus payloads (pose, grid, battery, patrol)
//! - **Bus**: the robot-side transport (rosbridge or in-process)
//! - **Telemetry**: the latest-wins state cache and derived display state
//! - **Protocol**: the session-facing JSON wire format
//! - **Relay**: session registry, command router, broadcast loops
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use argus_core::bus::RosbridgeBus;
//! use argus_core::relay::{Relay, RelayConfig};
//!
//! # async fn run() -> argus_core::ArgusResult<()> {
//! let bus = Arc::new(RosbridgeBus::connect("ws://robot:9090").await?);
//! let relay = Relay::new(bus, RelayConfig::default());
//! relay.start().await?;
//! // hand `relay` to the connection acceptor; each accepted socket
//! // runs `relay.serve_session(sink, stream)` in its own task.
//! # Ok(())
//! # }
//! ```

pub mod bus;
pub mod error;
pub mod messages;
pub mod protocol;
pub mod relay;
pub mod telemetry;

// Re-export commonly used types for easy access
pub use error::{ArgusError, ArgusResult};
pub use protocol::{ClientCommand, ViewerEvent};
pub use relay::{Relay, RelayConfig, Topics};
pub use telemetry::{MotionState, RobotState, TelemetrySnapshot};

// Re-export the bus trait for backend-agnostic usage
pub use bus::{RobotBus, Subscription};
