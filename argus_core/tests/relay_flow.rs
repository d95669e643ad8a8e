//! End-to-end relay flow over the in-process bus: telemetry fan-out,
//! command routing, and the command echo driving motion state.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};

use argus_core::bus::{MemoryBus, RobotBus};
use argus_core::relay::{Relay, RelayConfig, SessionInput, SessionSink, SessionStream, Topics};
use argus_core::ArgusResult;

const CADENCE: Duration = Duration::from_millis(25);
const WAIT: Duration = Duration::from_secs(2);

struct TestSink {
    frames: mpsc::UnboundedSender<Value>,
}

#[async_trait]
impl SessionSink for TestSink {
    async fn send_text(&mut self, text: String) -> ArgusResult<()> {
        let value = serde_json::from_str(&text).expect("gateway frames are JSON");
        let _ = self.frames.send(value);
        Ok(())
    }

    async fn send_pong(&mut self, _payload: Vec<u8>) -> ArgusResult<()> {
        Ok(())
    }
}

struct TestStream {
    inputs: mpsc::UnboundedReceiver<SessionInput>,
}

#[async_trait]
impl SessionStream for TestStream {
    async fn next_input(&mut self) -> Option<SessionInput> {
        self.inputs.recv().await
    }
}

struct Viewer {
    frames: mpsc::UnboundedReceiver<Value>,
    inputs: mpsc::UnboundedSender<SessionInput>,
}

impl Viewer {
    async fn next_frame(&mut self) -> Value {
        timeout(WAIT, self.frames.recv())
            .await
            .expect("timed out waiting for a frame")
            .expect("session ended unexpectedly")
    }

    /// Skip frames until one of `kind` arrives.
    async fn frame_of_type(&mut self, kind: &str) -> Value {
        loop {
            let frame = self.next_frame().await;
            if frame["type"] == kind {
                return frame;
            }
        }
    }

    /// Skip frames until a status frame carrying `text` arrives.
    async fn await_state(&mut self, text: &str) {
        loop {
            let frame = self.frame_of_type("state").await;
            if frame["text"] == text {
                return;
            }
        }
    }

    fn send_text(&self, raw: &str) {
        self.inputs
            .send(SessionInput::Text(raw.to_string()))
            .expect("session input channel closed");
    }
}

async fn start_relay() -> (Arc<Relay>, MemoryBus) {
    let bus = MemoryBus::new();
    let relay = Arc::new(Relay::new(
        Arc::new(bus.clone()),
        RelayConfig {
            topics: Topics::default(),
            cadence: CADENCE,
        },
    ));
    relay.start().await.expect("relay start");
    (relay, bus)
}

fn connect(relay: &Arc<Relay>) -> Viewer {
    let (frame_tx, frame_rx) = mpsc::unbounded_channel();
    let (input_tx, input_rx) = mpsc::unbounded_channel();
    let relay = relay.clone();
    tokio::spawn(async move {
        relay
            .serve_session(TestSink { frames: frame_tx }, TestStream { inputs: input_rx })
            .await;
    });
    Viewer {
        frames: frame_rx,
        inputs: input_tx,
    }
}

fn pose_sample(x: f64, y: f64) -> Value {
    json!({
        "header": {"frame_id": "map"},
        "pose": {
            "pose": {
                "position": {"x": x, "y": y, "z": 0.0},
                "orientation": {"x": 0.0, "y": 0.0, "z": 0.0, "w": 1.0}
            },
            "covariance": [0.0]
        }
    })
}

#[tokio::test]
async fn test_placeholder_tick_before_any_telemetry() {
    let (relay, _bus) = start_relay().await;
    let mut viewer = connect(&relay);

    let first = viewer.next_frame().await;
    assert_eq!(first["type"], "time");
    assert_eq!(first["minutes"], 0.0);

    let second = viewer.next_frame().await;
    assert_eq!(second["type"], "state");
    assert_eq!(second["text"], "Idle");
}

#[tokio::test]
async fn test_full_tick_order_and_contents() {
    let (relay, bus) = start_relay().await;

    bus.publish("/amcl_pose", pose_sample(1.5, -2.0)).await.unwrap();
    bus.publish("/battery", json!({"percentage": 0.87})).await.unwrap();
    bus.publish(
        "/map",
        json!({
            "info": {
                "width": 2, "height": 2, "resolution": 0.05,
                "origin": {"position": {"x": -5.0, "y": -5.0, "z": 0.0}}
            },
            "data": [-1, 0, 50, 100]
        }),
    )
    .await
    .unwrap();

    let mut viewer = connect(&relay);

    // Find the start of a tick that already carries every sample, then
    // check the fixed emission order.
    loop {
        let frame = viewer.frame_of_type("amcl_pose").await;
        assert_eq!(frame["x"], 1.5);
        assert_eq!(frame["y"], -2.0);
        assert_eq!(frame["yaw"], 0.0);

        let distance = viewer.next_frame().await;
        assert_eq!(distance["type"], "distance");

        let next = viewer.next_frame().await;
        if next["type"] != "battery" {
            // A pump had not caught up yet; try the next tick.
            continue;
        }
        assert_eq!(next["percentage"], 87);

        let map = viewer.next_frame().await;
        if map["type"] != "map" {
            continue;
        }
        assert_eq!(map["width"], 2);
        assert_eq!(map["height"], 2);
        assert_eq!(map["res"], 0.05);
        assert_eq!(map["origin"]["x"], -5.0);
        assert_eq!(map["gray"], json!([0, 0, 205, 255]));

        let state = viewer.next_frame().await;
        assert_eq!(state["type"], "state");
        break;
    }
}

#[tokio::test]
async fn test_patrol_command_reaches_bus_and_all_viewers() {
    let (relay, bus) = start_relay().await;
    let mut patrol_rx = bus.subscribe("/patrol_cmd").await.unwrap();

    let mut viewer_a = connect(&relay);
    let mut viewer_b = connect(&relay);

    viewer_a.send_text(r#"{"type":"patrol","action":"repeat"}"#);

    let published = timeout(WAIT, patrol_rx.recv()).await.unwrap().unwrap();
    assert_eq!(published, json!({"data": "repeat"}));

    viewer_a.await_state("Repeat patrol").await;
    viewer_b.await_state("Repeat patrol").await;
}

#[tokio::test]
async fn test_stop_halts_robot_and_freezes_distance() {
    let (relay, bus) = start_relay().await;
    let mut vel_rx = bus.subscribe("/cmd_vel").await.unwrap();
    let mut viewer = connect(&relay);

    bus.publish("/amcl_pose", pose_sample(0.0, 0.0)).await.unwrap();
    bus.publish("/amcl_pose", pose_sample(1.0, 0.0)).await.unwrap();

    loop {
        let frame = viewer.frame_of_type("distance").await;
        if frame["meters"] == 1.0 {
            break;
        }
    }

    viewer.send_text(r#"{"type":"patrol","action":"stop"}"#);
    let halt = timeout(WAIT, vel_rx.recv()).await.unwrap().unwrap();
    assert_eq!(halt["linear"]["x"], 0.0);
    assert_eq!(halt["angular"]["z"], 0.0);
    viewer.await_state("Stopped").await;

    // Movement after the stop no longer counts.
    bus.publish("/amcl_pose", pose_sample(6.0, 0.0)).await.unwrap();
    sleep(CADENCE * 3).await;
    let frame = viewer.frame_of_type("distance").await;
    assert_eq!(frame["meters"], 1.0);
}

#[tokio::test]
async fn test_patrol_start_resets_distance() {
    let (relay, bus) = start_relay().await;
    let mut viewer = connect(&relay);

    bus.publish("/amcl_pose", pose_sample(0.0, 0.0)).await.unwrap();
    bus.publish("/amcl_pose", pose_sample(2.0, 0.0)).await.unwrap();
    loop {
        if viewer.frame_of_type("distance").await["meters"] == 2.0 {
            break;
        }
    }

    viewer.send_text(r#"{"type":"patrol","action":"single"}"#);
    viewer.await_state("Single patrol").await;

    let frame = viewer.frame_of_type("distance").await;
    assert_eq!(frame["meters"], 0.0);
}

#[tokio::test]
async fn test_cmd_vel_echo_drives_motion_label() {
    let (relay, bus) = start_relay().await;
    let mut vel_rx = bus.subscribe("/cmd_vel").await.unwrap();
    let mut viewer = connect(&relay);

    viewer.send_text(r#"{"type":"cmd_vel","linear":0.4,"angular":0.0}"#);

    let published = timeout(WAIT, vel_rx.recv()).await.unwrap().unwrap();
    assert_eq!(published["linear"]["x"], 0.4);

    // The published command echoes back on the same topic and flips the
    // displayed motion state.
    viewer.await_state("Moving forward").await;

    viewer.send_text(r#"{"type":"cmd_vel","linear":0.0,"angular":0.0}"#);
    viewer.await_state("Stopped").await;
}

#[tokio::test]
async fn test_session_removed_on_disconnect() {
    let (relay, _bus) = start_relay().await;
    let viewer = connect(&relay);

    for _ in 0..50 {
        if relay.session_count() == 1 {
            break;
        }
        sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(relay.session_count(), 1);

    drop(viewer);
    for _ in 0..50 {
        if relay.session_count() == 0 {
            break;
        }
        sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(relay.session_count(), 0);
}
