use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};

use argus_core::error::{ArgusError, ArgusResult};
use argus_core::relay::{SessionInput, SessionSink, SessionStream};
use argus_core::Relay;

/// WebSocket handler for the realtime viewer endpoint
pub async fn realtime(
    State(relay): State<Arc<Relay>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, relay))
}

async fn handle_socket(socket: WebSocket, relay: Arc<Relay>) {
    let (sender, receiver) = socket.split();
    relay
        .serve_session(ViewerSink(sender), ViewerStream(receiver))
        .await;
}

struct ViewerSink(SplitSink<WebSocket, Message>);

#[async_trait::async_trait]
impl SessionSink for ViewerSink {
    async fn send_text(&mut self, text: String) -> ArgusResult<()> {
        self.0
            .send(Message::Text(text))
            .await
            .map_err(|_| ArgusError::ChannelClosed)
    }

    async fn send_pong(&mut self, payload: Vec<u8>) -> ArgusResult<()> {
        self.0
            .send(Message::Pong(payload))
            .await
            .map_err(|_| ArgusError::ChannelClosed)
    }
}

struct ViewerStream(SplitStream<WebSocket>);

#[async_trait::async_trait]
impl SessionStream for ViewerStream {
    async fn next_input(&mut self) -> Option<SessionInput> {
        let input = match self.0.next().await? {
            Ok(Message::Text(text)) => SessionInput::Text(text),
            Ok(Message::Ping(payload)) => SessionInput::Ping(payload),
            Ok(Message::Close(_)) | Err(_) => SessionInput::Close,
            Ok(_) => SessionInput::Ignored,
        };
        Some(input)
    }
}
