use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::AppState;

/// Outbound frames buffered per connection before the transport starts
/// dropping. A client that falls further behind misses those frames and
/// catches up on the next full-state broadcast.
const OUTBOUND_BUFFER: usize = 100;

/// The single collaboration endpoint. A WebSocket upgrade joins the shared
/// document; a plain GET is answered with a static liveness line.
pub async fn collab_endpoint(
    ws: Option<WebSocketUpgrade>,
    State(app_state): State<Arc<AppState>>,
) -> Response {
    match ws {
        Some(upgrade) => {
            info!("New WebSocket connection attempt");
            upgrade
                .on_upgrade(move |socket| handle_socket(socket, app_state))
                .into_response()
        }
        None => "WebSocket server is running ✅".into_response(),
    }
}

/// Handle one WebSocket connection for its whole lifetime.
async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    // Split the socket into sender and receiver halves
    let (mut sender, mut receiver) = socket.split();

    // Register with the hub; broadcasts for this session arrive on rx
    let (tx, mut rx) = mpsc::channel::<Arc<String>>(OUTBOUND_BUFFER);
    let session_id = app_state.hub.connect(tx).await;

    // Writer task: drain queued broadcast frames into the socket
    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sender
                .send(Message::Text(frame.as_ref().clone()))
                .await
                .is_err()
            {
                break;
            }
        }
    });

    // Reader task: feed inbound text frames to the hub. Binary and
    // ping/pong frames carry no protocol payload and are skipped.
    let reader_state = Arc::clone(&app_state);
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            match message {
                Message::Text(raw) => reader_state.hub.on_message(session_id, &raw).await,
                Message::Close(_) => break,
                other => debug!(%session_id, ?other, "ignoring non-text frame"),
            }
        }
    });

    // Wait for either task to finish (and finish the other)
    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    app_state.hub.on_disconnect(session_id).await;
    info!(%session_id, "WebSocket connection terminated");
}
