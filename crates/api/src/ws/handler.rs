use axum::{
    extract::{
        Path, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use std::time::Duration;

use futures::{Sink, SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::dispatcher::{ChatConnection, ChatContext};
use crate::state::AppState;

/// How long queued frames get to flush once the read loop ends.
const WRITER_GRACE: Duration = Duration::from_secs(2);

/// Upgrades without authentication; the first frame must be `AUTHORIZE`.
pub async fn chat_upgrade(
    State(state): State<AppState>,
    Path(meeting_id): Path<String>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, meeting_id))
}

async fn handle_socket(socket: WebSocket, state: AppState, meeting_id: String) {
    let (sink, mut receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel::<Message>();

    let mut conn = ChatConnection::new(ChatContext::from(&state), meeting_id.clone(), tx.clone());
    let connection_id = conn.connection_id().to_string();
    info!(%meeting_id, %connection_id, "Chat socket connected");

    let writer = spawn_writer(sink, rx);

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                conn.handle_text(text.as_str()).await;
            }
            Ok(Message::Ping(data)) => {
                if tx.send(Message::Pong(data)).is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                break;
            }
            Err(e) => {
                warn!(%meeting_id, %connection_id, %e, "WebSocket error");
                break;
            }
            _ => {
                debug!(%connection_id, "Ignoring non-text frame");
            }
        }
    }

    // Leaving the room drops the registry's sender; dropping ours closes
    // the channel so the writer exits after flushing.
    conn.close();
    drop(conn);
    drop(tx);
    finish_writer(writer, WRITER_GRACE).await;

    info!(%meeting_id, %connection_id, "Chat socket disconnected");
}

fn spawn_writer<S>(mut sink: S, mut rx: mpsc::UnboundedReceiver<Message>) -> JoinHandle<()>
where
    S: Sink<Message> + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                break;
            }
        }
    })
}

async fn finish_writer(mut writer: JoinHandle<()>, grace: Duration) {
    if tokio::time::timeout(grace, &mut writer).await.is_err() {
        debug!("Socket writer did not drain in time");
        writer.abort();
        let _ = writer.await;
    }
}
