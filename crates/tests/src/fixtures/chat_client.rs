use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

const EVENT_TIMEOUT: Duration = Duration::from_secs(5);
const SILENCE_WINDOW: Duration = Duration::from_millis(300);

/// A chat socket that speaks the JSON action protocol.
pub struct ChatClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl ChatClient {
    pub async fn connect(url: &str) -> Self {
        let (ws, _) = connect_async(url).await.expect("WS connect failed");
        Self { ws }
    }

    pub async fn send(&mut self, frame: Value) {
        self.ws
            .send(Message::text(frame.to_string()))
            .await
            .expect("WS send failed");
    }

    /// AUTHORIZE and consume the MEMBERS + HISTORY greeting.
    pub async fn authorize(&mut self, token: &str) {
        self.send(json!({ "action": "AUTHORIZE", "token": token })).await;
        assert_eq!(self.next_event().await["action"], "MEMBERS");
        assert_eq!(self.next_event().await["action"], "HISTORY");
    }

    pub async fn next_event(&mut self) -> Value {
        loop {
            let msg = tokio::time::timeout(EVENT_TIMEOUT, self.ws.next())
                .await
                .expect("Timeout waiting for WS message")
                .expect("WS stream closed")
                .expect("WS error");
            if let Message::Text(text) = msg {
                return serde_json::from_str(text.as_str()).expect("event is JSON");
            }
        }
    }

    /// Asserts nothing arrives within a short window.
    pub async fn expect_silence(&mut self) {
        let next = tokio::time::timeout(SILENCE_WINDOW, self.ws.next()).await;
        if let Ok(Some(Ok(Message::Text(text)))) = next {
            panic!("expected no event, got {text}");
        }
    }

    pub async fn close(mut self) {
        let _ = self.ws.close(None).await;
    }
}
