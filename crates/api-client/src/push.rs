use anyhow::{Context, Result};
use futures_util::StreamExt;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::debug;

use taskscope_api::PushEvent;

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Factory for per-task push subscriptions.
///
/// Maps the HTTP base URL onto the matching WebSocket scheme; subscribing
/// opens `ws(s)://{server}/api/tasks/{id}/push`.
#[derive(Debug, Clone)]
pub struct PushClient {
    ws_base_url: String,
}

impl PushClient {
    pub fn new(base_url: &str) -> Self {
        let trimmed = base_url.trim_end_matches('/');
        let ws_base_url = if let Some(rest) = trimmed.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = trimmed.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            trimmed.to_string()
        };
        Self { ws_base_url }
    }

    pub fn topic_url(&self, task_id: &str) -> String {
        format!("{}/api/tasks/{task_id}/push", self.ws_base_url)
    }

    /// Open the push topic for a task. Failure here is a fallback trigger
    /// for the caller, never fatal.
    pub async fn subscribe(&self, task_id: &str) -> Result<PushSubscription> {
        let url = self.topic_url(task_id);
        let (ws, _response) = connect_async(url.as_str())
            .await
            .with_context(|| format!("push subscribe failed: {url}"))?;
        debug!("push connected: {url}");
        Ok(PushSubscription { ws })
    }
}

/// What one read from the push topic produced.
#[derive(Debug)]
pub enum PushFrame {
    Event(PushEvent),
    /// A text frame that did not decode. The caller records it and keeps
    /// reading; one bad frame never kills the subscription.
    Malformed(String),
}

/// One open push topic.
pub struct PushSubscription {
    ws: WsStream,
}

impl PushSubscription {
    /// Wait for the next frame on the topic.
    ///
    /// Non-text control frames are skipped. `Ok(None)` means the server
    /// closed the topic; `Err` means the connection dropped.
    pub async fn next_frame(&mut self) -> Result<Option<PushFrame>> {
        loop {
            match self.ws.next().await {
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(match serde_json::from_str(&text) {
                        Ok(event) => PushFrame::Event(event),
                        Err(e) => PushFrame::Malformed(e.to_string()),
                    }));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
            }
        }
    }
}
