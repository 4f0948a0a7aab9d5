//! Live tile-change feed over WebSocket.
//!
//! Each frame is a JSON envelope `{"type": ..., "payload": ...}`.
//! `place` carries one update, `batch-place` a list of them, `activity`
//! is informational. Anything else is logged and skipped.

use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, info, warn};

use placebot_core::config::EndpointsConfig;
use placebot_core::error::{PlacebotError, Result};
use placebot_core::types::TileUpdate;

use crate::http::send_with_retry;
use crate::{FeedSource, UpdateReceiver};

const PAGE_PATH: &str = "/place?webview=true";

/// Updates buffered between the socket reader and the canvas.
const FEED_BUFFER: usize = 4096;

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: serde_json::Value,
}

/// A decoded feed frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// Tile changes in delivery order.
    Updates(Vec<TileUpdate>),
    Activity(serde_json::Value),
    Unknown(String),
}

/// Decode one text frame. A malformed envelope or payload is an error.
pub fn decode_event(text: &str) -> Result<FeedEvent> {
    let envelope: Envelope = serde_json::from_str(text)?;
    match envelope.kind.as_str() {
        "place" => {
            let update: TileUpdate = serde_json::from_value(envelope.payload)?;
            Ok(FeedEvent::Updates(vec![update]))
        }
        "batch-place" => {
            let updates: Vec<TileUpdate> = serde_json::from_value(envelope.payload)?;
            Ok(FeedEvent::Updates(updates))
        }
        "activity" => Ok(FeedEvent::Activity(envelope.payload)),
        _ => Ok(FeedEvent::Unknown(envelope.kind)),
    }
}

/// Forward decoded updates from a socket stream until either side closes.
pub async fn read_feed<S>(mut frames: S, tx: mpsc::Sender<TileUpdate>)
where
    S: Stream<Item = std::result::Result<Message, tungstenite::Error>> + Unpin,
{
    while let Some(frame) = frames.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(reason)) => {
                info!(?reason, "Feed closed by server");
                return;
            }
            Ok(_) => continue,
            Err(e) => {
                warn!(%e, "Feed read error");
                return;
            }
        };

        match decode_event(text.as_str()) {
            Ok(FeedEvent::Updates(updates)) => {
                for update in updates {
                    if tx.send(update).await.is_err() {
                        debug!("Feed receiver dropped");
                        return;
                    }
                }
            }
            Ok(FeedEvent::Activity(payload)) => debug!(%payload, "Activity"),
            Ok(FeedEvent::Unknown(kind)) => warn!(%kind, "Unknown event type"),
            Err(e) => warn!(%e, "Dropping malformed event"),
        }
    }
    info!("Feed stream ended");
}

/// Connect to the feed socket and spawn a reader task.
pub async fn connect_feed(url: &str) -> Result<UpdateReceiver> {
    let (socket, _) = tokio_tungstenite::connect_async(url).await?;
    info!(url, "Feed connected");

    let (tx, rx) = mpsc::channel(FEED_BUFFER);
    tokio::spawn(read_feed(socket, tx));
    Ok(rx)
}

/// Find the feed socket URL embedded in the place page.
pub async fn discover_ws_url(endpoints: &EndpointsConfig) -> Result<String> {
    let http = reqwest::Client::builder()
        .user_agent(endpoints.user_agent.as_str())
        .build()?;
    let url = format!("{}{PAGE_PATH}", endpoints.base_url.trim_end_matches('/'));
    let resp = send_with_retry(http.get(url), Duration::from_millis(endpoints.retry_pause_ms))
        .await?
        .error_for_status()?;
    let body = resp.text().await?;

    extract_ws_url(&body).ok_or_else(|| PlacebotError::Feed("could not find websocket url".into()))
}

/// First double-quoted `wss://` or `ws://` URL in `body`.
fn extract_ws_url(body: &str) -> Option<String> {
    let re = regex::Regex::new(r#""(wss?://[^"]*)""#).ok()?;
    re.captures(body).map(|caps| caps[1].to_string())
}

/// [`FeedSource`] that rediscovers the socket URL on every connect.
pub struct WsFeedSource {
    endpoints: EndpointsConfig,
}

impl WsFeedSource {
    pub fn new(endpoints: EndpointsConfig) -> Self {
        Self { endpoints }
    }
}

#[async_trait]
impl FeedSource for WsFeedSource {
    async fn connect(&self) -> Result<UpdateReceiver> {
        let url = discover_ws_url(&self.endpoints).await?;
        connect_feed(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use placebot_core::types::Color;

    fn update(x: i32, y: i32, color: u8) -> TileUpdate {
        TileUpdate {
            x,
            y,
            color: Color::new(color).unwrap(),
            author: "a".into(),
        }
    }

    #[test]
    fn test_decode_place() {
        let event =
            decode_event(r#"{"type": "place", "payload": {"x": 3, "y": 4, "color": 5, "author": "a"}}"#)
                .unwrap();
        assert_eq!(event, FeedEvent::Updates(vec![update(3, 4, 5)]));
    }

    #[test]
    fn test_decode_batch_place_keeps_order() {
        let event = decode_event(
            r#"{"type": "batch-place", "payload": [
                {"x": 1, "y": 1, "color": 1, "author": "a"},
                {"x": 1, "y": 1, "color": 2, "author": "a"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            FeedEvent::Updates(vec![update(1, 1, 1), update(1, 1, 2)])
        );
    }

    #[test]
    fn test_decode_activity_and_unknown() {
        let event = decode_event(r#"{"type": "activity", "payload": {"count": 12}}"#).unwrap();
        assert!(matches!(event, FeedEvent::Activity(_)));

        let event = decode_event(r#"{"type": "speed", "payload": 1}"#).unwrap();
        assert_eq!(event, FeedEvent::Unknown("speed".into()));
    }

    #[test]
    fn test_decode_malformed() {
        assert!(decode_event("not json").is_err());
        assert!(decode_event(r#"{"type": "place", "payload": {"x": "a"}}"#).is_err());
        assert!(decode_event(r#"{"type": "place", "payload": {"x": 1, "y": 1, "color": 44}}"#).is_err());
    }

    #[test]
    fn test_extract_ws_url() {
        let body = r#"<script>r.config = {"place_websocket_url": "wss://ws.example.com/place?m=abc", "x": "y"}</script>"#;
        assert_eq!(
            extract_ws_url(body),
            Some("wss://ws.example.com/place?m=abc".to_string())
        );
        assert_eq!(extract_ws_url("<html></html>"), None);
    }

    #[tokio::test]
    async fn test_read_feed_skips_bad_frames() {
        let frames = futures::stream::iter(vec![
            Ok(Message::text(r#"{"type": "place", "payload": {"x": 1, "y": 2, "color": 3, "author": "a"}}"#)),
            Ok(Message::text("garbage")),
            Ok(Message::text(r#"{"type": "activity", "payload": {}}"#)),
            Ok(Message::Ping(Default::default())),
            Ok(Message::text(r#"{"type": "mystery", "payload": null}"#)),
            Ok(Message::text(r#"{"type": "batch-place", "payload": [{"x": 4, "y": 5, "color": 6, "author": "a"}]}"#)),
        ]);
        let (tx, mut rx) = mpsc::channel(16);

        read_feed(frames, tx).await;

        assert_eq!(rx.recv().await, Some(update(1, 2, 3)));
        assert_eq!(rx.recv().await, Some(update(4, 5, 6)));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_read_feed_stops_on_close() {
        let frames = futures::stream::iter(vec![
            Ok(Message::Close(None)),
            Ok(Message::text(r#"{"type": "place", "payload": {"x": 1, "y": 2, "color": 3}}"#)),
        ]);
        let (tx, mut rx) = mpsc::channel(16);

        read_feed(frames, tx).await;
        assert_eq!(rx.recv().await, None);
    }
}
