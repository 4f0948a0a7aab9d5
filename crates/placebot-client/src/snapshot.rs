//! Full board snapshots over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use placebot_canvas::{Board, snapshot};
use placebot_core::config::EndpointsConfig;
use placebot_core::error::{PlacebotError, Result};

use crate::SnapshotSource;
use crate::http::send_with_retry;

const BITMAP_PATH: &str = "/api/place/board-bitmap";

/// Downloads and decodes the board bitmap.
pub struct HttpSnapshotSource {
    http: reqwest::Client,
    url: String,
    retry_pause: Duration,
}

impl HttpSnapshotSource {
    pub fn new(endpoints: &EndpointsConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(endpoints.user_agent.as_str())
            .build()?;
        Ok(Self {
            http,
            url: format!("{}{BITMAP_PATH}", endpoints.base_url.trim_end_matches('/')),
            retry_pause: Duration::from_millis(endpoints.retry_pause_ms),
        })
    }
}

#[async_trait]
impl SnapshotSource for HttpSnapshotSource {
    async fn fetch(&self, extent: usize) -> Result<Board> {
        let resp = send_with_retry(self.http.get(&self.url), self.retry_pause).await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(PlacebotError::Snapshot(format!("bitmap request failed: {status}")));
        }

        let bytes = resp.bytes().await?;
        debug!(bytes = bytes.len(), "Bitmap downloaded");
        snapshot::decode(&bytes, extent)
    }
}
