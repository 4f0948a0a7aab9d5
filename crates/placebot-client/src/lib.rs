//! Remote place service client.
//!
//! Every interaction with the service goes through one of four traits so
//! the scheduler can run against test doubles:
//! [`Login`] produces a per-agent [`PlaceApi`] session,
//! [`SnapshotSource`] fetches whole boards and [`FeedSource`] streams
//! live tile changes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use placebot_canvas::Board;
use placebot_core::config::UserConfig;
use placebot_core::error::Result;
use placebot_core::types::{Tile, TileUpdate};

pub mod client;
pub mod feed;
pub mod http;
pub mod snapshot;

pub use client::{HttpLogin, PixelInfo, PlaceClient, fetch_pixel};
pub use feed::{FeedEvent, WsFeedSource, connect_feed, decode_event, discover_ws_url};
pub use snapshot::HttpSnapshotSource;

/// An authenticated agent session.
#[async_trait]
pub trait PlaceApi: Send + Sync {
    /// Time left before this session may draw again.
    async fn wait_time(&self) -> Result<Duration>;

    /// Submit one tile. Returns the cooldown before the next draw.
    async fn draw(&self, tile: Tile) -> Result<Duration>;
}

/// Opens sessions for configured users.
#[async_trait]
pub trait Login: Send + Sync {
    async fn login(&self, user: &UserConfig) -> Result<Arc<dyn PlaceApi>>;
}

/// Fetches full board snapshots.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch(&self, extent: usize) -> Result<Board>;
}

/// Receiver for live tile changes.
pub type UpdateReceiver = mpsc::Receiver<TileUpdate>;

/// Opens the live tile-change feed. The receiver closes when the
/// underlying connection ends.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn connect(&self) -> Result<UpdateReceiver>;
}
