//! Keeps the shared canvas in step with the remote board.
//!
//! Two paths write into the canvas: a full snapshot on every refresh tick
//! and single-cell writes from the live feed. A snapshot replaces the
//! whole board, so feed writes that land while it is in flight are lost
//! until the next event or refresh.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use placebot_canvas::Canvas;
use placebot_client::{FeedSource, SnapshotSource, UpdateReceiver};
use placebot_core::error::Result;
use placebot_core::types::TileUpdate;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Pause before reopening a closed feed.
const FEED_RECONNECT: Duration = Duration::from_secs(5);

/// Owns the snapshot and feed sources for one canvas.
pub struct CanvasMaintainer {
    canvas: Arc<Canvas>,
    snapshots: Arc<dyn SnapshotSource>,
    feed: Arc<dyn FeedSource>,
    refresh: Duration,
}

impl CanvasMaintainer {
    pub fn new(
        canvas: Arc<Canvas>,
        snapshots: Arc<dyn SnapshotSource>,
        feed: Arc<dyn FeedSource>,
        refresh: Duration,
    ) -> Self {
        Self {
            canvas,
            snapshots,
            feed,
            refresh,
        }
    }

    /// Start maintenance on a background task.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Install the first snapshot, then refresh and apply events forever.
    pub async fn run(self) {
        self.load_initial().await;

        let mut ticker = tokio::time::interval(self.refresh);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; the board is already fresh.
        ticker.tick().await;

        let mut feed: Option<UpdateReceiver> = None;
        let mut reconnect_at = Instant::now();

        loop {
            if feed.is_none() && Instant::now() >= reconnect_at {
                match self.feed.connect().await {
                    Ok(rx) => {
                        info!("Event feed connected");
                        feed = Some(rx);
                    }
                    Err(e) => {
                        warn!(%e, retry_secs = FEED_RECONNECT.as_secs(), "Event feed connect failed");
                        reconnect_at = Instant::now() + FEED_RECONNECT;
                    }
                }
            }

            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.refresh_once().await {
                        warn!(%e, "Snapshot refresh failed, keeping the current board");
                    }
                }
                update = next_update(&mut feed) => match update {
                    Some(update) => {
                        self.apply(&update);
                    }
                    None => {
                        warn!(retry_secs = FEED_RECONNECT.as_secs(), "Event feed closed");
                        feed = None;
                        reconnect_at = Instant::now() + FEED_RECONNECT;
                    }
                },
                _ = tokio::time::sleep_until(reconnect_at), if feed.is_none() => {}
            }
        }
    }

    /// Fetch snapshots until one installs, doubling the pause between
    /// attempts up to a minute.
    pub async fn load_initial(&self) {
        let mut backoff = INITIAL_BACKOFF;
        loop {
            match self.refresh_once().await {
                Ok(()) => {
                    info!(extent = self.canvas.extent(), "Initial snapshot installed");
                    return;
                }
                Err(e) => {
                    warn!(%e, retry_secs = backoff.as_secs(), "Initial snapshot failed");
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
            }
        }
    }

    /// Fetch one snapshot and swap it in.
    pub async fn refresh_once(&self) -> Result<()> {
        let board = self.snapshots.fetch(self.canvas.extent()).await?;
        self.canvas.replace(board)?;
        debug!("Snapshot installed");
        Ok(())
    }

    /// Write one feed event into the canvas. Out-of-bounds events are
    /// discarded.
    pub fn apply(&self, update: &TileUpdate) -> bool {
        let applied = self.canvas.set(&update.tile());
        if !applied {
            debug!(x = update.x, y = update.y, "Discarding event outside the board");
        }
        applied
    }
}

/// Next update from an open feed. Never resolves without one.
async fn next_update(feed: &mut Option<UpdateReceiver>) -> Option<TileUpdate> {
    match feed {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
