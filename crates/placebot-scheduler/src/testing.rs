//! In-memory stand-ins for the remote service.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use placebot_canvas::fill::RowFill;
use placebot_canvas::{BitmapDrawer, Board, Canvas, CompositeDrawer, TargetImage};
use placebot_client::{FeedSource, Login, PlaceApi, SnapshotSource, UpdateReceiver};
use placebot_core::config::UserConfig;
use placebot_core::error::{PlacebotError, Result};
use placebot_core::types::{Color, Tile, TileUpdate};

use crate::floor::DrawingFloor;

pub fn color(i: u8) -> Color {
    Color::new(i).unwrap()
}

pub fn user(name: &str) -> UserConfig {
    UserConfig {
        user: name.into(),
        pass: Some("pw".into()),
        pass_env: None,
    }
}

/// A ready canvas of zeros with one row-scanned zone.
pub fn floor(extent: usize, offset: (i32, i32), image: &str) -> Arc<DrawingFloor> {
    let canvas = Arc::new(Canvas::new(extent));
    canvas.replace(Board::new(extent)).unwrap();
    let mut drawer = CompositeDrawer::new();
    drawer.push(
        "zone",
        Box::new(BitmapDrawer::new(
            offset,
            Box::new(RowFill::new(false)),
            TargetImage::parse(image),
        )),
    );
    Arc::new(DrawingFloor::new(canvas, drawer))
}

/// Every accepted submission across all fake sessions, in order.
#[derive(Default)]
pub struct DrawLog {
    entries: Mutex<Vec<(String, Tile)>>,
}

impl DrawLog {
    pub fn entries(&self) -> Vec<(String, Tile)> {
        self.entries.lock().unwrap().clone()
    }
}

pub struct FakeApi {
    user: String,
    log: Arc<DrawLog>,
    cooldown: Duration,
    latency: Duration,
    fail_after: Option<usize>,
    pub wait_calls: AtomicUsize,
    pub draw_calls: AtomicUsize,
}

impl FakeApi {
    pub fn new(user: &str, log: Arc<DrawLog>) -> Self {
        Self {
            user: user.into(),
            log,
            cooldown: Duration::from_secs(5),
            latency: Duration::from_millis(200),
            fail_after: None,
            wait_calls: AtomicUsize::new(0),
            draw_calls: AtomicUsize::new(0),
        }
    }

    /// Reject every submission after the first `n`.
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }
}

#[async_trait]
impl PlaceApi for FakeApi {
    async fn wait_time(&self) -> Result<Duration> {
        self.wait_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Duration::ZERO)
    }

    async fn draw(&self, tile: Tile) -> Result<Duration> {
        let n = self.draw_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.latency).await;
        if self.fail_after.is_some_and(|limit| n >= limit) {
            return Err(PlacebotError::Draw("you are doing that too much".into()));
        }
        self.log.entries.lock().unwrap().push((self.user.clone(), tile));
        Ok(self.cooldown)
    }
}

/// Hands out preconfigured sessions; unknown users fail to log in.
#[derive(Default)]
pub struct FakeLogin {
    sessions: HashMap<String, Arc<FakeApi>>,
}

impl FakeLogin {
    pub fn with(mut self, api: FakeApi) -> Self {
        self.sessions.insert(api.user.clone(), Arc::new(api));
        self
    }

    pub fn session(&self, user: &str) -> Arc<FakeApi> {
        self.sessions[user].clone()
    }
}

#[async_trait]
impl Login for FakeLogin {
    async fn login(&self, user: &UserConfig) -> Result<Arc<dyn PlaceApi>> {
        match self.sessions.get(&user.user) {
            Some(api) => Ok(api.clone()),
            None => Err(PlacebotError::Auth(format!("{}: wrong password", user.user))),
        }
    }
}

/// Serves a scripted series of snapshots. `None` entries fail, as does
/// every fetch once the script runs out.
pub struct FakeSnapshots {
    script: Mutex<VecDeque<Option<u8>>>,
    pub fetches: AtomicUsize,
}

impl FakeSnapshots {
    pub fn new(script: impl IntoIterator<Item = Option<u8>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            fetches: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SnapshotSource for FakeSnapshots {
    async fn fetch(&self, extent: usize) -> Result<Board> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front().flatten();
        match next {
            Some(fill) => Board::from_cells(extent, vec![color(fill); extent * extent]),
            None => Err(PlacebotError::Snapshot("bitmap request failed: 503".into())),
        }
    }
}

/// Hands out queued receivers, one per connect.
#[derive(Default)]
pub struct FakeFeed {
    receivers: Mutex<VecDeque<UpdateReceiver>>,
    pub connects: AtomicUsize,
}

impl FakeFeed {
    /// Queue a connection and return its sending side.
    pub fn open(&self) -> mpsc::Sender<TileUpdate> {
        let (tx, rx) = mpsc::channel(64);
        self.receivers.lock().unwrap().push_back(rx);
        tx
    }
}

#[async_trait]
impl FeedSource for FakeFeed {
    async fn connect(&self) -> Result<UpdateReceiver> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.receivers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| PlacebotError::Feed("connection refused".into()))
    }
}

pub fn update(x: i32, y: i32, c: u8) -> TileUpdate {
    TileUpdate {
        x,
        y,
        color: color(c),
        author: "someone".into(),
    }
}
