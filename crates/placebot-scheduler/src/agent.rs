//! The per-account drawing loop.
//!
//! An agent logs in, asks for its initial cooldown, then repeats: sleep,
//! take the drawing lock, ask the zone graph for a tile, submit it while
//! still holding the lock, record it on the canvas. When no zone needs a
//! correction the agent retries after a short idle interval without
//! talking to the service. A failed submission stops the agent.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info};

use placebot_client::{Login, PlaceApi};
use placebot_core::config::UserConfig;
use placebot_core::error::{PlacebotError, Result};

use crate::floor::DrawingFloor;

/// Where an agent is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    LoggedOut,
    WaitingCooldown,
    Drawing,
    Stopped,
}

/// Why an agent stopped.
#[derive(Debug)]
pub enum StopReason {
    /// Could not log in or read the initial cooldown.
    Login(PlacebotError),
    /// A submission failed.
    Draw(PlacebotError),
}

/// Final counters for one agent.
#[derive(Debug)]
pub struct AgentOutcome {
    pub user: String,
    pub tiles_drawn: u64,
    pub idle_rounds: u64,
    pub reason: StopReason,
}

/// One account's scheduler.
pub struct Agent {
    user: UserConfig,
    login: Arc<dyn Login>,
    floor: Arc<DrawingFloor>,
    idle_retry: Duration,
    state: watch::Sender<AgentState>,
    tiles_drawn: u64,
    idle_rounds: u64,
}

impl Agent {
    pub fn new(
        user: UserConfig,
        login: Arc<dyn Login>,
        floor: Arc<DrawingFloor>,
        idle_retry: Duration,
    ) -> Self {
        Self {
            user,
            login,
            floor,
            idle_retry,
            state: watch::channel(AgentState::LoggedOut).0,
            tiles_drawn: 0,
            idle_rounds: 0,
        }
    }

    pub fn state(&self) -> AgentState {
        *self.state.borrow()
    }

    /// Follow the agent's state after `run` has taken ownership of it.
    pub fn subscribe(&self) -> watch::Receiver<AgentState> {
        self.state.subscribe()
    }

    fn set_state(&self, next: AgentState) {
        let prev = self.state.send_replace(next);
        if prev != next {
            debug!(agent = %self.user.user, from = ?prev, to = ?next, "Agent state changed");
        }
    }

    /// Run until the agent stops. Only returns on failure.
    pub async fn run(mut self) -> AgentOutcome {
        let (api, mut cooldown) = match self.start().await {
            Ok(session) => session,
            Err(e) => {
                error!(agent = %self.user.user, %e, "Login failed, dropping agent");
                return self.stop(StopReason::Login(e));
            }
        };
        info!(agent = %self.user.user, wait_secs = cooldown.as_secs(), "Agent ready");

        loop {
            self.set_state(AgentState::WaitingCooldown);
            tokio::time::sleep(cooldown).await;

            match self.cycle(api.as_ref()).await {
                Ok(Some(next)) => {
                    self.tiles_drawn += 1;
                    cooldown = next;
                }
                Ok(None) => {
                    self.idle_rounds += 1;
                    cooldown = self.idle_retry;
                }
                Err(e) => {
                    error!(agent = %self.user.user, %e, "Draw failed, stopping agent");
                    return self.stop(StopReason::Draw(e));
                }
            }
        }
    }

    async fn start(&self) -> Result<(Arc<dyn PlaceApi>, Duration)> {
        let api = self.login.login(&self.user).await?;
        let cooldown = api.wait_time().await?;
        Ok((api, cooldown))
    }

    /// One pass under the drawing lock. Returns the next cooldown after a
    /// submission, or `None` when nothing needs fixing.
    async fn cycle(&mut self, api: &dyn PlaceApi) -> Result<Option<Duration>> {
        let mut drawer = self.floor.lock().await;
        let pick = self
            .floor
            .canvas()
            .with_board(|board| {
                drawer
                    .next_with_zone(board)
                    .map(|(zone, tile)| (zone.to_string(), tile))
            })
            .flatten();

        let Some((zone, tile)) = pick else {
            debug!(agent = %self.user.user, "Nothing to fix");
            return Ok(None);
        };

        self.set_state(AgentState::Drawing);
        let wait = api.draw(tile).await?;
        self.floor.canvas().set(&tile);
        info!(
            agent = %self.user.user,
            zone = %zone,
            x = tile.x,
            y = tile.y,
            color = %tile.color,
            wait_secs = wait.as_secs(),
            "Tile drawn"
        );
        Ok(Some(wait))
    }

    fn stop(self, reason: StopReason) -> AgentOutcome {
        self.set_state(AgentState::Stopped);
        info!(
            agent = %self.user.user,
            tiles_drawn = self.tiles_drawn,
            idle_rounds = self.idle_rounds,
            "Agent stopped"
        );
        AgentOutcome {
            user: self.user.user,
            tiles_drawn: self.tiles_drawn,
            idle_rounds: self.idle_rounds,
            reason,
        }
    }
}
