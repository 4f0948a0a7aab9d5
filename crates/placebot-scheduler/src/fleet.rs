//! Starts one agent per account and waits for them to finish.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use placebot_client::Login;
use placebot_core::config::{CanvasConfig, SchedulerConfig, UserConfig};

use crate::agent::{Agent, StopReason};
use crate::floor::DrawingFloor;

/// Timing knobs for a fleet run.
#[derive(Debug, Clone, Copy)]
pub struct FleetSettings {
    pub idle_retry: Duration,
    pub login_stagger: Duration,
    pub ready_poll: Duration,
}

impl FleetSettings {
    pub fn from_config(scheduler: &SchedulerConfig, canvas: &CanvasConfig) -> Self {
        Self {
            idle_retry: Duration::from_secs(scheduler.idle_retry_secs),
            login_stagger: Duration::from_millis(scheduler.login_stagger_ms),
            ready_poll: Duration::from_millis(canvas.ready_poll_ms),
        }
    }
}

/// Summary of a finished fleet run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FleetReport {
    /// Agents spawned.
    pub started: usize,
    /// Agents that never got past login.
    pub failed_login: usize,
    /// Agents that stopped after drawing had begun.
    pub stopped: usize,
}

pub struct Fleet {
    users: Vec<UserConfig>,
    login: Arc<dyn Login>,
    floor: Arc<DrawingFloor>,
    settings: FleetSettings,
}

impl Fleet {
    pub fn new(
        users: Vec<UserConfig>,
        login: Arc<dyn Login>,
        floor: Arc<DrawingFloor>,
        settings: FleetSettings,
    ) -> Self {
        Self {
            users,
            login,
            floor,
            settings,
        }
    }

    /// Wait for the first snapshot, start the agents with staggered logins
    /// and return once every agent has stopped.
    pub async fn run(self) -> FleetReport {
        self.floor.canvas().wait_ready(self.settings.ready_poll).await;
        info!(agents = self.users.len(), "Canvas ready, starting agents");

        let mut handles = Vec::with_capacity(self.users.len());
        for (i, user) in self.users.into_iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.settings.login_stagger).await;
            }
            let agent = Agent::new(
                user,
                self.login.clone(),
                self.floor.clone(),
                self.settings.idle_retry,
            );
            handles.push(tokio::spawn(agent.run()));
        }

        let mut report = FleetReport {
            started: handles.len(),
            ..FleetReport::default()
        };
        for handle in handles {
            match handle.await {
                Ok(outcome) => match outcome.reason {
                    StopReason::Login(_) => report.failed_login += 1,
                    StopReason::Draw(_) => report.stopped += 1,
                },
                Err(e) => {
                    error!(%e, "Agent task panicked");
                    report.stopped += 1;
                }
            }
        }

        info!(
            started = report.started,
            failed_login = report.failed_login,
            stopped = report.stopped,
            "All agents stopped"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{DrawLog, FakeApi, FakeLogin, color, user};
    use placebot_canvas::fill::RowFill;
    use placebot_canvas::{BitmapDrawer, Board, Canvas, CompositeDrawer, TargetImage};
    use tokio::time::Instant;

    fn settings() -> FleetSettings {
        FleetSettings {
            idle_retry: Duration::from_secs(1),
            login_stagger: Duration::from_secs(1),
            ready_poll: Duration::from_millis(500),
        }
    }

    fn unready_floor(image: &str) -> Arc<DrawingFloor> {
        let mut drawer = CompositeDrawer::new();
        drawer.push(
            "zone",
            Box::new(BitmapDrawer::new(
                (0, 0),
                Box::new(RowFill::new(false)),
                TargetImage::parse(image),
            )),
        );
        Arc::new(DrawingFloor::new(Arc::new(Canvas::new(4)), drawer))
    }

    #[test]
    fn test_settings_from_config() {
        let s = FleetSettings::from_config(&SchedulerConfig::default(), &CanvasConfig::default());
        assert_eq!(s.idle_retry, Duration::from_secs(1));
        assert_eq!(s.login_stagger, Duration::from_millis(1000));
        assert_eq!(s.ready_poll, Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fleet_waits_for_canvas_and_reports() {
        let log = Arc::new(DrawLog::default());
        let login = FakeLogin::default()
            .with(FakeApi::new("a", log.clone()).failing_after(1))
            .with(FakeApi::new("b", log.clone()).failing_after(1));
        let floor = unready_floor("12\n34");
        let users = vec![user("a"), user("nobody"), user("b")];

        let canvas = floor.canvas().clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(10)).await;
            canvas.replace(Board::new(4)).unwrap();
        });

        let start = Instant::now();
        let report = Fleet::new(users, Arc::new(login), floor.clone(), settings())
            .run()
            .await;

        assert_eq!(
            report,
            FleetReport {
                started: 3,
                failed_login: 1,
                stopped: 2,
            }
        );
        // Nothing is drawn before the snapshot arrives.
        assert!(start.elapsed() >= Duration::from_secs(10));

        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(floor.canvas().get(0, 0), Some(color(1)));
        assert_eq!(floor.canvas().get(1, 0), Some(color(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_bad_credentials_do_not_stop_others() {
        let log = Arc::new(DrawLog::default());
        let login = FakeLogin::default().with(FakeApi::new("good", log.clone()).failing_after(2));
        let floor = unready_floor("12\n34");
        floor.canvas().replace(Board::new(4)).unwrap();

        let report = Fleet::new(
            vec![user("bad"), user("good")],
            Arc::new(login),
            floor.clone(),
            settings(),
        )
        .run()
        .await;

        assert_eq!(report.failed_login, 1);
        assert_eq!(report.stopped, 1);
        assert_eq!(log.entries().len(), 2);
        assert_eq!(floor.canvas().get(1, 0), Some(color(2)));
        assert_eq!(floor.canvas().get(0, 1), Some(color(0)));
    }
}
