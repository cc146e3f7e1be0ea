//! Dock-retry polling state machine
//!
//! After a successful pause the robot keeps moving for a while; a dock
//! command issued too early is ignored. The poller re-queries the mission
//! phase on a fixed interval until the robot reports `stop`, then issues
//! the dock command and releases the session. A phase other than `run` or
//! `stop` means the robot is already idle, so the session is released
//! without docking. Every failure is terminal: log, release, done.

use std::sync::Arc;
use std::time::Duration;

use roomba_core::MissionPhase;
use tracing::{debug, info, warn};

use crate::connection::ConnectionPolicy;
use crate::transport::{RobotSession, StateField};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DockState {
    Polling,
    Docking,
    Done,
}

/// Waits for the robot to stop moving, then sends it to the dock
pub struct DockPoller {
    policy: Arc<dyn ConnectionPolicy>,
    session: Arc<dyn RobotSession>,
    interval: Duration,
    max_attempts: u32,
}

impl DockPoller {
    pub fn new(
        policy: Arc<dyn ConnectionPolicy>,
        session: Arc<dyn RobotSession>,
        interval: Duration,
        max_attempts: u32,
    ) -> Self {
        Self {
            policy,
            session,
            interval,
            max_attempts,
        }
    }

    /// Run to a terminal state, then release the session.
    ///
    /// Consumes the poller; intended to be spawned after a successful
    /// pause, holding the session the pause was issued on.
    pub async fn run(self) {
        let mut state = DockState::Polling;
        let mut attempts = 0u32;

        while state == DockState::Polling {
            let phase = match self
                .session
                .get_state(&[StateField::CleanMissionStatus])
                .await
                .map_err(Into::into)
                .and_then(|raw| MissionPhase::from_raw(&raw))
            {
                Ok(phase) => phase,
                Err(err) => {
                    warn!(%err, "Dock poll failed, giving up");
                    break;
                }
            };

            match phase {
                MissionPhase::Stop => {
                    state = DockState::Docking;
                    info!(?state, "Robot has stopped, issuing dock request");
                    match self.session.dock().await {
                        Ok(()) => info!("Robot docking"),
                        Err(err) => warn!(%err, "Dock command failed"),
                    }
                    state = DockState::Done;
                }
                MissionPhase::Run => {
                    attempts += 1;
                    if attempts >= self.max_attempts {
                        warn!(attempts, "Robot still running, giving up on docking");
                        break;
                    }
                    debug!(
                        interval_secs = self.interval.as_secs(),
                        "Robot is still running, will check again"
                    );
                    tokio::time::sleep(self.interval).await;
                }
                other => {
                    info!(phase = ?other, "Robot is not running, no dock needed");
                    state = DockState::Done;
                }
            }
        }

        self.policy.close(self.session).await;
    }
}
