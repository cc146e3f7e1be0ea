//! User-initiated start/pause commands
//!
//! Each `set_power` invocation walks Idle -> Connecting -> Executing ->
//! (Succeeded | Failed) on its own independent session; there is no command
//! queue, the last writer wins. The cache is invalidated up front so stale
//! status cannot be served across a command boundary.

use std::sync::Arc;
use std::time::Duration;

use roomba_core::AccessoryResult;
use tracing::{debug, info, warn};

use crate::cache::StatusCache;
use crate::config::AccessoryConfig;
use crate::connection::ConnectionPolicy;
use crate::dock::DockPoller;

/// Progression of one command invocation, logged at each transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommandState {
    Idle,
    Connecting,
    Executing,
    Succeeded,
    Failed,
}

pub struct CommandCoordinator {
    policy: Arc<dyn ConnectionPolicy>,
    cache: Arc<StatusCache>,
    start_grace: Duration,
    dock_poll_interval: Duration,
    dock_poll_max_attempts: u32,
}

impl CommandCoordinator {
    pub fn new(
        policy: Arc<dyn ConnectionPolicy>,
        cache: Arc<StatusCache>,
        config: &AccessoryConfig,
    ) -> Self {
        Self {
            policy,
            cache,
            start_grace: config.start_grace(),
            dock_poll_interval: config.dock_poll_interval(),
            dock_poll_max_attempts: config.dock_poll_max_attempts,
        }
    }

    /// Start cleaning (`on`) or pause and return to dock (`!on`).
    ///
    /// Success is reported as soon as the robot acknowledges the command;
    /// session cleanup (start grace delay, dock polling) continues in the
    /// background on the same session.
    pub async fn set_power(&self, on: bool) -> AccessoryResult<()> {
        self.cache.invalidate();

        let mut state = CommandState::Idle;
        debug!(?state, on, "Command accepted");

        state = CommandState::Connecting;
        debug!(?state, "Opening robot session");

        let session = match self.policy.acquire().await {
            Ok(session) => session,
            Err(err) => {
                state = CommandState::Failed;
                warn!(?state, %err, "Could not reach robot");
                return Err(err.into());
            }
        };

        state = CommandState::Executing;
        debug!(?state, on, "Session ready");

        if on {
            info!("Starting robot");
            match session.start().await {
                Ok(()) => {
                    state = CommandState::Succeeded;
                    debug!(?state, "Robot is running");

                    // The robot needs a moment after acknowledging start
                    // before the session may be torn down.
                    let policy = self.policy.clone();
                    let grace = self.start_grace;
                    tokio::spawn(async move {
                        tokio::time::sleep(grace).await;
                        policy.close(session).await;
                    });
                    Ok(())
                }
                Err(err) => {
                    state = CommandState::Failed;
                    warn!(?state, %err, "Start command failed");
                    self.policy.close(session).await;
                    Err(err.into())
                }
            }
        } else {
            info!("Pausing robot, then returning to dock");
            match session.pause().await {
                Ok(()) => {
                    state = CommandState::Succeeded;
                    debug!(?state, "Robot paused");

                    // Hand the same session to the dock poller; it releases
                    // the session when it reaches a terminal state.
                    let poller = DockPoller::new(
                        self.policy.clone(),
                        session,
                        self.dock_poll_interval,
                        self.dock_poll_max_attempts,
                    );
                    tokio::spawn(poller.run());
                    Ok(())
                }
                Err(err) => {
                    state = CommandState::Failed;
                    warn!(?state, %err, "Pause command failed");
                    self.policy.close(session).await;
                    Err(err.into())
                }
            }
        }
    }
}
