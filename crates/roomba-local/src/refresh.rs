//! Background cache refresh
//!
//! Keeps the status cache warm so characteristic reads are served without
//! a robot round-trip. Two mutually exclusive modes, selected from
//! configuration at accessory construction:
//!
//! - push: subscribe once to the keep-alive session's event stream and
//!   normalize every state event straight into the cache; no polling.
//! - pull: re-fetch silently on a fixed timer over ephemeral sessions.
//!
//! Either way, successful refreshes are forwarded to the accessory update
//! channel so the frontend sees unsolicited characteristic updates.

use std::sync::Arc;
use std::time::Duration;

use roomba_core::Status;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::cache::StatusCache;
use crate::connection::ConnectionPolicy;
use crate::fetcher::StatusFetcher;
use crate::transport::RobotEvent;

/// Handle to the background refresh task; aborts the task on drop
pub struct AutoRefresher {
    handle: JoinHandle<()>,
}

impl AutoRefresher {
    /// Push mode: consume the keep-alive session's state events.
    ///
    /// The policy must be keep-alive; the session stays open for the
    /// accessory's entire lifetime and is never closed here.
    pub fn spawn_push(
        policy: Arc<dyn ConnectionPolicy>,
        cache: Arc<StatusCache>,
        updates: broadcast::Sender<Status>,
        cache_ttl: Duration,
    ) -> Self {
        info!("Enabling push updates over the keep-alive connection");

        let handle = tokio::spawn(async move {
            let session = match policy.open().await {
                Ok(session) => session,
                Err(err) => {
                    error!(%err, "Could not open robot session for push updates");
                    return;
                }
            };

            let mut events = session.subscribe();
            loop {
                match events.recv().await {
                    Ok(RobotEvent::State(raw)) => match Status::from_raw(&raw) {
                        Ok(status) => {
                            debug!(?status, "Robot pushed a state update");
                            cache.set(status.clone(), cache_ttl);
                            let _ = updates.send(status);
                        }
                        Err(err) => warn!(%err, "Ignoring malformed state event"),
                    },
                    Ok(RobotEvent::Connected) => debug!("Connected to robot"),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "State event listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("Robot event stream closed");
                        break;
                    }
                }
            }
        });

        Self { handle }
    }

    /// Pull mode: silent re-fetch on a fixed timer, starting immediately.
    pub fn spawn_pull(
        fetcher: Arc<StatusFetcher>,
        updates: broadcast::Sender<Status>,
        interval: Duration,
    ) -> Self {
        info!(
            interval_secs = interval.as_secs(),
            "Enabling background status refresh"
        );

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                // First tick completes immediately: one initial fetch at
                // startup, then one per interval.
                ticker.tick().await;
                match fetcher.refresh(true).await {
                    Ok(status) => {
                        let _ = updates.send(status);
                    }
                    Err(err) => debug!(%err, "Background refresh failed"),
                }
            }
        });

        Self { handle }
    }
}

impl Drop for AutoRefresher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use roomba_core::{BatteryLevel, ChargingState};

    use super::*;
    use crate::cache::CacheRead;
    use crate::config::{AccessoryConfig, MockConfig};
    use crate::connection::policy_from_config;
    use crate::transport::mock::{mission_state, MockRobot};

    fn test_config() -> AccessoryConfig {
        toml::from_str(
            r#"
            name = "Test Vacuum"
            blid = "blid"
            robotpwd = "pwd"
            ipaddress = "127.0.0.1"
            "#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn push_mode_feeds_cache_and_update_channel() {
        let robot = MockRobot::new(&MockConfig::default());
        let policy = policy_from_config(Arc::new(robot.clone()), true);
        let cache = Arc::new(StatusCache::new());
        let (updates, mut update_rx) = broadcast::channel(16);

        let _refresher = AutoRefresher::spawn_push(
            policy,
            cache.clone(),
            updates,
            Duration::from_secs(5),
        );
        tokio::task::yield_now().await;

        robot.inject_state(mission_state("run", 42, true));

        let status = update_rx.recv().await.unwrap();
        assert!(status.running);
        assert_eq!(status.battery_level, BatteryLevel::Percent(42));
        assert!(status.bin_full);
        assert!(matches!(cache.get(), CacheRead::Fresh(_)));

        // No polling in push mode.
        assert_eq!(robot.state_query_count(), 0);
    }

    #[tokio::test]
    async fn push_mode_skips_malformed_events() {
        let robot = MockRobot::new(&MockConfig::default());
        let policy = policy_from_config(Arc::new(robot.clone()), true);
        let cache = Arc::new(StatusCache::new());
        let (updates, mut update_rx) = broadcast::channel(16);

        let _refresher = AutoRefresher::spawn_push(
            policy,
            cache.clone(),
            updates,
            Duration::from_secs(5),
        );
        tokio::task::yield_now().await;

        robot.inject_state(serde_json::json!({ "unexpected": true }));
        robot.inject_state(mission_state("charge", 90, false));

        let status = update_rx.recv().await.unwrap();
        assert_eq!(status.charging, ChargingState::Charging);
    }

    #[tokio::test(start_paused = true)]
    async fn pull_mode_refetches_on_the_timer() {
        let robot = MockRobot::new(&MockConfig::default());
        let mut config = test_config();
        config.auto_refresh_enabled = true;
        let policy = policy_from_config(Arc::new(robot.clone()), false);
        let cache = Arc::new(StatusCache::new());
        let fetcher = Arc::new(StatusFetcher::new(policy, cache.clone(), &config));
        let (updates, mut update_rx) = broadcast::channel(16);

        let _refresher =
            AutoRefresher::spawn_pull(fetcher, updates, Duration::from_secs(60));

        // Initial fetch at startup.
        let first = update_rx.recv().await.unwrap();
        assert!(!first.running);
        assert_eq!(robot.state_query_count(), 1);

        // One more fetch per interval.
        tokio::time::advance(Duration::from_secs(61)).await;
        update_rx.recv().await.unwrap();
        assert_eq!(robot.state_query_count(), 2);
    }
}
