//! Status fetcher and the shared read path
//!
//! One fetch cycle opens a session, pulls mission phase, battery and bin
//! state under an overall timeout, normalizes the reply, and populates the
//! cache. The read path used by every characteristic getter serves from the
//! cache, waits out an in-flight fetch, and only reaches for the robot
//! itself when no background refresher owns the writes.

use std::sync::Arc;
use std::time::Duration;

use roomba_core::{AccessoryError, AccessoryResult, Status};
use tracing::{debug, info};

use crate::cache::{CacheRead, StatusCache};
use crate::config::AccessoryConfig;
use crate::connection::ConnectionPolicy;
use crate::transport::{RobotSession, StateField};

/// Fields requested for a full status snapshot
const STATUS_FIELDS: [StateField; 3] = [
    StateField::CleanMissionStatus,
    StateField::BatteryPercent,
    StateField::Bin,
];

pub struct StatusFetcher {
    policy: Arc<dyn ConnectionPolicy>,
    cache: Arc<StatusCache>,
    auto_refresh: bool,
    fetch_timeout: Duration,
    cache_ttl: Duration,
    wait_interval: Duration,
    wait_max: u32,
}

impl StatusFetcher {
    pub fn new(
        policy: Arc<dyn ConnectionPolicy>,
        cache: Arc<StatusCache>,
        config: &AccessoryConfig,
    ) -> Self {
        Self {
            policy,
            cache,
            auto_refresh: config.auto_refresh_enabled,
            fetch_timeout: config.fetch_timeout(),
            cache_ttl: config.cache_ttl(),
            wait_interval: config.status_wait_interval(),
            wait_max: config.status_wait_max,
        }
    }

    /// Read path shared by all characteristic getters.
    ///
    /// Serves a fresh cached status immediately; otherwise waits out an
    /// in-flight fetch (bounded, visible to the caller only as latency).
    /// On a miss, fetches synchronously unless a background refresher is
    /// the sole cache writer, in which case it waits for the refresher.
    pub async fn get_status(&self) -> AccessoryResult<Status> {
        let mut waits = 0u32;
        loop {
            match self.cache.get() {
                CacheRead::Fresh(status) => return Ok(status),
                CacheRead::InFlight => {}
                CacheRead::Missing if self.auto_refresh => {
                    // The background refresher owns the writes; poll until
                    // it populates the cache.
                }
                CacheRead::Missing => match self.refresh(false).await {
                    // Lost the race to another fetch; wait for it instead.
                    Err(AccessoryError::Busy(_)) => {}
                    result => return result,
                },
            }

            if waits >= self.wait_max {
                return Err(AccessoryError::Timeout);
            }
            waits += 1;
            tokio::time::sleep(self.wait_interval).await;
        }
    }

    /// One full fetch cycle: claim the in-flight slot, connect, query,
    /// normalize, populate the cache.
    ///
    /// `silent` downgrades the per-fetch log lines to debug; background
    /// refreshes use it so periodic traffic does not flood the log.
    pub async fn refresh(&self, silent: bool) -> AccessoryResult<Status> {
        self.cache
            .begin_fetch()
            .map_err(|err| AccessoryError::Busy(err.to_string()))?;

        let result = self.fetch_once(silent).await;
        match &result {
            Ok(status) => self.cache.set(status.clone(), self.cache_ttl),
            Err(err) => self.cache.set_error(err),
        }
        result
    }

    async fn fetch_once(&self, silent: bool) -> AccessoryResult<Status> {
        let result = match self.policy.acquire().await {
            Ok(session) => {
                let result = self.fetch(&session).await;
                self.policy.close(session).await;
                result
            }
            Err(err) => Err(err.into()),
        };

        match &result {
            Ok(status) => {
                if silent {
                    debug!(?status, "Robot status");
                } else {
                    info!(?status, "Robot status");
                }
            }
            Err(err) => {
                if silent {
                    debug!("Unable to determine state of robot");
                } else {
                    info!("Unable to determine state of robot");
                }
                debug!(%err, "Status fetch failed");
            }
        }
        result
    }

    /// Pull one status snapshot over an already-ready session
    pub async fn fetch(&self, session: &Arc<dyn RobotSession>) -> AccessoryResult<Status> {
        let raw = tokio::time::timeout(self.fetch_timeout, session.get_state(&STATUS_FIELDS))
            .await
            .map_err(|_| AccessoryError::Timeout)?
            .map_err(AccessoryError::from)?;

        Status::from_raw(&raw)
    }
}

#[cfg(test)]
mod tests {
    use roomba_core::{BatteryLevel, BatteryStatus, ChargingState};

    use super::*;
    use crate::config::MockConfig;
    use crate::connection::policy_from_config;
    use crate::transport::mock::{mission_state, MockOp, MockRobot};

    fn test_config() -> AccessoryConfig {
        let mut config: AccessoryConfig = toml::from_str(
            r#"
            name = "Test Vacuum"
            blid = "blid"
            robotpwd = "pwd"
            ipaddress = "127.0.0.1"
            "#,
        )
        .unwrap();
        config.status_wait_interval_ms = 10;
        config
    }

    fn fetcher_over(robot: &MockRobot, config: &AccessoryConfig) -> (Arc<StatusFetcher>, Arc<StatusCache>) {
        let policy = policy_from_config(Arc::new(robot.clone()), config.keep_alive_enabled);
        let cache = Arc::new(StatusCache::new());
        (
            Arc::new(StatusFetcher::new(policy, cache.clone(), config)),
            cache,
        )
    }

    #[tokio::test]
    async fn fetch_round_trip_normalizes_the_reply() {
        let robot = MockRobot::new(&MockConfig::default());
        robot.push_state(mission_state("charge", 55, false));
        let (fetcher, _cache) = fetcher_over(&robot, &test_config());

        let status = fetcher.get_status().await.unwrap();

        assert!(!status.running);
        assert_eq!(status.charging, ChargingState::Charging);
        assert_eq!(status.battery_level, BatteryLevel::Percent(55));
        assert_eq!(status.battery_status, BatteryStatus::Normal);
        assert!(!status.bin_full);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_robot_times_out() {
        let robot = MockRobot::new(&MockConfig { latency_ms: 60_000 });
        let (fetcher, _cache) = fetcher_over(&robot, &test_config());

        let err = fetcher.get_status().await.unwrap_err();
        assert!(matches!(err, AccessoryError::Timeout));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_reads_share_one_robot_query() {
        let robot = MockRobot::new(&MockConfig { latency_ms: 200 });
        let mut config = test_config();
        config.status_wait_max = 200;
        let (fetcher, _cache) = fetcher_over(&robot, &config);

        let (first, second) = tokio::join!(
            {
                let fetcher = fetcher.clone();
                async move { fetcher.get_status().await }
            },
            {
                let fetcher = fetcher.clone();
                async move { fetcher.get_status().await }
            }
        );

        first.unwrap();
        second.unwrap();
        assert_eq!(robot.state_query_count(), 1);
    }

    #[tokio::test]
    async fn failed_query_surfaces_and_clears_the_cache() {
        let robot = MockRobot::new(&MockConfig::default());
        robot.fail_on(MockOp::GetState, true);
        let (fetcher, cache) = fetcher_over(&robot, &test_config());

        let err = fetcher.get_status().await.unwrap_err();
        assert!(matches!(err, AccessoryError::Transport(_)));
        assert_eq!(cache.get(), CacheRead::Missing);
        // Ephemeral session closed on the error path.
        assert_eq!(robot.close_count(), 1);

        // Next read recovers immediately instead of serving a stale error.
        robot.fail_on(MockOp::GetState, false);
        fetcher.get_status().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn expired_cache_triggers_a_second_fetch() {
        let robot = MockRobot::new(&MockConfig::default());
        let mut config = test_config();
        config.cache_ttl_secs = Some(1);
        let (fetcher, _cache) = fetcher_over(&robot, &config);

        fetcher.get_status().await.unwrap();
        fetcher.get_status().await.unwrap();
        assert_eq!(robot.state_query_count(), 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        fetcher.get_status().await.unwrap();
        assert_eq!(robot.state_query_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn auto_refresh_reads_never_fetch_themselves() {
        let robot = MockRobot::new(&MockConfig::default());
        let mut config = test_config();
        config.auto_refresh_enabled = true;
        config.status_wait_max = 5;
        let (fetcher, cache) = fetcher_over(&robot, &config);

        // Nobody populates the cache: the read waits its bound, then
        // reports a timeout without ever touching the robot.
        let err = fetcher.get_status().await.unwrap_err();
        assert!(matches!(err, AccessoryError::Timeout));
        assert_eq!(robot.state_query_count(), 0);

        // Once the refresher writes, reads are served from the cache.
        cache.set(
            Status::from_raw(&mission_state("run", 80, false)).unwrap(),
            Duration::from_secs(30),
        );
        let status = fetcher.get_status().await.unwrap();
        assert!(status.running);
        assert_eq!(robot.state_query_count(), 0);
    }
}
