//! Accessory configuration
//!
//! Connection credentials, cache/refresh policy selection, and the explicit
//! bounds on the retry loops (dock polling, in-flight status waits).

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for one vacuum accessory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessoryConfig {
    /// Display name
    pub name: String,
    /// Robot model reported to the frontend
    #[serde(default = "default_model")]
    pub model: String,
    /// Connection credentials, passed through to the transport
    #[serde(flatten)]
    pub credentials: Credentials,
    /// Hold one connection open for the accessory's lifetime and receive
    /// push updates
    #[serde(default)]
    pub keep_alive_enabled: bool,
    /// Keep the status cache warm from the background instead of fetching
    /// on read
    #[serde(default)]
    pub auto_refresh_enabled: bool,
    /// Status cache TTL in seconds; defaults to 5 with keep-alive (burst
    /// de-duplication only) and 30 otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl_secs: Option<u64>,
    /// Background refresh period in pull mode
    #[serde(default = "default_polling_interval")]
    pub polling_interval_secs: u64,
    /// Overall bound on one status fetch round-trip
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
    /// Delay between a start acknowledgement and closing an ephemeral
    /// session
    #[serde(default = "default_start_grace")]
    pub start_grace_secs: u64,
    /// Fixed interval between dock polls
    #[serde(default = "default_dock_poll_interval")]
    pub dock_poll_interval_secs: u64,
    /// Give up docking after this many "still running" polls
    #[serde(default = "default_dock_poll_max_attempts")]
    pub dock_poll_max_attempts: u32,
    /// Interval between cache re-reads while a fetch is in flight
    #[serde(default = "default_status_wait_interval")]
    pub status_wait_interval_ms: u64,
    /// Give up a status read after this many waits
    #[serde(default = "default_status_wait_max")]
    pub status_wait_max: u32,
    /// Transport selection
    #[serde(default)]
    pub transport: TransportConfig,
}

impl AccessoryConfig {
    pub fn cache_ttl(&self) -> Duration {
        let default = if self.keep_alive_enabled { 5 } else { 30 };
        Duration::from_secs(self.cache_ttl_secs.unwrap_or(default))
    }

    pub fn polling_interval(&self) -> Duration {
        Duration::from_secs(self.polling_interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn start_grace(&self) -> Duration {
        Duration::from_secs(self.start_grace_secs)
    }

    pub fn dock_poll_interval(&self) -> Duration {
        Duration::from_secs(self.dock_poll_interval_secs)
    }

    pub fn status_wait_interval(&self) -> Duration {
        Duration::from_millis(self.status_wait_interval_ms)
    }
}

/// Robot connection credentials; opaque secrets
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Robot identity
    pub blid: String,
    /// Robot password
    pub robotpwd: String,
    /// Robot address on the local network
    pub ipaddress: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("blid", &self.blid)
            .field("robotpwd", &"<redacted>")
            .field("ipaddress", &self.ipaddress)
            .finish()
    }
}

/// Transport configuration
///
/// Vendor transports implement [`crate::transport::RobotTransport`] out of
/// tree and are injected via [`crate::RoombaAccessory::with_transport`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// Simulated robot for tests and demos
    Mock(MockConfig),
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::Mock(MockConfig::default())
    }
}

/// Mock transport configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MockConfig {
    /// Simulated latency in milliseconds
    #[serde(default)]
    pub latency_ms: u64,
}

fn default_model() -> String {
    "Roomba".to_string()
}

fn default_polling_interval() -> u64 {
    60
}

fn default_fetch_timeout() -> u64 {
    5
}

fn default_start_grace() -> u64 {
    2
}

fn default_dock_poll_interval() -> u64 {
    3
}

fn default_dock_poll_max_attempts() -> u32 {
    100
}

fn default_status_wait_interval() -> u64 {
    100
}

fn default_status_wait_max() -> u32 {
    50
}
