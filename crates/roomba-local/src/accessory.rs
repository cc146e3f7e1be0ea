//! RoombaAccessory - the VacuumAccessory implementation
//!
//! Glue between the home-automation frontend and the synchronization core:
//! characteristic reads go through the cached status, writes go through the
//! command coordinator, and the configured refresh mode feeds the update
//! channel.

use std::sync::Arc;

use async_trait::async_trait;
use roomba_core::{
    AccessoryInformation, AccessoryResult, BatteryLevel, BatteryStatus, ChargingState, ServiceInfo,
    Status, VacuumAccessory,
};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::cache::StatusCache;
use crate::command::CommandCoordinator;
use crate::config::AccessoryConfig;
use crate::connection::policy_from_config;
use crate::fetcher::StatusFetcher;
use crate::refresh::AutoRefresher;
use crate::transport::{create_transport, RobotTransport, TransportError};

const MANUFACTURER: &str = "iRobot";
const SERIAL_NUMBER: &str = "See iRobot App";
const FIRMWARE_REVISION: &str = "N/A";

/// A robot vacuum exposed as a home-automation accessory
pub struct RoombaAccessory {
    config: AccessoryConfig,
    fetcher: Arc<StatusFetcher>,
    coordinator: CommandCoordinator,
    updates: broadcast::Sender<Status>,
    _refresher: Option<AutoRefresher>,
}

impl RoombaAccessory {
    /// Build the accessory from configuration, creating the transport it
    /// names
    pub fn from_config(config: AccessoryConfig) -> Result<Self, TransportError> {
        let transport = create_transport(&config.transport)?;
        Ok(Self::with_transport(config, transport))
    }

    /// Build the accessory over an injected transport (vendor
    /// implementations live out of tree)
    pub fn with_transport(config: AccessoryConfig, transport: Arc<dyn RobotTransport>) -> Self {
        let policy = policy_from_config(transport, config.keep_alive_enabled);
        let cache = Arc::new(StatusCache::new());
        let fetcher = Arc::new(StatusFetcher::new(policy.clone(), cache.clone(), &config));
        let coordinator = CommandCoordinator::new(policy.clone(), cache.clone(), &config);
        let (updates, _) = broadcast::channel(16);

        let refresher = if config.keep_alive_enabled {
            Some(AutoRefresher::spawn_push(
                policy,
                cache,
                updates.clone(),
                config.cache_ttl(),
            ))
        } else if config.auto_refresh_enabled {
            Some(AutoRefresher::spawn_pull(
                fetcher.clone(),
                updates.clone(),
                config.polling_interval(),
            ))
        } else {
            None
        };

        Self {
            config,
            fetcher,
            coordinator,
            updates,
            _refresher: refresher,
        }
    }

    async fn status(&self) -> AccessoryResult<Status> {
        self.fetcher.get_status().await
    }
}

#[async_trait]
impl VacuumAccessory for RoombaAccessory {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn get_running_status(&self) -> AccessoryResult<bool> {
        debug!("Running status requested");
        Ok(self.status().await?.running)
    }

    async fn get_is_charging(&self) -> AccessoryResult<ChargingState> {
        debug!("Charging status requested");
        Ok(self.status().await?.charging)
    }

    async fn get_battery_level(&self) -> AccessoryResult<BatteryLevel> {
        debug!("Battery level requested");
        Ok(self.status().await?.battery_level)
    }

    async fn get_low_battery_status(&self) -> AccessoryResult<BatteryStatus> {
        debug!("Battery status requested");
        Ok(self.status().await?.battery_status)
    }

    async fn set_power(&self, on: bool) -> AccessoryResult<()> {
        self.coordinator.set_power(on).await
    }

    async fn identify(&self) -> AccessoryResult<()> {
        info!("Identify requested; not supported by this robot");
        Ok(())
    }

    fn get_services(&self) -> Vec<ServiceInfo> {
        vec![
            ServiceInfo::AccessoryInformation(AccessoryInformation {
                name: self.config.name.clone(),
                model: self.config.model.clone(),
                manufacturer: MANUFACTURER.to_string(),
                serial_number: SERIAL_NUMBER.to_string(),
                firmware_revision: FIRMWARE_REVISION.to_string(),
            }),
            ServiceInfo::PowerSwitch {
                name: self.config.name.clone(),
            },
            ServiceInfo::Battery {
                name: self.config.name.clone(),
            },
        ]
    }

    fn subscribe_updates(&self) -> broadcast::Receiver<Status> {
        self.updates.subscribe()
    }
}
