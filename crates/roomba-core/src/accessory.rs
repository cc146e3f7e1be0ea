//! VacuumAccessory trait - the seam consumed by home-automation frontends
//!
//! Frontends register characteristic getters/setters against this trait and
//! receive unsolicited updates through the broadcast channel returned by
//! [`VacuumAccessory::subscribe_updates`]. All operations are async and
//! `Result`-returning; a failed read surfaces as a getter error (the
//! framework shows the device as unreachable), a failed write as a
//! `set_power` error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::AccessoryResult;
use crate::models::{BatteryLevel, BatteryStatus, ChargingState, Status};

/// Accessory metadata exposed through the information service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessoryInformation {
    pub name: String,
    pub model: String,
    pub manufacturer: String,
    pub serial_number: String,
    pub firmware_revision: String,
}

/// A capability the accessory exposes to the frontend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServiceInfo {
    /// Accessory metadata (manufacturer, model, serial, firmware)
    AccessoryInformation(AccessoryInformation),
    /// On/off switch mapped to start/pause-and-dock
    PowerSwitch { name: String },
    /// Battery level, charging state, and low-battery indicator
    Battery { name: String },
}

/// A controllable, queryable vacuum exposed to a home-automation framework
#[async_trait]
pub trait VacuumAccessory: Send + Sync {
    /// Display name of the accessory
    fn name(&self) -> &str;

    /// Whether the robot is actively cleaning
    async fn get_running_status(&self) -> AccessoryResult<bool>;

    /// Whether the robot is charging
    async fn get_is_charging(&self) -> AccessoryResult<ChargingState>;

    /// Battery percentage, or unknown
    async fn get_battery_level(&self) -> AccessoryResult<BatteryLevel>;

    /// Low-battery indicator
    async fn get_low_battery_status(&self) -> AccessoryResult<BatteryStatus>;

    /// Start cleaning (`on`) or pause and return to dock (`!on`)
    async fn set_power(&self, on: bool) -> AccessoryResult<()>;

    /// Identify request from the frontend; a no-op for robots without
    /// a locate chime
    async fn identify(&self) -> AccessoryResult<()>;

    /// Enumerate the services this accessory exposes
    fn get_services(&self) -> Vec<ServiceInfo>;

    /// Subscribe to unsolicited status updates (push events or background
    /// refresh results)
    fn subscribe_updates(&self) -> broadcast::Receiver<Status>;
}
