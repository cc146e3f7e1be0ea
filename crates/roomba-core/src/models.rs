//! Canonical status model and normalization rules
//!
//! The robot reports its state as a JSON document. This module turns that
//! raw document into the immutable [`Status`] value consumed by accessory
//! frontends. `Status` is always replaced wholesale, never patched field
//! by field.

use serde::{Deserialize, Serialize};

use crate::error::{AccessoryError, AccessoryResult};

/// Raw state document as reported by the robot
pub type RawState = serde_json::Value;

/// Battery level at or below this percentage reports [`BatteryStatus::Low`]
pub const LOW_BATTERY_THRESHOLD: u8 = 20;

/// Mission phase as reported by the robot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissionPhase {
    /// Actively cleaning
    Run,
    /// Sitting on the dock, charging
    Charge,
    /// Stopped mid-mission (paused)
    Stop,
    /// Any other phase (e.g. "hmUsrDock", "evac")
    Other(String),
}

impl From<&str> for MissionPhase {
    fn from(phase: &str) -> Self {
        match phase {
            "run" => MissionPhase::Run,
            "charge" => MissionPhase::Charge,
            "stop" => MissionPhase::Stop,
            other => MissionPhase::Other(other.to_string()),
        }
    }
}

impl MissionPhase {
    /// Extract the mission phase from a raw state document.
    ///
    /// The phase lives at `cleanMissionStatus.phase`; a document without it
    /// is a protocol violation.
    pub fn from_raw(state: &RawState) -> AccessoryResult<MissionPhase> {
        state
            .get("cleanMissionStatus")
            .and_then(|m| m.get("phase"))
            .and_then(|p| p.as_str())
            .map(MissionPhase::from)
            .ok_or_else(|| {
                AccessoryError::Protocol("missing cleanMissionStatus.phase".to_string())
            })
    }
}

/// Charging state exposed to the accessory frontend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargingState {
    Charging,
    NotCharging,
}

/// Battery percentage, or unknown when the robot did not report one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatteryLevel {
    Percent(u8),
    Unknown,
}

/// Low-battery indicator derived from [`BatteryLevel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatteryStatus {
    Low,
    Normal,
}

impl BatteryStatus {
    /// `Low` iff the level is known and at or below the threshold.
    ///
    /// An unknown level reports `Normal` rather than raising a spurious
    /// low-battery alert.
    pub fn from_level(level: BatteryLevel) -> BatteryStatus {
        match level {
            BatteryLevel::Percent(pct) if pct <= LOW_BATTERY_THRESHOLD => BatteryStatus::Low,
            _ => BatteryStatus::Normal,
        }
    }
}

/// Snapshot of the robot's externally visible state
///
/// Invariants: `battery_status` is a pure function of `battery_level`, and
/// `running`/`charging` are a pure function of the mission phase. Construct
/// through [`Status::from_parts`] or [`Status::from_raw`] to keep them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    /// Robot is actively cleaning
    pub running: bool,
    /// Derived from mission phase
    pub charging: ChargingState,
    /// Battery percentage 0-100, or unknown
    pub battery_level: BatteryLevel,
    /// Derived from `battery_level`
    pub battery_status: BatteryStatus,
    /// Bin-full flag as reported
    pub bin_full: bool,
}

impl Status {
    /// Build a status from its inputs, applying the normalization rules:
    ///
    /// | phase        | running | charging    |
    /// |--------------|---------|-------------|
    /// | `run`        | true    | NotCharging |
    /// | `charge`     | false   | Charging    |
    /// | anything else| false   | NotCharging |
    pub fn from_parts(phase: &MissionPhase, battery_level: BatteryLevel, bin_full: bool) -> Status {
        let (running, charging) = match phase {
            MissionPhase::Run => (true, ChargingState::NotCharging),
            MissionPhase::Charge => (false, ChargingState::Charging),
            _ => (false, ChargingState::NotCharging),
        };

        Status {
            running,
            charging,
            battery_level,
            battery_status: BatteryStatus::from_level(battery_level),
            bin_full,
        }
    }

    /// Normalize a raw state document into a [`Status`].
    ///
    /// Expects `cleanMissionStatus.phase`, `batPct`, and `bin.full`. A
    /// missing `batPct` maps to [`BatteryLevel::Unknown`]; a missing phase
    /// or bin flag is a protocol violation.
    pub fn from_raw(state: &RawState) -> AccessoryResult<Status> {
        let phase = MissionPhase::from_raw(state)?;

        let battery_level = match state.get("batPct") {
            None | Some(serde_json::Value::Null) => BatteryLevel::Unknown,
            Some(value) => {
                let pct = value.as_u64().filter(|&p| p <= 100).ok_or_else(|| {
                    AccessoryError::Protocol(format!("battery percentage out of range: {value}"))
                })?;
                BatteryLevel::Percent(pct as u8)
            }
        };

        let bin_full = state
            .get("bin")
            .and_then(|b| b.get("full"))
            .and_then(|f| f.as_bool())
            .ok_or_else(|| AccessoryError::Protocol("missing bin.full".to_string()))?;

        Ok(Status::from_parts(&phase, battery_level, bin_full))
    }
}
