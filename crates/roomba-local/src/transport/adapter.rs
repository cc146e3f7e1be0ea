//! Robot transport trait and types
//!
//! The vendor device-control library is abstracted behind two traits:
//! [`RobotTransport`] dials the robot and hands out sessions, and
//! [`RobotSession`] is one open channel carrying commands and telemetry.
//! Real robots are driven by out-of-tree implementations built from the
//! connection credentials; this crate ships a mock for tests and demos.

use std::sync::Arc;

use async_trait::async_trait;
use roomba_core::RawState;
use tokio::sync::broadcast;

use super::TransportError;

/// State document fields that can be requested from the robot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateField {
    /// `cleanMissionStatus` - mission phase and cycle info
    CleanMissionStatus,
    /// `batPct` - battery percentage
    BatteryPercent,
    /// `bin` - bin presence and full flag
    Bin,
}

impl StateField {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateField::CleanMissionStatus => "cleanMissionStatus",
            StateField::BatteryPercent => "batPct",
            StateField::Bin => "bin",
        }
    }
}

/// Unsolicited event pushed by an open session
#[derive(Debug, Clone)]
pub enum RobotEvent {
    /// The session became ready for commands
    Connected,
    /// The robot pushed a state document
    State(RawState),
}

/// Dials the robot and produces ready-to-authenticate sessions
#[async_trait]
pub trait RobotTransport: Send + Sync {
    /// Open a new session to the robot.
    ///
    /// The returned session is not necessarily ready yet; callers must
    /// [`RobotSession::await_ready`] before issuing commands.
    async fn open(&self) -> Result<Arc<dyn RobotSession>, TransportError>;
}

/// One open channel to the robot
///
/// Sessions are owned by whoever opened them and must be closed exactly
/// once on every exit path, unless a keep-alive policy holds the session
/// for the accessory's entire lifetime.
#[async_trait]
pub trait RobotSession: Send + Sync + std::fmt::Debug {
    /// Suspend until the session is connected and usable.
    ///
    /// Transport-level connection failure surfaces here.
    async fn await_ready(&self) -> Result<(), TransportError>;

    /// Begin or resume a cleaning mission
    async fn start(&self) -> Result<(), TransportError>;

    /// Pause the current mission
    async fn pause(&self) -> Result<(), TransportError>;

    /// Send the robot back to its dock
    async fn dock(&self) -> Result<(), TransportError>;

    /// Request a state document containing the given fields
    async fn get_state(&self, fields: &[StateField]) -> Result<RawState, TransportError>;

    /// Release the underlying channel; idempotent
    async fn close(&self);

    /// Subscribe to connect/state events pushed by the robot
    fn subscribe(&self) -> broadcast::Receiver<RobotEvent>;

    /// Whether the session is currently connected
    fn is_connected(&self) -> bool;
}
