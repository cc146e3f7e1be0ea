//! roomba-local - Local-connection backend for the roomba-bridge accessory
//!
//! Synchronizes a networked robot vacuum's state with a home-automation
//! frontend over an unreliable, session-based connection.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      RoombaAccessory                         │
//! │  Implements VacuumAccessory trait                            │
//! │                                                              │
//! │  reads               writes              background          │
//! │  ┌─────────────┐    ┌────────────────┐  ┌───────────────┐    │
//! │  │StatusFetcher│    │CommandCoord.   │  │AutoRefresher  │    │
//! │  │ ┌─────────┐ │    │  ┌──────────┐  │  │ (push / pull) │    │
//! │  │ │StatusCache│◄───┤  │DockPoller│  │  └──────┬────────┘    │
//! │  │ └─────────┘ │    │  └──────────┘  │         │             │
//! │  └──────┬──────┘    └───────┬────────┘         │             │
//! │         └─────────┬─────────┴──────────────────┘             │
//! │             ┌─────┴──────────┐                               │
//! │             │ConnectionPolicy│  keep-alive | ephemeral       │
//! │             └─────┬──────────┘                               │
//! │             ┌─────┴────────┐                                 │
//! │             │RobotTransport│  vendor library seam            │
//! │             └──────────────┘                                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod accessory;
pub mod cache;
pub mod command;
pub mod config;
pub mod connection;
pub mod dock;
pub mod fetcher;
pub mod refresh;
pub mod transport;

pub use accessory::RoombaAccessory;
pub use cache::{AlreadyInFlight, CacheRead, StatusCache};
pub use command::CommandCoordinator;
pub use config::{AccessoryConfig, Credentials, MockConfig, TransportConfig};
pub use connection::{policy_from_config, ConnectionPolicy, EphemeralPolicy, KeepAlivePolicy};
pub use dock::DockPoller;
pub use fetcher::StatusFetcher;
pub use refresh::AutoRefresher;
pub use transport::{create_transport, RobotSession, RobotTransport, StateField, TransportError};

// Re-export for convenience
pub use roomba_core::{AccessoryError, AccessoryResult, Status, VacuumAccessory};
