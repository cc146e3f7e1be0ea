//! Transport layer for robot communication
//!
//! This module abstracts the vendor device-control library behind the
//! [`RobotTransport`]/[`RobotSession`] traits and ships a scriptable mock
//! for tests and demos. Real robots are driven by out-of-tree trait
//! implementations constructed from the connection credentials and injected
//! into the accessory.

mod adapter;
pub mod error;
pub mod mock;

pub use adapter::{RobotEvent, RobotSession, RobotTransport, StateField};
pub use error::TransportError;

use std::sync::Arc;

use crate::config::TransportConfig;

/// Create a transport based on configuration
pub fn create_transport(config: &TransportConfig) -> Result<Arc<dyn RobotTransport>, TransportError> {
    match config {
        TransportConfig::Mock(cfg) => Ok(Arc::new(mock::MockRobot::new(cfg))),
    }
}
