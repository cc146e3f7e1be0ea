//! roomba-core - Core traits and types for robot vacuum accessory bridges
//!
//! This crate provides the fundamental abstractions shared by accessory
//! backends: the canonical [`Status`] model and its normalization rules,
//! the [`VacuumAccessory`] trait consumed by home-automation frontends,
//! and the common error taxonomy.

pub mod accessory;
pub mod error;
pub mod models;

pub use accessory::{AccessoryInformation, ServiceInfo, VacuumAccessory};
pub use error::{AccessoryError, AccessoryResult};
pub use models::*;
