//! Shared building blocks for the hearthgate device controller.
//!
//! This crate holds the pieces every other crate agrees on: the error
//! taxonomy, validated identifiers, the timing constants of the control
//! loop and the configuration records the core is started with.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;

pub use config::{DeviceConfig, ProvisionedConfig};
pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
