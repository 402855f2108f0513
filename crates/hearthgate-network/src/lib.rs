//! Network adapters for the hearthgate controller.
//!
//! # Components
//!
//! - **HttpBackend**: the authorization backend over JSON/HTTP
//! - **mqtt**: command subscription and status publication
//! - **api**: the local control API served to apps on the same network
//!
//! The coordinator never talks to a socket itself. Commands reach it
//! through its [`CommandMailbox`](hearthgate_controller::CommandMailbox)
//! and status leaves it through a watch channel; these adapters sit on the
//! other end.

pub mod api;
mod error;
mod http;
pub mod mqtt;

pub use api::{ApiState, Discovery};
pub use error::{NetworkError, Result};
pub use http::{HttpBackend, HttpBackendConfig};
pub use mqtt::MqttConfig;
