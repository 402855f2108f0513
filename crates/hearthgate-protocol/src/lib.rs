//! Wire shapes of the hearthgate controller: remote commands, backend
//! requests, the status report and MQTT topic names.

pub mod backend;
pub mod commands;
pub mod error;
pub mod status;
pub mod topics;

pub use backend::{
    AccessLogEntry, AuthorizationRequest, AuthorizationResponse, Backend, DeviceRegistration,
};
pub use commands::{
    ActuatorAction, BuzzerAction, CommandSlot, LightMode, RemoteCommand, WireCommand,
};
pub use error::{BackendError, ProtocolError, Result};
pub use status::{LightStatus, PhaseName, RainState, StatusReport};
