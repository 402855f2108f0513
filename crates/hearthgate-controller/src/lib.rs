//! Hearthgate device core.
//!
//! Everything that decides what the device does lives here and is driven by
//! a single owner, the [`Coordinator`], once per tick:
//!
//! - [`input`]: majority-vote and refractory debouncing of digital inputs
//! - [`actuator`]: the `Closed → Opening → Open → Closing` machine for the
//!   door and the rain cover
//! - [`auth`]: the authorization client and its online/offline health
//! - [`event_log`]: fire-and-forget access log forwarding
//! - [`command`]: the remote command mailbox
//! - [`lights`], [`environment`], [`display`]: policies and screens
//! - [`status`]: status report publication
//!
//! Peripherals come from `hearthgate-hardware`, the backend is anything
//! implementing [`hearthgate_protocol::Backend`].

pub mod actuator;
pub mod auth;
pub mod command;
pub mod coordinator;
pub mod display;
pub mod environment;
pub mod event_log;
pub mod input;
pub mod lights;
pub mod status;
pub mod testing;

pub use actuator::{ActuatorMachine, Phase, PhaseTransition, TriggerOutcome};
pub use auth::{AuthOutcome, AuthorizationClient, AuthorizationHealth};
pub use command::{
    CommandAck, CommandMailbox, CommandRejection, CommandReply, CommandSource, PendingCommand,
};
pub use coordinator::{Coordinator, DeviceIdentity, LinkState};
pub use event_log::EventLogForwarder;
pub use status::{PublishReason, StatusPublisher};
