//! Shared helpers for protocol integration tests.

#![allow(dead_code)]

use hearthgate_core::LightChannelId;
use hearthgate_protocol::{ActuatorAction, BuzzerAction, LightMode, RemoteCommand};

pub const TEST_MAC: &str = "A4:CF:12:0B:33:9E";

pub fn channel(n: u8) -> LightChannelId {
    LightChannelId::new(n).unwrap()
}

/// One representative of every command variant.
pub fn all_command_kinds() -> Vec<RemoteCommand> {
    vec![
        RemoteCommand::Door(ActuatorAction::Open),
        RemoteCommand::Door(ActuatorAction::Close),
        RemoteCommand::Cover(ActuatorAction::Open),
        RemoteCommand::Cover(ActuatorAction::Close),
        RemoteCommand::Light {
            channel: channel(1),
            on: true,
        },
        RemoteCommand::Mode {
            channel: channel(4),
            mode: LightMode::Auto,
        },
        RemoteCommand::Buzzer(BuzzerAction::Beep),
        RemoteCommand::Buzzer(BuzzerAction::Alert),
        RemoteCommand::Screen(2),
    ]
}

/// Encode a command the way the backend publishes it.
pub fn encode(command: &RemoteCommand) -> Vec<u8> {
    serde_json::to_vec(&command.to_wire()).unwrap()
}
