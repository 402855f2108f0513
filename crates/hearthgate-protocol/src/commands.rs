//! Remote command decoding.
//!
//! Commands arrive as small JSON objects, either on the device's MQTT
//! command topic or in the body of `POST /control`:
//!
//! ```text
//! {"device": "door",  "action": "open"}
//! {"device": "light", "action": "on",  "channel": 2}
//! {"device": "mode",  "action": "set", "channel": 2, "value": "auto"}
//! {"device": "screen","action": "set", "value": 1}
//! ```
//!
//! They are decoded exactly once, at the edge, into the closed
//! [`RemoteCommand`] variant. Anything unrecognised is rejected here and
//! never reaches the coordinator.
//!
//! # Device names
//!
//! | device | aliases | actions |
//! |--------|---------|---------|
//! | `door` | `servo` | `open`, `close` |
//! | `cover` | | `open`, `close` |
//! | `light` | `relay` | `on`, `off` (needs `channel`) |
//! | `mode` | | `set` (needs `channel`, `value` = `auto`/`manual`) |
//! | `buzzer` | `alarm` | `beep`, `alert` |
//! | `screen` | `display` | any (`value` = screen index, default 0) |
//!
//! # Examples
//!
//! ```
//! use hearthgate_protocol::{RemoteCommand, ActuatorAction};
//!
//! let cmd = RemoteCommand::decode(br#"{"device":"servo","action":"open"}"#).unwrap();
//! assert_eq!(cmd, RemoteCommand::Door(ActuatorAction::Open));
//!
//! assert!(RemoteCommand::decode(br#"{"device":"toaster","action":"on"}"#).is_err());
//! ```

use crate::error::{ProtocolError, Result};
use hearthgate_core::LightChannelId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The raw `{device, action, channel?, value?}` shape shared by both
/// command transports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireCommand {
    pub device: String,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActuatorAction {
    Open,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuzzerAction {
    Beep,
    Alert,
}

/// Light channel control mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightMode {
    #[default]
    Manual,
    Auto,
}

impl fmt::Display for LightMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LightMode::Manual => f.write_str("manual"),
            LightMode::Auto => f.write_str("auto"),
        }
    }
}

/// A validated remote command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteCommand {
    Door(ActuatorAction),
    Cover(ActuatorAction),
    Light { channel: LightChannelId, on: bool },
    Mode { channel: LightChannelId, mode: LightMode },
    Buzzer(BuzzerAction),
    Screen(u8),
}

/// Mailbox slot of a command. At most one command per slot is pending at a
/// time; slots are drained in this declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CommandSlot {
    Door,
    Cover,
    Mode(LightChannelId),
    Light(LightChannelId),
    Buzzer,
    Screen,
}

impl RemoteCommand {
    /// Decode a JSON payload.
    ///
    /// # Errors
    /// `ProtocolError::Malformed` for invalid JSON, otherwise whatever
    /// [`RemoteCommand::try_from`] reports.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let wire: WireCommand =
            serde_json::from_slice(payload).map_err(|e| ProtocolError::Malformed(e.to_string()))?;
        Self::try_from(wire)
    }

    #[must_use]
    pub fn slot(&self) -> CommandSlot {
        match self {
            RemoteCommand::Door(_) => CommandSlot::Door,
            RemoteCommand::Cover(_) => CommandSlot::Cover,
            RemoteCommand::Light { channel, .. } => CommandSlot::Light(*channel),
            RemoteCommand::Mode { channel, .. } => CommandSlot::Mode(*channel),
            RemoteCommand::Buzzer(_) => CommandSlot::Buzzer,
            RemoteCommand::Screen(_) => CommandSlot::Screen,
        }
    }

    /// Canonical wire form.
    #[must_use]
    pub fn to_wire(&self) -> WireCommand {
        let (device, action, channel, value) = match *self {
            RemoteCommand::Door(a) => ("door", actuator_str(a), None, None),
            RemoteCommand::Cover(a) => ("cover", actuator_str(a), None, None),
            RemoteCommand::Light { channel, on } => {
                ("light", if on { "on" } else { "off" }, Some(channel.get()), None)
            }
            RemoteCommand::Mode { channel, mode } => (
                "mode",
                "set",
                Some(channel.get()),
                Some(serde_json::Value::from(mode.to_string())),
            ),
            RemoteCommand::Buzzer(BuzzerAction::Beep) => ("buzzer", "beep", None, None),
            RemoteCommand::Buzzer(BuzzerAction::Alert) => ("buzzer", "alert", None, None),
            RemoteCommand::Screen(n) => ("screen", "set", None, Some(serde_json::Value::from(n))),
        };
        WireCommand {
            device: device.to_string(),
            action: action.to_string(),
            channel,
            value,
        }
    }
}

fn actuator_str(action: ActuatorAction) -> &'static str {
    match action {
        ActuatorAction::Open => "open",
        ActuatorAction::Close => "close",
    }
}

fn parse_actuator(wire: &WireCommand) -> Result<ActuatorAction> {
    match wire.action.as_str() {
        "open" => Ok(ActuatorAction::Open),
        "close" => Ok(ActuatorAction::Close),
        _ => Err(unknown_action(wire)),
    }
}

fn unknown_action(wire: &WireCommand) -> ProtocolError {
    ProtocolError::UnknownAction {
        device: wire.device.clone(),
        action: wire.action.clone(),
    }
}

fn channel(wire: &WireCommand) -> Result<LightChannelId> {
    let raw = wire.channel.ok_or(ProtocolError::MissingField("channel"))?;
    LightChannelId::new(raw).map_err(|e| ProtocolError::InvalidValue(e.to_string()))
}

impl TryFrom<WireCommand> for RemoteCommand {
    type Error = ProtocolError;

    fn try_from(wire: WireCommand) -> Result<Self> {
        let device = wire.device.trim().to_ascii_lowercase();
        match device.as_str() {
            "door" | "servo" => Ok(RemoteCommand::Door(parse_actuator(&wire)?)),
            "cover" => Ok(RemoteCommand::Cover(parse_actuator(&wire)?)),
            "light" | "relay" => {
                let on = match wire.action.as_str() {
                    "on" => true,
                    "off" => false,
                    _ => return Err(unknown_action(&wire)),
                };
                Ok(RemoteCommand::Light {
                    channel: channel(&wire)?,
                    on,
                })
            }
            "mode" => {
                if wire.action != "set" {
                    return Err(unknown_action(&wire));
                }
                let value = wire
                    .value
                    .as_ref()
                    .ok_or(ProtocolError::MissingField("value"))?;
                let mode = match value.as_str() {
                    Some("auto") => LightMode::Auto,
                    Some("manual") => LightMode::Manual,
                    _ => {
                        return Err(ProtocolError::InvalidValue(format!(
                            "mode must be 'auto' or 'manual', got {value}"
                        )));
                    }
                };
                Ok(RemoteCommand::Mode {
                    channel: channel(&wire)?,
                    mode,
                })
            }
            "buzzer" | "alarm" => match wire.action.as_str() {
                "beep" => Ok(RemoteCommand::Buzzer(BuzzerAction::Beep)),
                "alert" => Ok(RemoteCommand::Buzzer(BuzzerAction::Alert)),
                _ => Err(unknown_action(&wire)),
            },
            "screen" | "display" => {
                let index = match &wire.value {
                    None => 0,
                    Some(value) => value
                        .as_u64()
                        .and_then(|n| u8::try_from(n).ok())
                        .ok_or_else(|| {
                            ProtocolError::InvalidValue(format!("bad screen index {value}"))
                        })?,
                };
                Ok(RemoteCommand::Screen(index))
            }
            _ => Err(ProtocolError::UnknownTarget(wire.device)),
        }
    }
}

impl fmt::Display for RemoteCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let wire = self.to_wire();
        write!(f, "{}.{}", wire.device, wire.action)?;
        if let Some(channel) = wire.channel {
            write!(f, "[{channel}]")?;
        }
        if let Some(value) = wire.value {
            write!(f, "={value}")?;
        }
        Ok(())
    }
}
