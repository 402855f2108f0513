//! Status report published over MQTT and served by `GET /status`.

use crate::commands::LightMode;
use hearthgate_core::{DeviceId, LightChannelId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of an actuator as reported to the outside.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseName {
    #[default]
    Closed,
    Opening,
    Open,
    Closing,
}

impl fmt::Display for PhaseName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            PhaseName::Closed => "closed",
            PhaseName::Opening => "opening",
            PhaseName::Open => "open",
            PhaseName::Closing => "closing",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RainState {
    Detected,
    #[default]
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightStatus {
    pub channel: LightChannelId,
    pub on: bool,
    pub mode: LightMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub device_id: DeviceId,
    /// `None` until the climate sensor has produced a valid reading.
    pub temperature: Option<f32>,
    pub humidity: Option<f32>,
    pub gas: u16,
    pub gas_alert: bool,
    pub rain: RainState,
    pub door: PhaseName,
    pub cover: PhaseName,
    pub screen: u8,
    /// Authorization backend health.
    pub online: bool,
    /// Command link (MQTT) connection state.
    pub link_connected: bool,
    pub lights: Vec<LightStatus>,
    pub uptime_ms: u64,
}

impl StatusReport {
    /// Report of a freshly booted device: everything closed, off and
    /// optimistically online.
    #[must_use]
    pub fn boot(device_id: DeviceId) -> Self {
        Self {
            device_id,
            temperature: None,
            humidity: None,
            gas: 0,
            gas_alert: false,
            rain: RainState::None,
            door: PhaseName::Closed,
            cover: PhaseName::Closed,
            screen: 0,
            online: true,
            link_connected: false,
            lights: LightChannelId::all()
                .map(|channel| LightStatus {
                    channel,
                    on: false,
                    mode: LightMode::Manual,
                })
                .collect(),
            uptime_ms: 0,
        }
    }

    /// Equality ignoring uptime, used to decide whether a state change
    /// happened.
    #[must_use]
    pub fn same_state(&self, other: &StatusReport) -> bool {
        let mut a = self.clone();
        a.uptime_ms = other.uptime_ms;
        a == *other
    }
}
