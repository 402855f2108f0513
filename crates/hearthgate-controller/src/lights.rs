//! Relay light channels.
//!
//! A channel in `Manual` mode follows commands. A channel in `Auto` mode
//! follows the ambient light level with hysteresis and refuses direct
//! commands with a mode conflict. Switching mode never changes the relay by
//! itself; an auto channel picks up its level at the next evaluation.

use crate::command::CommandRejection;
use hearthgate_core::LightChannelId;
use hearthgate_protocol::{LightMode, LightStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LightChannel {
    pub on: bool,
    pub mode: LightMode,
}

#[derive(Debug, Clone)]
pub struct LightBank {
    channels: Vec<LightChannel>,
    dark_threshold: u16,
    bright_threshold: u16,
}

impl LightBank {
    /// `count` channels, all manual and off.
    pub fn new(count: u8, dark_threshold: u16, bright_threshold: u16) -> Self {
        Self {
            channels: vec![LightChannel::default(); usize::from(count)],
            dark_threshold,
            bright_threshold,
        }
    }

    fn get(&self, channel: LightChannelId) -> Result<&LightChannel, CommandRejection> {
        self.channels
            .get(channel.index())
            .ok_or_else(|| CommandRejection::InvalidValue(format!("no light channel {channel}")))
    }

    fn get_mut(&mut self, channel: LightChannelId) -> Result<&mut LightChannel, CommandRejection> {
        self.channels
            .get_mut(channel.index())
            .ok_or_else(|| CommandRejection::InvalidValue(format!("no light channel {channel}")))
    }

    /// # Errors
    /// `InvalidValue` for a channel this board does not have.
    pub fn channel(&self, channel: LightChannelId) -> Result<LightChannel, CommandRejection> {
        self.get(channel).copied()
    }

    /// Direct on/off command. Returns whether the relay must change.
    ///
    /// # Errors
    /// - `ModeConflict` while the channel is in auto mode
    /// - `InvalidValue` for a channel this board does not have
    pub fn set_manual(&mut self, channel: LightChannelId, on: bool) -> Result<bool, CommandRejection> {
        let light = self.get_mut(channel)?;
        if light.mode == LightMode::Auto {
            return Err(CommandRejection::ModeConflict {
                channel: channel.get(),
            });
        }
        let changed = light.on != on;
        light.on = on;
        Ok(changed)
    }

    /// Returns whether the mode changed.
    ///
    /// # Errors
    /// `InvalidValue` for a channel this board does not have.
    pub fn set_mode(&mut self, channel: LightChannelId, mode: LightMode) -> Result<bool, CommandRejection> {
        let light = self.get_mut(channel)?;
        let changed = light.mode != mode;
        light.mode = mode;
        Ok(changed)
    }

    /// Apply the hysteresis policy to every auto channel. Returns the
    /// channels whose relay must change, with their new state.
    pub fn evaluate(&mut self, light_level: u16) -> Vec<(LightChannelId, bool)> {
        let target = if light_level <= self.dark_threshold {
            Some(true)
        } else if light_level >= self.bright_threshold {
            Some(false)
        } else {
            None
        };
        let Some(target) = target else {
            return Vec::new();
        };

        LightChannelId::all()
            .zip(self.channels.iter_mut())
            .filter(|(_, light)| light.mode == LightMode::Auto && light.on != target)
            .map(|(id, light)| {
                light.on = target;
                (id, target)
            })
            .collect()
    }

    pub fn status(&self) -> Vec<LightStatus> {
        LightChannelId::all()
            .zip(self.channels.iter())
            .map(|(channel, light)| LightStatus {
                channel,
                on: light.on,
                mode: light.mode,
            })
            .collect()
    }
}
