//! Peripheral capability traits.
//!
//! These traits are the contract between the control loop and the board's
//! drivers. They are synchronous on purpose: the loop runs one tick at a
//! time and every call here is either instantaneous (a pin read, a PWM
//! write) or bounded (a buzzer pattern, a sensor frame). Nothing in a tick
//! may wait on I/O except the authorization request.
//!
//! All traits are object-safe and `Send`, so a board is assembled as a set
//! of `Box<dyn Trait>` in [`Peripherals`](crate::Peripherals) and the same
//! loop runs against real drivers or the [`mock`](crate::mock) doubles.

use crate::error::Result;
use crate::types::{BuzzerPattern, CardData, EnvReading};
use hearthgate_core::LightChannelId;

/// A digital input pin.
pub trait DigitalInput: Send {
    /// Current raw level. Reads are cheap and may be repeated for sampling.
    fn is_high(&mut self) -> bool;
}

/// An analog input (12-bit ADC, 0-4095).
pub trait AnalogInput: Send {
    fn read_raw(&mut self) -> u16;
}

/// Temperature/humidity sensor.
pub trait EnvironmentSensor: Send {
    /// # Errors
    /// `HardwareError::ChecksumFailed` on a corrupt frame; callers keep the
    /// previous reading.
    fn read(&mut self) -> Result<EnvReading>;
}

/// Servo (or motor) that moves an actuator between its end positions.
pub trait ActuatorDrive: Send {
    /// Start moving towards the open position.
    fn drive_open(&mut self) -> Result<()>;

    /// Start moving towards the closed position.
    fn drive_closed(&mut self) -> Result<()>;

    /// Stop driving and let the actuator idle.
    fn release(&mut self) -> Result<()>;
}

/// Relay board switching the light channels.
pub trait RelayBank: Send {
    fn set(&mut self, channel: LightChannelId, on: bool) -> Result<()>;
}

/// Piezo buzzer.
pub trait Buzzer: Send {
    /// Play a pattern to completion. Blocks for at most
    /// [`BuzzerPattern::duration`].
    fn play(&mut self, pattern: BuzzerPattern) -> Result<()>;
}

/// RFID credential reader.
pub trait CredentialReader: Send {
    /// Non-blocking poll. Returns `Ok(None)` when no new tag is in the field.
    fn poll_card(&mut self) -> Result<Option<CardData>>;
}

/// Small text display.
pub trait DisplayPanel: Send {
    /// Replace the panel contents with the given lines.
    fn render(&mut self, lines: &[String]) -> Result<()>;
}
