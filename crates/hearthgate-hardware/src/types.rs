//! Value types exchanged with peripherals.

use crate::error::{HardwareError, Result};
use hearthgate_core::CredentialId;
use hearthgate_core::constants::{MAX_UID_LENGTH, MIN_UID_LENGTH};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// One valid temperature/humidity sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvReading {
    /// Degrees Celsius.
    pub temperature: f32,
    /// Relative humidity, percent.
    pub humidity: f32,
}

impl EnvReading {
    /// # Errors
    /// Returns `HardwareError::ChecksumFailed` if either value is NaN, which
    /// is how the sensor library reports a bad frame.
    pub fn new(temperature: f32, humidity: f32) -> Result<Self> {
        if temperature.is_nan() || humidity.is_nan() {
            return Err(HardwareError::checksum("climate sensor"));
        }
        Ok(Self {
            temperature,
            humidity,
        })
    }
}

/// Audible feedback patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuzzerPattern {
    /// Two short pulses.
    Success,
    /// One long pulse.
    Failure,
    /// Alarm; sounds like `Failure`.
    Alert,
}

impl BuzzerPattern {
    /// `(on, off)` pulse pairs making up the pattern.
    #[must_use]
    pub fn pulses(self) -> &'static [(Duration, Duration)] {
        const SHORT: Duration = Duration::from_millis(80);
        const LONG: Duration = Duration::from_millis(300);
        const GAP: Duration = Duration::from_millis(80);
        match self {
            BuzzerPattern::Success => &[(SHORT, GAP), (SHORT, Duration::ZERO)],
            BuzzerPattern::Failure | BuzzerPattern::Alert => &[(LONG, Duration::ZERO)],
        }
    }

    /// Total time the pattern blocks for.
    #[must_use]
    pub fn duration(self) -> Duration {
        self.pulses().iter().map(|(on, off)| *on + *off).sum()
    }
}

impl fmt::Display for BuzzerPattern {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            BuzzerPattern::Success => "success",
            BuzzerPattern::Failure => "failure",
            BuzzerPattern::Alert => "alert",
        };
        f.write_str(name)
    }
}

/// Physical drive command issued to an actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriveCommand {
    Open,
    Closed,
    /// Detach the PWM signal so the servo idles.
    Release,
}

/// A tag read by the credential reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardData {
    /// Tag UID (4-10 bytes).
    pub uid: Vec<u8>,

    /// When the tag was read.
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl CardData {
    /// # Errors
    /// Returns `HardwareError::InvalidData` if the UID is not 4-10 bytes.
    pub fn new(uid: Vec<u8>) -> Result<Self> {
        Self::with_timestamp(uid, chrono::Utc::now())
    }

    /// # Errors
    /// Returns `HardwareError::InvalidData` if the UID is not 4-10 bytes.
    pub fn with_timestamp(uid: Vec<u8>, timestamp: chrono::DateTime<chrono::Utc>) -> Result<Self> {
        if !(MIN_UID_LENGTH..=MAX_UID_LENGTH).contains(&uid.len()) {
            return Err(HardwareError::invalid_data(format!(
                "UID length must be {MIN_UID_LENGTH}-{MAX_UID_LENGTH} bytes, got {}",
                uid.len()
            )));
        }
        Ok(Self { uid, timestamp })
    }

    /// The credential this tag presents.
    ///
    /// # Errors
    /// Returns `HardwareError::InvalidData` if the UID cannot form a
    /// credential; a `CardData` built through [`CardData::new`] always can.
    pub fn credential(&self) -> Result<CredentialId> {
        CredentialId::from_uid(&self.uid).map_err(|e| HardwareError::invalid_data(e.to_string()))
    }
}
