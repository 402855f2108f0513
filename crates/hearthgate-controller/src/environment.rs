//! Environmental readings and the policies derived from them.
//!
//! A failed climate read never overwrites a good one: the previous valid
//! temperature and humidity are kept, and stay `None` until the sensor has
//! answered once.

use hearthgate_hardware::{EnvReading, HardwareError};
use hearthgate_protocol::RainState;
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    pub temperature: Option<f32>,
    pub humidity: Option<f32>,
    pub gas: u16,
    pub gas_alert: bool,
    pub raining: bool,
    pub light_level: u16,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rain_state(&self) -> RainState {
        if self.raining {
            RainState::Detected
        } else {
            RainState::None
        }
    }

    /// Record a climate read. Returns `true` if a valid reading was stored.
    pub fn record_climate(&mut self, reading: Result<EnvReading, HardwareError>) -> bool {
        match reading {
            Ok(r) if !r.temperature.is_nan() && !r.humidity.is_nan() => {
                self.temperature = Some(r.temperature);
                self.humidity = Some(r.humidity);
                true
            }
            Ok(_) => {
                warn!("Climate sensor returned NaN, keeping previous reading");
                false
            }
            Err(e) => {
                warn!(error = %e, "Climate sensor read failed, keeping previous reading");
                false
            }
        }
    }

    /// Record a gas reading. Returns `true` on the rising edge of the alarm.
    pub fn record_gas(&mut self, raw: u16, threshold: u16) -> bool {
        self.gas = raw;
        let alert = raw > threshold;
        let rising = alert && !self.gas_alert;
        self.gas_alert = alert;
        rising
    }
}
