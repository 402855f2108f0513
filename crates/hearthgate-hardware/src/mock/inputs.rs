//! Mock input pins and sensors.

use super::lock;
use crate::{
    error::{HardwareError, Result},
    traits::{AnalogInput, DigitalInput, EnvironmentSensor},
    types::EnvReading,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Mutex};

/// How long a read waits for the climate sensor to answer.
const CLIMATE_RESPONSE_TIMEOUT_MS: u64 = 250;

#[derive(Debug, Default)]
struct PinState {
    level: bool,
    /// Raw reads served before falling back to `level`, for noise scripts.
    script: VecDeque<bool>,
}

/// Mock digital input.
///
/// # Examples
///
/// ```
/// use hearthgate_hardware::mock::MockPin;
/// use hearthgate_hardware::traits::DigitalInput;
///
/// let (mut pin, handle) = MockPin::new(false);
/// handle.set_level(true);
/// assert!(pin.is_high());
///
/// handle.script([false, true]);
/// assert!(!pin.is_high());
/// assert!(pin.is_high());
/// ```
#[derive(Debug)]
pub struct MockPin {
    state: Arc<Mutex<PinState>>,
}

impl MockPin {
    pub fn new(level: bool) -> (Self, MockPinHandle) {
        let state = Arc::new(Mutex::new(PinState {
            level,
            script: VecDeque::new(),
        }));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockPinHandle { state },
        )
    }
}

impl DigitalInput for MockPin {
    fn is_high(&mut self) -> bool {
        let mut state = lock(&self.state);
        match state.script.pop_front() {
            Some(level) => level,
            None => state.level,
        }
    }
}

/// Handle for driving a [`MockPin`].
#[derive(Debug, Clone)]
pub struct MockPinHandle {
    state: Arc<Mutex<PinState>>,
}

impl MockPinHandle {
    /// Set the steady level returned once any script is exhausted.
    pub fn set_level(&self, level: bool) {
        lock(&self.state).level = level;
    }

    pub fn level(&self) -> bool {
        lock(&self.state).level
    }

    /// Queue raw reads to be served before the steady level.
    pub fn script(&self, reads: impl IntoIterator<Item = bool>) {
        lock(&self.state).script.extend(reads);
    }
}

/// Mock analog input.
#[derive(Debug)]
pub struct MockAnalog {
    value: Arc<AtomicU16>,
}

impl MockAnalog {
    pub fn new(value: u16) -> (Self, MockAnalogHandle) {
        let value = Arc::new(AtomicU16::new(value));
        (
            Self {
                value: Arc::clone(&value),
            },
            MockAnalogHandle { value },
        )
    }
}

impl AnalogInput for MockAnalog {
    fn read_raw(&mut self) -> u16 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Handle for driving a [`MockAnalog`].
#[derive(Debug, Clone)]
pub struct MockAnalogHandle {
    value: Arc<AtomicU16>,
}

impl MockAnalogHandle {
    pub fn set(&self, value: u16) {
        self.value.store(value, Ordering::Relaxed);
    }
}

#[derive(Debug)]
struct ClimateState {
    reading: Option<EnvReading>,
    failing: bool,
}

/// Mock temperature/humidity sensor.
///
/// Times out while no reading is set, as a sensor that never answers
/// does. Fails with a checksum error while failing is switched on.
#[derive(Debug)]
pub struct MockClimate {
    state: Arc<Mutex<ClimateState>>,
}

impl MockClimate {
    pub fn new(reading: Option<EnvReading>) -> (Self, MockClimateHandle) {
        let state = Arc::new(Mutex::new(ClimateState {
            reading,
            failing: false,
        }));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockClimateHandle { state },
        )
    }
}

impl EnvironmentSensor for MockClimate {
    fn read(&mut self) -> Result<EnvReading> {
        let state = lock(&self.state);
        match state.reading {
            None => Err(HardwareError::timeout(CLIMATE_RESPONSE_TIMEOUT_MS)),
            Some(_) if state.failing => Err(HardwareError::checksum("mock climate")),
            Some(reading) => Ok(reading),
        }
    }
}

/// Handle for driving a [`MockClimate`].
#[derive(Debug, Clone)]
pub struct MockClimateHandle {
    state: Arc<Mutex<ClimateState>>,
}

impl MockClimateHandle {
    pub fn set_reading(&self, temperature: f32, humidity: f32) {
        lock(&self.state).reading = Some(EnvReading {
            temperature,
            humidity,
        });
    }

    pub fn set_failing(&self, failing: bool) {
        lock(&self.state).failing = failing;
    }
}
