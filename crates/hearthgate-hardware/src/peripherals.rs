//! The board's peripheral set.
//!
//! [`Peripherals`] bundles one boxed driver per pin or bus of the board so
//! the coordinator can own them as a unit. [`Peripherals::simulated`] wires
//! the whole board to mocks and hands back a [`SimulatedBoard`] with every
//! control handle.
//!
//! ```text
//!  inputs                      outputs
//!  ┌──────────────┐            ┌──────────────┐
//!  │ touch pad    │            │ door servo   │
//!  │ exit button  │            │ cover servo  │
//!  │ rain sensor  │──► tick ──►│ relay bank   │
//!  │ gas / light  │            │ buzzer       │
//!  │ climate      │            │ display      │
//!  │ RFID reader  │            └──────────────┘
//!  └──────────────┘
//! ```
//!
//! # Examples
//!
//! ```
//! use hearthgate_hardware::Peripherals;
//!
//! let (peripherals, board) = Peripherals::simulated();
//! board.rain.set_level(false); // active-low: rain detected
//! drop(peripherals);
//! ```

use crate::mock::{
    MockAnalog, MockAnalogHandle, MockBuzzer, MockBuzzerHandle, MockClimate, MockClimateHandle,
    MockDisplay, MockDisplayHandle, MockDrive, MockDriveHandle, MockPin, MockPinHandle,
    MockRelays, MockRelaysHandle, MockRfid, MockRfidHandle,
};
use crate::traits::{
    ActuatorDrive, AnalogInput, Buzzer, CredentialReader, DigitalInput, DisplayPanel,
    EnvironmentSensor, RelayBank,
};

/// All drivers of one board.
pub struct Peripherals {
    /// Capacitive touch pad (active high). Cycles display screens.
    pub touch: Box<dyn DigitalInput>,
    /// Inside exit push-button (active high). Opens the door.
    pub exit_button: Box<dyn DigitalInput>,
    /// Rain sensor digital output (active low).
    pub rain: Box<dyn DigitalInput>,
    pub gas: Box<dyn AnalogInput>,
    /// Ambient light level (higher is brighter).
    pub light_level: Box<dyn AnalogInput>,
    pub climate: Box<dyn EnvironmentSensor>,
    pub door: Box<dyn ActuatorDrive>,
    pub cover: Box<dyn ActuatorDrive>,
    pub relays: Box<dyn RelayBank>,
    pub buzzer: Box<dyn Buzzer>,
    pub reader: Box<dyn CredentialReader>,
    pub display: Box<dyn DisplayPanel>,
}

impl std::fmt::Debug for Peripherals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Peripherals").finish_non_exhaustive()
    }
}

/// Control handles of a simulated board.
#[derive(Debug, Clone)]
pub struct SimulatedBoard {
    pub touch: MockPinHandle,
    pub exit_button: MockPinHandle,
    pub rain: MockPinHandle,
    pub gas: MockAnalogHandle,
    pub light_level: MockAnalogHandle,
    pub climate: MockClimateHandle,
    pub door: MockDriveHandle,
    pub cover: MockDriveHandle,
    pub relays: MockRelaysHandle,
    pub buzzer: MockBuzzerHandle,
    pub reader: MockRfidHandle,
    pub display: MockDisplayHandle,
}

impl Peripherals {
    /// Build a fully mocked board at rest: no touch, button released, dry,
    /// clean air, bright room, climate sensor not yet answering.
    pub fn simulated() -> (Self, SimulatedBoard) {
        let (touch, touch_h) = MockPin::new(false);
        let (exit_button, exit_h) = MockPin::new(false);
        let (rain, rain_h) = MockPin::new(true);
        let (gas, gas_h) = MockAnalog::new(400);
        let (light_level, light_h) = MockAnalog::new(3000);
        let (climate, climate_h) = MockClimate::new(None);
        let (door, door_h) = MockDrive::new();
        let (cover, cover_h) = MockDrive::new();
        let (relays, relays_h) = MockRelays::new();
        let (buzzer, buzzer_h) = MockBuzzer::new();
        let (reader, reader_h) = MockRfid::new();
        let (display, display_h) = MockDisplay::new();

        let peripherals = Self {
            touch: Box::new(touch),
            exit_button: Box::new(exit_button),
            rain: Box::new(rain),
            gas: Box::new(gas),
            light_level: Box::new(light_level),
            climate: Box::new(climate),
            door: Box::new(door),
            cover: Box::new(cover),
            relays: Box::new(relays),
            buzzer: Box::new(buzzer),
            reader: Box::new(reader),
            display: Box::new(display),
        };

        let board = SimulatedBoard {
            touch: touch_h,
            exit_button: exit_h,
            rain: rain_h,
            gas: gas_h,
            light_level: light_h,
            climate: climate_h,
            door: door_h,
            cover: cover_h,
            relays: relays_h,
            buzzer: buzzer_h,
            reader: reader_h,
            display: display_h,
        };

        (peripherals, board)
    }
}
