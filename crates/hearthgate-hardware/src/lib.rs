//! Peripheral abstraction layer for the hearthgate controller.
//!
//! The control loop never touches a pin directly. It talks to the board
//! through the capability traits in [`traits`], and a board is assembled as
//! a [`Peripherals`] bundle of boxed drivers.
//!
//! # Capabilities
//!
//! | Trait | Used for |
//! |-------|----------|
//! | [`DigitalInput`] | touch pad, exit button, rain sensor |
//! | [`AnalogInput`] | gas sensor, ambient light level |
//! | [`EnvironmentSensor`] | temperature / humidity |
//! | [`ActuatorDrive`] | door servo, rain cover servo |
//! | [`RelayBank`] | light channels |
//! | [`Buzzer`] | audible feedback |
//! | [`CredentialReader`] | RFID tags |
//! | [`DisplayPanel`] | status screens |
//!
//! ```
//! use hearthgate_hardware::traits::{ActuatorDrive, CredentialReader};
//! use hearthgate_hardware::Result;
//!
//! fn open_on_card(reader: &mut dyn CredentialReader, door: &mut dyn ActuatorDrive) -> Result<bool> {
//!     match reader.poll_card()? {
//!         Some(_) => {
//!             door.drive_open()?;
//!             Ok(true)
//!         }
//!         None => Ok(false),
//!     }
//! }
//! ```
//!
//! # Mock Implementations
//!
//! [`mock`] provides a double for every trait, each with a handle for
//! driving inputs and inspecting outputs. [`Peripherals::simulated`] builds
//! a whole board from them.
//!
//! [`DigitalInput`]: traits::DigitalInput
//! [`AnalogInput`]: traits::AnalogInput
//! [`EnvironmentSensor`]: traits::EnvironmentSensor
//! [`ActuatorDrive`]: traits::ActuatorDrive
//! [`RelayBank`]: traits::RelayBank
//! [`Buzzer`]: traits::Buzzer
//! [`CredentialReader`]: traits::CredentialReader
//! [`DisplayPanel`]: traits::DisplayPanel

pub mod error;
pub mod mock;
pub mod peripherals;
pub mod traits;
pub mod types;

pub use error::{HardwareError, Result};
pub use peripherals::{Peripherals, SimulatedBoard};
pub use types::{BuzzerPattern, CardData, DriveCommand, EnvReading};
