//! Mock peripheral implementations for testing and simulation.
//!
//! Every mock comes paired with a cloneable handle. The mock is moved into
//! the control loop; the handle stays with the test (or the simulator) to
//! drive inputs and inspect outputs.

pub mod inputs;
pub mod outputs;
pub mod rfid;

pub use inputs::{MockAnalog, MockAnalogHandle, MockClimate, MockClimateHandle, MockPin, MockPinHandle};
pub use outputs::{
    MockBuzzer, MockBuzzerHandle, MockDisplay, MockDisplayHandle, MockDrive, MockDriveHandle,
    MockRelays, MockRelaysHandle,
};
pub use rfid::{MockRfid, MockRfidHandle};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock shared mock state. A panicking test thread must not wedge the others.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
