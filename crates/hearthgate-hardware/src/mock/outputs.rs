//! Mock actuators and output devices. Each one records what it was asked to
//! do so tests can assert on the exact command sequence.

use super::lock;
use crate::{
    error::Result,
    traits::{ActuatorDrive, Buzzer, DisplayPanel, RelayBank},
    types::{BuzzerPattern, DriveCommand},
};
use hearthgate_core::{LightChannelId, constants::LIGHT_CHANNEL_COUNT};
use std::sync::{Arc, Mutex};

/// Mock servo drive.
#[derive(Debug)]
pub struct MockDrive {
    commands: Arc<Mutex<Vec<DriveCommand>>>,
}

impl MockDrive {
    pub fn new() -> (Self, MockDriveHandle) {
        let commands = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                commands: Arc::clone(&commands),
            },
            MockDriveHandle { commands },
        )
    }

    fn record(&self, command: DriveCommand) -> Result<()> {
        lock(&self.commands).push(command);
        Ok(())
    }
}

impl ActuatorDrive for MockDrive {
    fn drive_open(&mut self) -> Result<()> {
        self.record(DriveCommand::Open)
    }

    fn drive_closed(&mut self) -> Result<()> {
        self.record(DriveCommand::Closed)
    }

    fn release(&mut self) -> Result<()> {
        self.record(DriveCommand::Release)
    }
}

/// Handle for inspecting a [`MockDrive`].
#[derive(Debug, Clone)]
pub struct MockDriveHandle {
    commands: Arc<Mutex<Vec<DriveCommand>>>,
}

impl MockDriveHandle {
    /// All commands issued so far, oldest first.
    pub fn commands(&self) -> Vec<DriveCommand> {
        lock(&self.commands).clone()
    }

    pub fn count(&self, command: DriveCommand) -> usize {
        lock(&self.commands).iter().filter(|c| **c == command).count()
    }

    pub fn clear(&self) {
        lock(&self.commands).clear();
    }
}

/// Mock relay board.
#[derive(Debug)]
pub struct MockRelays {
    state: Arc<Mutex<[bool; LIGHT_CHANNEL_COUNT as usize]>>,
}

impl MockRelays {
    pub fn new() -> (Self, MockRelaysHandle) {
        let state = Arc::new(Mutex::new([false; LIGHT_CHANNEL_COUNT as usize]));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockRelaysHandle { state },
        )
    }
}

impl RelayBank for MockRelays {
    fn set(&mut self, channel: LightChannelId, on: bool) -> Result<()> {
        lock(&self.state)[channel.index()] = on;
        Ok(())
    }
}

/// Handle for inspecting a [`MockRelays`].
#[derive(Debug, Clone)]
pub struct MockRelaysHandle {
    state: Arc<Mutex<[bool; LIGHT_CHANNEL_COUNT as usize]>>,
}

impl MockRelaysHandle {
    pub fn is_on(&self, channel: LightChannelId) -> bool {
        lock(&self.state)[channel.index()]
    }
}

/// Mock buzzer. Records patterns instead of blocking for them.
#[derive(Debug)]
pub struct MockBuzzer {
    played: Arc<Mutex<Vec<BuzzerPattern>>>,
}

impl MockBuzzer {
    pub fn new() -> (Self, MockBuzzerHandle) {
        let played = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                played: Arc::clone(&played),
            },
            MockBuzzerHandle { played },
        )
    }
}

impl Buzzer for MockBuzzer {
    fn play(&mut self, pattern: BuzzerPattern) -> Result<()> {
        lock(&self.played).push(pattern);
        Ok(())
    }
}

/// Handle for inspecting a [`MockBuzzer`].
#[derive(Debug, Clone)]
pub struct MockBuzzerHandle {
    played: Arc<Mutex<Vec<BuzzerPattern>>>,
}

impl MockBuzzerHandle {
    pub fn played(&self) -> Vec<BuzzerPattern> {
        lock(&self.played).clone()
    }
}

/// Mock display panel keeping the last rendered frame.
#[derive(Debug)]
pub struct MockDisplay {
    frame: Arc<Mutex<Vec<String>>>,
}

impl MockDisplay {
    pub fn new() -> (Self, MockDisplayHandle) {
        let frame = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                frame: Arc::clone(&frame),
            },
            MockDisplayHandle { frame },
        )
    }
}

impl DisplayPanel for MockDisplay {
    fn render(&mut self, lines: &[String]) -> Result<()> {
        *lock(&self.frame) = lines.to_vec();
        Ok(())
    }
}

/// Handle for inspecting a [`MockDisplay`].
#[derive(Debug, Clone)]
pub struct MockDisplayHandle {
    frame: Arc<Mutex<Vec<String>>>,
}

impl MockDisplayHandle {
    pub fn frame(&self) -> Vec<String> {
        lock(&self.frame).clone()
    }

    /// True if any line of the current frame contains `needle`.
    pub fn shows(&self, needle: &str) -> bool {
        lock(&self.frame).iter().any(|line| line.contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drive_records_sequence() {
        let (mut drive, handle) = MockDrive::new();
        drive.drive_open().unwrap();
        drive.drive_closed().unwrap();
        drive.release().unwrap();
        assert_eq!(
            handle.commands(),
            vec![DriveCommand::Open, DriveCommand::Closed, DriveCommand::Release]
        );
        assert_eq!(handle.count(DriveCommand::Open), 1);
    }

    #[test]
    fn test_relays() {
        let (mut relays, handle) = MockRelays::new();
        let ch2 = LightChannelId::new(2).unwrap();
        relays.set(ch2, true).unwrap();
        assert!(handle.is_on(ch2));
        assert!(!handle.is_on(LightChannelId::new(1).unwrap()));
    }

    #[test]
    fn test_display_frame() {
        let (mut display, handle) = MockDisplay::new();
        display
            .render(&["Access: ALLOWED".to_string()])
            .unwrap();
        assert!(handle.shows("ALLOWED"));
    }
}
