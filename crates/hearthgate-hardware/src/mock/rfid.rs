//! Mock RFID reader for testing and simulation.
//!
//! Tags are presented through a [`MockRfidHandle`] and picked up by the
//! next [`CredentialReader::poll_card`] on the reader side.

use crate::{
    HardwareError, Result,
    traits::CredentialReader,
    types::CardData,
};
use tokio::sync::mpsc;

/// Mock RFID reader.
///
/// # Examples
///
/// ```
/// use hearthgate_hardware::mock::MockRfid;
/// use hearthgate_hardware::traits::CredentialReader;
///
/// let (mut reader, handle) = MockRfid::new();
/// assert!(reader.poll_card().unwrap().is_none());
///
/// handle.present_card(vec![0xB1, 0xD7, 0x7F, 0x05]).unwrap();
/// let card = reader.poll_card().unwrap().unwrap();
/// assert_eq!(card.credential().unwrap().as_str(), "B1:D7:7F:05");
/// ```
#[derive(Debug)]
pub struct MockRfid {
    event_rx: mpsc::Receiver<CardData>,
}

impl MockRfid {
    /// Create a reader and its control handle.
    pub fn new() -> (Self, MockRfidHandle) {
        let (event_tx, event_rx) = mpsc::channel(32);
        (Self { event_rx }, MockRfidHandle { event_tx })
    }
}

impl CredentialReader for MockRfid {
    fn poll_card(&mut self) -> Result<Option<CardData>> {
        match self.event_rx.try_recv() {
            Ok(card) => Ok(Some(card)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => {
                Err(HardwareError::disconnected("mock RFID reader"))
            }
        }
    }
}

/// Handle for presenting tags to a [`MockRfid`].
#[derive(Debug, Clone)]
pub struct MockRfidHandle {
    event_tx: mpsc::Sender<CardData>,
}

impl MockRfidHandle {
    /// Present a tag to the reader.
    ///
    /// # Errors
    /// - `HardwareError::InvalidData` if the UID is not 4-10 bytes
    /// - `HardwareError::Disconnected` if the reader was dropped
    /// - `HardwareError::Other` if too many tags are waiting to be read
    pub fn present_card(&self, uid: Vec<u8>) -> Result<()> {
        let card = CardData::new(uid)?;
        self.event_tx.try_send(card).map_err(|e| match e {
            mpsc::error::TrySendError::Closed(_) => {
                HardwareError::disconnected("mock RFID reader")
            }
            mpsc::error::TrySendError::Full(_) => HardwareError::other("RFID queue full"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cards_read_in_order() {
        let (mut reader, handle) = MockRfid::new();
        handle.present_card(vec![1, 2, 3, 4]).unwrap();
        handle.present_card(vec![5, 6, 7, 8]).unwrap();

        assert_eq!(reader.poll_card().unwrap().unwrap().uid, vec![1, 2, 3, 4]);
        assert_eq!(reader.poll_card().unwrap().unwrap().uid, vec![5, 6, 7, 8]);
        assert!(reader.poll_card().unwrap().is_none());
    }

    #[test]
    fn test_invalid_uid_rejected() {
        let (_reader, handle) = MockRfid::new();
        assert!(matches!(
            handle.present_card(vec![1, 2]),
            Err(HardwareError::InvalidData { .. })
        ));
    }

    #[test]
    fn test_disconnected_handle() {
        let (mut reader, handle) = MockRfid::new();
        drop(handle);
        assert!(matches!(
            reader.poll_card(),
            Err(HardwareError::Disconnected { .. })
        ));
    }
}
