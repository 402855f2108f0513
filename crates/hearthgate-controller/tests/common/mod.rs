//! Shared rig for coordinator scenarios.

#![allow(dead_code)]

use hearthgate_controller::testing::FakeBackend;
use hearthgate_controller::{Coordinator, DeviceIdentity};
use hearthgate_core::{CredentialId, DeviceConfig, DeviceId};
use hearthgate_hardware::{Peripherals, SimulatedBoard};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const TEST_MAC: &str = "A4:CF:12:0B:33:9E";
pub const CARD_UID: [u8; 4] = [0xB1, 0xD7, 0x7F, 0x05];
pub const CARD_ID: &str = "B1:D7:7F:05";

pub struct Rig {
    pub coordinator: Coordinator<FakeBackend>,
    pub board: SimulatedBoard,
    pub backend: Arc<FakeBackend>,
    pub t0: Instant,
}

impl Rig {
    pub fn at(&self, ms: u64) -> Instant {
        self.t0 + Duration::from_millis(ms)
    }

    /// Tick at `t0 + ms`.
    pub async fn tick_at(&mut self, ms: u64) {
        let now = self.at(ms);
        self.coordinator.tick(now).await;
    }

    pub fn present_card(&self) {
        self.board.reader.present_card(CARD_UID.to_vec()).unwrap();
    }
}

/// Default configuration without the touch sampling spacing, so ticks do
/// not sleep.
pub fn config() -> DeviceConfig {
    DeviceConfig {
        touch_window_ms: 0,
        ..DeviceConfig::default()
    }
}

pub fn card() -> CredentialId {
    CredentialId::parse(CARD_ID).unwrap()
}

/// Build a rig on the simulated board. Must run inside a tokio runtime.
pub fn rig_with(config: DeviceConfig) -> Rig {
    let (peripherals, board) = Peripherals::simulated();
    let backend = Arc::new(FakeBackend::new());
    let identity = DeviceIdentity::new(DeviceId::new(TEST_MAC).unwrap(), None, "192.168.4.20");
    let t0 = Instant::now();
    let coordinator =
        Coordinator::new(config, identity, peripherals, Arc::clone(&backend), t0).unwrap();
    Rig {
        coordinator,
        board,
        backend,
        t0,
    }
}

pub fn rig() -> Rig {
    rig_with(config())
}

/// Poll `condition` while yielding to background tasks.
pub async fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..500 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    condition()
}
