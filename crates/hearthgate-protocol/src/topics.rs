//! MQTT topic naming.

use hearthgate_core::DeviceId;

/// Commands for this device.
pub fn command_topic(device: &DeviceId) -> String {
    format!("cmd/{device}")
}

/// Status reports from this device.
pub fn status_topic(device: &DeviceId) -> String {
    format!("device/status/{device}")
}

/// Retained availability flag; carries the last-will.
pub fn availability_topic(device: &DeviceId) -> String {
    format!("device/status/{device}/availability")
}

pub const AVAILABILITY_ONLINE: &str = "online";
pub const AVAILABILITY_OFFLINE: &str = "offline";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topics() {
        let id = DeviceId::new("A4:CF:12:0B:33:9E").unwrap();
        assert_eq!(command_topic(&id), "cmd/A4:CF:12:0B:33:9E");
        assert_eq!(status_topic(&id), "device/status/A4:CF:12:0B:33:9E");
        assert_eq!(
            availability_topic(&id),
            "device/status/A4:CF:12:0B:33:9E/availability"
        );
    }
}
