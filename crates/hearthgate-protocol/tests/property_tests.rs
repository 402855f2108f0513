//! Property-based tests for command decoding.

mod common;

use proptest::prelude::*;
use hearthgate_protocol::{ProtocolError, RemoteCommand, WireCommand};

fn known_device() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("door"),
        Just("servo"),
        Just("cover"),
        Just("light"),
        Just("relay"),
        Just("mode"),
        Just("buzzer"),
        Just("alarm"),
        Just("screen"),
        Just("display"),
    ]
}

proptest! {
    /// Decoding never panics, whatever the payload.
    #[test]
    fn prop_decode_arbitrary_bytes(payload in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = RemoteCommand::decode(&payload);
    }

    /// Every light channel outside 1-4 is rejected at the boundary.
    #[test]
    fn prop_light_channel_range(channel in any::<u8>(), on in any::<bool>()) {
        let wire = WireCommand {
            device: "light".into(),
            action: if on { "on".into() } else { "off".into() },
            channel: Some(channel),
            value: None,
        };
        let result = RemoteCommand::try_from(wire);
        if (1..=4).contains(&channel) {
            prop_assert!(result.is_ok());
        } else {
            prop_assert!(matches!(result, Err(ProtocolError::InvalidValue(_))));
        }
    }

    /// Device names outside the known set are always UnknownTarget.
    #[test]
    fn prop_unknown_devices(device in "[a-z]{1,12}", action in "[a-z]{1,8}") {
        prop_assume!(![
            "door", "servo", "cover", "light", "relay", "mode", "buzzer", "alarm", "screen", "display",
        ].contains(&device.as_str()));

        let wire = WireCommand { device: device.clone(), action, channel: None, value: None };
        prop_assert_eq!(RemoteCommand::try_from(wire), Err(ProtocolError::UnknownTarget(device)));
    }

    /// Known devices with an unknown action never decode (screen accepts any action).
    #[test]
    fn prop_known_device_unknown_action(device in known_device(), action in "x[a-z]{0,8}") {
        prop_assume!(device != "screen" && device != "display");
        let wire = WireCommand { device: device.into(), action, channel: Some(1), value: Some("auto".into()) };
        let is_unknown_action = matches!(
            RemoteCommand::try_from(wire),
            Err(ProtocolError::UnknownAction { .. })
        );
        prop_assert!(is_unknown_action);
    }
}

#[test]
fn test_canonical_encoding_decodes_to_same_command() {
    for command in common::all_command_kinds() {
        let payload = common::encode(&command);
        assert_eq!(RemoteCommand::decode(&payload).unwrap(), command);
    }
}
