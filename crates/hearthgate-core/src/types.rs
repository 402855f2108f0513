use crate::{
    Result,
    constants::{LIGHT_CHANNEL_COUNT, MAX_UID_LENGTH, MIN_UID_LENGTH},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// Device identifier: the station MAC address, upper-case, colon separated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

impl DeviceId {
    /// Create a device ID from a MAC address string.
    ///
    /// The value is trimmed and upper-cased before validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidDeviceId` unless the value is six colon
    /// separated hex octets.
    pub fn new(mac: &str) -> Result<Self> {
        let mac = mac.trim().to_uppercase();
        let octets: Vec<&str> = mac.split(':').collect();

        let well_formed = octets.len() == 6
            && octets
                .iter()
                .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()));

        if !well_formed {
            return Err(Error::InvalidDeviceId(format!(
                "expected six hex octets, got '{mac}'"
            )));
        }

        Ok(DeviceId(mac))
    }

    /// Build a device ID from raw MAC bytes.
    #[must_use]
    pub fn from_bytes(mac: [u8; 6]) -> Self {
        DeviceId(
            mac.iter()
                .map(|b| format!("{b:02X}"))
                .collect::<Vec<_>>()
                .join(":"),
        )
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Default display name announced at registration: `ESP32-` followed by
    /// the last eight characters of the MAC.
    #[must_use]
    pub fn default_display_name(&self) -> String {
        let tail = &self.0[self.0.len().saturating_sub(8)..];
        format!("ESP32-{tail}")
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for DeviceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DeviceId::new(s)
    }
}

impl TryFrom<String> for DeviceId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        DeviceId::new(&value)
    }
}

impl From<DeviceId> for String {
    fn from(id: DeviceId) -> Self {
        id.0
    }
}

/// Credential identifier read from a badge: the tag UID as upper-case,
/// colon separated hex (`B1:D7:7F:05`).
///
/// # Security
/// Equality is constant-time so that comparing credentials does not leak
/// the position of the first differing byte.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct CredentialId(String);

impl CredentialId {
    /// Build a credential from raw UID bytes.
    ///
    /// # Errors
    /// Returns `Error::InvalidCredential` if the UID is not 4-10 bytes long.
    pub fn from_uid(uid: &[u8]) -> Result<Self> {
        if !(MIN_UID_LENGTH..=MAX_UID_LENGTH).contains(&uid.len()) {
            return Err(Error::InvalidCredential(format!(
                "UID must be {MIN_UID_LENGTH}-{MAX_UID_LENGTH} bytes, got {}",
                uid.len()
            )));
        }

        Ok(CredentialId(
            uid.iter()
                .map(|b| format!("{b:02X}"))
                .collect::<Vec<_>>()
                .join(":"),
        ))
    }

    /// Parse a credential from its textual form.
    ///
    /// # Errors
    /// Returns `Error::InvalidCredential` for non-hex octets or a bad length.
    pub fn parse(text: &str) -> Result<Self> {
        let bytes = text
            .trim()
            .split(':')
            .map(|octet| {
                u8::from_str_radix(octet, 16)
                    .map_err(|_| Error::InvalidCredential(format!("bad octet '{octet}'")))
            })
            .collect::<Result<Vec<u8>>>()?;
        Self::from_uid(&bytes)
    }

    /// Pseudo-credential used to tag device events (door/gas) in the
    /// access log. Not a badge; never sent for authorization.
    #[must_use]
    pub fn event_tag(tag: &str) -> Self {
        CredentialId(tag.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq for CredentialId {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl std::hash::Hash for CredentialId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

/// Relay light channel number (1-based, as printed on the relay board).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct LightChannelId(u8);

impl LightChannelId {
    /// # Errors
    /// Returns `Error::InvalidChannel` outside `1..=LIGHT_CHANNEL_COUNT`.
    pub fn new(channel: u8) -> Result<Self> {
        if !(1..=LIGHT_CHANNEL_COUNT).contains(&channel) {
            return Err(Error::InvalidChannel {
                channel,
                max: LIGHT_CHANNEL_COUNT,
            });
        }
        Ok(LightChannelId(channel))
    }

    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }

    /// Zero-based index into channel arrays.
    #[must_use]
    pub fn index(self) -> usize {
        usize::from(self.0 - 1)
    }

    /// All channels in order.
    pub fn all() -> impl Iterator<Item = LightChannelId> {
        (1..=LIGHT_CHANNEL_COUNT).map(LightChannelId)
    }
}

impl fmt::Display for LightChannelId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for LightChannelId {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        LightChannelId::new(value)
    }
}

impl From<LightChannelId> for u8 {
    fn from(id: LightChannelId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("a4:cf:12:0b:33:9e", "A4:CF:12:0B:33:9E")]
    #[case(" 00:11:22:33:44:55 ", "00:11:22:33:44:55")]
    fn test_device_id_valid(#[case] input: &str, #[case] expected: &str) {
        let id: DeviceId = input.parse().unwrap();
        assert_eq!(id.as_str(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("A4:CF:12:0B:33")]
    #[case("A4:CF:12:0B:33:ZZ")]
    #[case("A4CF120B339E")]
    fn test_device_id_invalid(#[case] input: &str) {
        assert!(DeviceId::new(input).is_err());
    }

    #[test]
    fn test_device_id_from_bytes_and_name() {
        let id = DeviceId::from_bytes([0xA4, 0xCF, 0x12, 0x0B, 0x33, 0x9E]);
        assert_eq!(id.as_str(), "A4:CF:12:0B:33:9E");
        assert_eq!(id.default_display_name(), "ESP32-0B:33:9E");
    }

    #[test]
    fn test_credential_from_uid() {
        let cred = CredentialId::from_uid(&[0xB1, 0xD7, 0x7F, 0x05]).unwrap();
        assert_eq!(cred.as_str(), "B1:D7:7F:05");
        assert_eq!(CredentialId::parse("b1:d7:7f:05").unwrap(), cred);
    }

    #[rstest]
    #[case(&[0x01, 0x02, 0x03])]
    #[case(&[0u8; 11])]
    fn test_credential_bad_length(#[case] uid: &[u8]) {
        assert!(CredentialId::from_uid(uid).is_err());
    }

    #[test]
    fn test_credential_parse_rejects_garbage() {
        assert!(CredentialId::parse("B1:D7:XX:05").is_err());
    }

    #[rstest]
    #[case(1, true)]
    #[case(4, true)]
    #[case(0, false)]
    #[case(5, false)]
    fn test_light_channel_range(#[case] channel: u8, #[case] valid: bool) {
        assert_eq!(LightChannelId::new(channel).is_ok(), valid);
    }

    #[test]
    fn test_light_channel_index_and_all() {
        assert_eq!(LightChannelId::new(1).unwrap().index(), 0);
        assert_eq!(LightChannelId::all().count(), usize::from(LIGHT_CHANNEL_COUNT));
    }
}
