//! Backend request/response shapes and the [`Backend`] capability.
//!
//! ```text
//! POST /api/rfid-cards/check    AuthorizationRequest  -> AuthorizationResponse
//! POST /api/access-logs         AccessLogEntry        -> (ignored)
//! POST /api/devices/register    DeviceRegistration    -> (ignored)
//! GET  /                        health probe
//! ```

use crate::error::BackendError;
use hearthgate_core::{CredentialId, DeviceId};
use serde::{Deserialize, Serialize};
use std::future::Future;

pub const AUTHORIZATION_PATH: &str = "/api/rfid-cards/check";
pub const ACCESS_LOG_PATH: &str = "/api/access-logs";
pub const REGISTRATION_PATH: &str = "/api/devices/register";
pub const PROBE_PATH: &str = "/";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationRequest {
    pub device_mac: DeviceId,
    #[serde(rename = "cardUID")]
    pub card_uid: CredentialId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationResponse {
    pub authorized: bool,
}

/// One access log record. `card_uid` is either a badge credential or a
/// device event tag such as `DOOR_AUTO_CLOSE`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessLogEntry {
    pub device_mac: DeviceId,
    #[serde(rename = "cardUID")]
    pub card_uid: CredentialId,
    pub access_granted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRegistration {
    pub mac: DeviceId,
    pub ip: String,
    pub name: String,
    pub firmware_version: String,
}

/// Request/response capability towards the backend.
///
/// Implementations perform exactly one request per call and never retry;
/// callers bound each call with their own timeout.
pub trait Backend: Send + Sync + 'static {
    /// Ask whether a credential may open this device.
    fn check_card(
        &self,
        request: &AuthorizationRequest,
    ) -> impl Future<Output = Result<AuthorizationResponse, BackendError>> + Send;

    fn submit_log(
        &self,
        entry: &AccessLogEntry,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn register(
        &self,
        registration: &DeviceRegistration,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Cheap reachability check.
    fn probe(&self) -> impl Future<Output = Result<(), BackendError>> + Send;
}
