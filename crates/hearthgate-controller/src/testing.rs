//! In-memory [`Backend`] for tests and the offline simulator.

use hearthgate_core::CredentialId;
use hearthgate_protocol::{
    AccessLogEntry, AuthorizationRequest, AuthorizationResponse, Backend, BackendError,
    DeviceRegistration,
};
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Debug, Default)]
struct State {
    allowed: HashSet<String>,
    unreachable: bool,
    delay: Duration,
    check_calls: usize,
    probe_calls: usize,
    logs: Vec<AccessLogEntry>,
    registrations: Vec<DeviceRegistration>,
}

/// Backend double with a configurable allow-list and failure modes.
///
/// # Examples
///
/// ```
/// use hearthgate_controller::testing::FakeBackend;
/// use hearthgate_core::CredentialId;
///
/// let backend = FakeBackend::new();
/// backend.allow(CredentialId::parse("B1:D7:7F:05").unwrap());
/// backend.set_unreachable(true);
/// assert_eq!(backend.check_calls(), 0);
/// ```
#[derive(Debug, Default)]
pub struct FakeBackend {
    state: Mutex<State>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn allow(&self, credential: CredentialId) {
        self.state().allowed.insert(credential.as_str().to_string());
    }

    pub fn revoke(&self, credential: &CredentialId) {
        self.state().allowed.remove(credential.as_str());
    }

    /// Make every request fail as if the connection were refused.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state().unreachable = unreachable;
    }

    /// Delay every response.
    pub fn set_delay(&self, delay: Duration) {
        self.state().delay = delay;
    }

    pub fn check_calls(&self) -> usize {
        self.state().check_calls
    }

    pub fn probe_calls(&self) -> usize {
        self.state().probe_calls
    }

    pub fn logs(&self) -> Vec<AccessLogEntry> {
        self.state().logs.clone()
    }

    /// Subjects of the recorded log entries, in order.
    pub fn logged_subjects(&self) -> Vec<String> {
        self.state()
            .logs
            .iter()
            .map(|entry| entry.card_uid.as_str().to_string())
            .collect()
    }

    pub fn registrations(&self) -> Vec<DeviceRegistration> {
        self.state().registrations.clone()
    }

    /// Common prologue: apply the delay, then fail if unreachable.
    async fn gate(&self) -> Result<(), BackendError> {
        let delay = self.state().delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.state().unreachable {
            return Err(BackendError::Unreachable("connection refused".into()));
        }
        Ok(())
    }
}

impl Backend for FakeBackend {
    async fn check_card(
        &self,
        request: &AuthorizationRequest,
    ) -> Result<AuthorizationResponse, BackendError> {
        self.state().check_calls += 1;
        self.gate().await?;
        let authorized = self.state().allowed.contains(request.card_uid.as_str());
        Ok(AuthorizationResponse { authorized })
    }

    async fn submit_log(&self, entry: &AccessLogEntry) -> Result<(), BackendError> {
        self.gate().await?;
        self.state().logs.push(entry.clone());
        Ok(())
    }

    async fn register(&self, registration: &DeviceRegistration) -> Result<(), BackendError> {
        self.gate().await?;
        self.state().registrations.push(registration.clone());
        Ok(())
    }

    async fn probe(&self) -> Result<(), BackendError> {
        self.state().probe_calls += 1;
        self.gate().await
    }
}
