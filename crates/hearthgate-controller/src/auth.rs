//! Authorization client and backend health.
//!
//! Each badge scan makes one bounded request to the backend. The outcome is
//! classified into [`AuthOutcome`] and feeds [`AuthorizationHealth`], the
//! rolling online/offline signal shown on the display and in status.
//!
//! # Health rules
//!
//! - The device boots optimistic: online, zero failures.
//! - Any failure (timeout, refused connection, non-200, bad body) counts.
//! - Reaching the ceiling of consecutive failures marks the device offline.
//! - A single well-formed answer resets the count and marks it online.
//!
//! While offline, scans short-circuit to `Unreachable` without a request;
//! the coordinator probes the backend on the check interval to recover.
//! Every `Unreachable` is a denial for the door (fail-closed).

use hearthgate_core::{CredentialId, DeviceId};
use hearthgate_protocol::{AuthorizationRequest, Backend, BackendError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Authorized,
    Denied,
    Unreachable,
}

impl AuthOutcome {
    pub fn is_granted(self) -> bool {
        matches!(self, AuthOutcome::Authorized)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationHealth {
    consecutive_failures: u32,
    is_online: bool,
    ceiling: u32,
}

impl AuthorizationHealth {
    pub fn new(ceiling: u32) -> Self {
        Self {
            consecutive_failures: 0,
            is_online: true,
            ceiling: ceiling.max(1),
        }
    }

    pub fn is_online(&self) -> bool {
        self.is_online
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Returns `true` if this success brought the device back online.
    pub fn record_success(&mut self) -> bool {
        let recovered = !self.is_online;
        self.consecutive_failures = 0;
        self.is_online = true;
        recovered
    }

    /// Returns `true` if this failure took the device offline.
    pub fn record_failure(&mut self) -> bool {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        if self.is_online && self.consecutive_failures >= self.ceiling {
            self.is_online = false;
            return true;
        }
        false
    }
}

pub struct AuthorizationClient<B: Backend> {
    backend: Arc<B>,
    device: DeviceId,
    timeout: Duration,
    health: AuthorizationHealth,
}

impl<B: Backend> AuthorizationClient<B> {
    pub fn new(backend: Arc<B>, device: DeviceId, timeout: Duration, ceiling: u32) -> Self {
        Self {
            backend,
            device,
            timeout,
            health: AuthorizationHealth::new(ceiling),
        }
    }

    pub fn health(&self) -> &AuthorizationHealth {
        &self.health
    }

    pub fn is_online(&self) -> bool {
        self.health.is_online()
    }

    /// Ask the backend whether `credential` may open the door.
    ///
    /// Never retries. Returns `Unreachable` without a request while offline,
    /// and counts a failure without a request when `network_available` is
    /// false.
    pub async fn check_authorization(
        &mut self,
        credential: &CredentialId,
        network_available: bool,
    ) -> AuthOutcome {
        if !self.health.is_online() {
            debug!(credential = %credential, "Backend offline, skipping authorization request");
            return AuthOutcome::Unreachable;
        }
        if !network_available {
            warn!(credential = %credential, "No network, cannot check credential");
            self.fail();
            return AuthOutcome::Unreachable;
        }

        let request = AuthorizationRequest {
            device_mac: self.device.clone(),
            card_uid: credential.clone(),
        };

        let result = match tokio::time::timeout(self.timeout, self.backend.check_card(&request)).await
        {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout(self.timeout.as_millis() as u64)),
        };

        match result {
            Ok(response) => {
                if self.health.record_success() {
                    info!("Backend back online");
                }
                let outcome = if response.authorized {
                    AuthOutcome::Authorized
                } else {
                    AuthOutcome::Denied
                };
                info!(credential = %credential, ?outcome, "Card check");
                outcome
            }
            Err(e) => {
                warn!(credential = %credential, error = %e, "Card check failed");
                self.fail();
                AuthOutcome::Unreachable
            }
        }
    }

    /// Reachability probe used while offline. A successful probe counts as
    /// a well-formed success.
    pub async fn probe(&mut self) -> bool {
        let result = match tokio::time::timeout(self.timeout, self.backend.probe()).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout(self.timeout.as_millis() as u64)),
        };

        match result {
            Ok(()) => {
                if self.health.record_success() {
                    info!("Backend back online");
                }
                true
            }
            Err(e) => {
                debug!(error = %e, "Backend probe failed");
                self.fail();
                false
            }
        }
    }

    fn fail(&mut self) {
        if self.health.record_failure() {
            warn!(
                failures = self.health.consecutive_failures(),
                "Backend marked offline"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBackend;
    use proptest::prelude::*;

    fn device() -> DeviceId {
        DeviceId::new("A4:CF:12:0B:33:9E").unwrap()
    }

    fn card() -> CredentialId {
        CredentialId::parse("B1:D7:7F:05").unwrap()
    }

    fn client(backend: &Arc<FakeBackend>) -> AuthorizationClient<FakeBackend> {
        AuthorizationClient::new(Arc::clone(backend), device(), Duration::from_millis(200), 2)
    }

    #[tokio::test]
    async fn test_authorized_and_denied() {
        let backend = Arc::new(FakeBackend::new());
        let mut auth = client(&backend);

        backend.allow(card());
        assert_eq!(auth.check_authorization(&card(), true).await, AuthOutcome::Authorized);

        let stranger = CredentialId::parse("01:02:03:04").unwrap();
        assert_eq!(auth.check_authorization(&stranger, true).await, AuthOutcome::Denied);
        assert_eq!(backend.check_calls(), 2);
    }

    #[tokio::test]
    async fn test_two_failures_go_offline_then_recover() {
        let backend = Arc::new(FakeBackend::new());
        let mut auth = client(&backend);
        backend.set_unreachable(true);

        assert_eq!(auth.check_authorization(&card(), true).await, AuthOutcome::Unreachable);
        assert!(auth.is_online());
        assert_eq!(auth.check_authorization(&card(), true).await, AuthOutcome::Unreachable);
        assert!(!auth.is_online());

        // Offline: no request is made.
        let calls = backend.check_calls();
        assert_eq!(auth.check_authorization(&card(), true).await, AuthOutcome::Unreachable);
        assert_eq!(backend.check_calls(), calls);

        backend.set_unreachable(false);
        assert!(auth.probe().await);
        assert!(auth.is_online());
        assert_eq!(auth.health().consecutive_failures(), 0);
    }

    #[tokio::test]
    async fn test_timeout_is_unreachable() {
        let backend = Arc::new(FakeBackend::new());
        backend.set_delay(Duration::from_millis(500));
        let mut auth = client(&backend);

        assert_eq!(auth.check_authorization(&card(), true).await, AuthOutcome::Unreachable);
        assert_eq!(auth.health().consecutive_failures(), 1);
    }

    #[tokio::test]
    async fn test_no_network_counts_without_request() {
        let backend = Arc::new(FakeBackend::new());
        let mut auth = client(&backend);

        assert_eq!(auth.check_authorization(&card(), false).await, AuthOutcome::Unreachable);
        assert_eq!(backend.check_calls(), 0);
        assert_eq!(auth.health().consecutive_failures(), 1);
    }

    #[test]
    fn test_health_ceiling_two() {
        let mut health = AuthorizationHealth::new(2);
        assert!(!health.record_failure());
        assert!(health.record_failure());
        assert!(!health.is_online());
        assert!(health.record_success());
        assert!(health.is_online());
        assert_eq!(health.consecutive_failures(), 0);
    }

    proptest! {
        /// Online iff fewer than `ceiling` failures since the last success.
        #[test]
        fn prop_health_tracks_trailing_failures(
            ceiling in 1u32..6,
            results in prop::collection::vec(any::<bool>(), 0..64),
        ) {
            let mut health = AuthorizationHealth::new(ceiling);
            let mut trailing = 0u32;

            for ok in results {
                if ok {
                    health.record_success();
                    trailing = 0;
                } else {
                    health.record_failure();
                    trailing += 1;
                }
                prop_assert_eq!(health.is_online(), trailing < ceiling);
                prop_assert_eq!(health.consecutive_failures(), trailing);
            }
        }
    }
}
