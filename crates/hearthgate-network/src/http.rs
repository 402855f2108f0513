//! HTTP backend client.
//!
//! [`HttpBackend`] implements [`Backend`] over plain JSON requests. It is a
//! thin transport:
//! - **One request per call**: no retry, no connection reuse policy beyond
//!   what `reqwest` pools on its own
//! - **Bounded**: every request carries the configured timeout
//! - **Classified errors**: connection failures, timeouts, non-success
//!   statuses and undecodable bodies map onto [`BackendError`]
//!
//! # Example
//!
//! ```no_run
//! use hearthgate_network::{HttpBackend, HttpBackendConfig};
//! use std::time::Duration;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = HttpBackend::new(HttpBackendConfig {
//!     base_url: "http://192.168.1.10:8080".into(),
//!     timeout: Duration::from_millis(3000),
//! })?;
//! assert_eq!(backend.base_url(), "http://192.168.1.10:8080");
//! # Ok(())
//! # }
//! ```

use crate::error::{NetworkError, Result};
use hearthgate_protocol::backend::{
    ACCESS_LOG_PATH, AUTHORIZATION_PATH, PROBE_PATH, REGISTRATION_PATH,
};
use hearthgate_protocol::{
    AccessLogEntry, AuthorizationRequest, AuthorizationResponse, Backend, BackendError,
    DeviceRegistration,
};
use serde::Serialize;
use std::time::Duration;
use tracing::trace;

#[derive(Debug, Clone)]
pub struct HttpBackendConfig {
    /// Scheme, host and port, e.g. `http://192.168.1.10:8080`.
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpBackend {
    /// # Errors
    /// - `InvalidUrl` if `base_url` is not an absolute http(s) URL
    /// - `Client` if the HTTP client cannot be built
    pub fn new(config: HttpBackendConfig) -> Result<Self> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        let parsed = reqwest::Url::parse(&base_url).map_err(|e| NetworkError::InvalidUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(NetworkError::InvalidUrl {
                url: config.base_url,
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url,
            timeout: config.timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn classify(&self, error: reqwest::Error) -> BackendError {
        if error.is_timeout() {
            BackendError::Timeout(self.timeout.as_millis() as u64)
        } else if error.is_decode() {
            BackendError::Malformed(error.to_string())
        } else {
            BackendError::Unreachable(error.to_string())
        }
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> std::result::Result<reqwest::Response, BackendError> {
        trace!(path, "POST");
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status(status.as_u16()));
        }
        Ok(response)
    }
}

impl Backend for HttpBackend {
    async fn check_card(
        &self,
        request: &AuthorizationRequest,
    ) -> std::result::Result<AuthorizationResponse, BackendError> {
        let response = self.post(AUTHORIZATION_PATH, request).await?;
        let body = response.bytes().await.map_err(|e| self.classify(e))?;
        serde_json::from_slice(&body).map_err(|e| BackendError::Malformed(e.to_string()))
    }

    async fn submit_log(&self, entry: &AccessLogEntry) -> std::result::Result<(), BackendError> {
        self.post(ACCESS_LOG_PATH, entry).await.map(drop)
    }

    async fn register(
        &self,
        registration: &DeviceRegistration,
    ) -> std::result::Result<(), BackendError> {
        self.post(REGISTRATION_PATH, registration).await.map(drop)
    }

    /// Any HTTP answer counts as reachable, whatever its status.
    async fn probe(&self) -> std::result::Result<(), BackendError> {
        trace!("GET probe");
        self.client
            .get(self.url(PROBE_PATH))
            .send()
            .await
            .map(drop)
            .map_err(|e| self.classify(e))
    }
}
