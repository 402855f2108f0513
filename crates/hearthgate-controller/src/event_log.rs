//! Fire-and-forget access event forwarding.
//!
//! [`EventLogForwarder::log_event`] never waits: it drops the entry into a
//! bounded queue drained by a background task. When the queue is full the
//! entry is discarded with a warning. Submission failures are logged and
//! dropped; nothing is retried.

use hearthgate_core::{CredentialId, DeviceId};
use hearthgate_protocol::{AccessLogEntry, Backend};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct EventLogForwarder {
    device: DeviceId,
    tx: mpsc::Sender<AccessLogEntry>,
}

impl EventLogForwarder {
    /// Start the submission task.
    ///
    /// The task ends once every forwarder clone has been dropped.
    pub fn spawn<B: Backend>(
        backend: Arc<B>,
        device: DeviceId,
        timeout: Duration,
        capacity: usize,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let worker = tokio::spawn(run_worker(backend, rx, timeout));
        (Self { device, tx }, worker)
    }

    /// Queue one entry. Returns `false` if it had to be dropped.
    pub fn log_event(&self, subject: CredentialId, granted: bool) -> bool {
        let entry = AccessLogEntry {
            device_mac: self.device.clone(),
            card_uid: subject,
            access_granted: granted,
        };

        match self.tx.try_send(entry) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(entry)) => {
                warn!(subject = %entry.card_uid, "Access log queue full, dropping entry");
                false
            }
            Err(mpsc::error::TrySendError::Closed(entry)) => {
                warn!(subject = %entry.card_uid, "Access log worker gone, dropping entry");
                false
            }
        }
    }

    /// Log a device event such as `DOOR_AUTO_CLOSE`.
    pub fn log_device_event(&self, tag: &str) -> bool {
        self.log_event(CredentialId::event_tag(tag), true)
    }
}

async fn run_worker<B: Backend>(
    backend: Arc<B>,
    mut rx: mpsc::Receiver<AccessLogEntry>,
    timeout: Duration,
) {
    while let Some(entry) = rx.recv().await {
        match tokio::time::timeout(timeout, backend.submit_log(&entry)).await {
            Ok(Ok(())) => {
                debug!(subject = %entry.card_uid, granted = entry.access_granted, "Access log sent");
            }
            Ok(Err(e)) => {
                warn!(subject = %entry.card_uid, error = %e, "Access log failed");
            }
            Err(_) => {
                warn!(subject = %entry.card_uid, timeout_ms = timeout.as_millis() as u64, "Access log timed out");
            }
        }
    }
    debug!("Access log worker stopped");
}
