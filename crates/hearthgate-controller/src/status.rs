//! Status publication.
//!
//! The coordinator builds a fresh [`StatusReport`] at the end of every tick
//! and offers it to [`StatusPublisher::offer`]. A report is published when
//! its state differs from the last published one (uptime aside) or when
//! the periodic interval has elapsed. Comparing against the last published
//! report is what makes every state change produce exactly one immediate
//! publish.
//!
//! Publishing means replacing the value of a [`watch`] channel. The MQTT
//! link and the local API read from receivers obtained with
//! [`StatusPublisher::subscribe`].

use hearthgate_protocol::StatusReport;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishReason {
    Changed,
    Periodic,
}

#[derive(Debug)]
pub struct StatusPublisher {
    tx: watch::Sender<StatusReport>,
    interval: Duration,
    last_published_at: Option<Instant>,
    published: u64,
}

impl StatusPublisher {
    pub fn new(initial: StatusReport, interval: Duration) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self {
            tx,
            interval,
            last_published_at: None,
            published: 0,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<StatusReport> {
        self.tx.subscribe()
    }

    /// Latest published report.
    pub fn latest(&self) -> StatusReport {
        self.tx.borrow().clone()
    }

    /// Number of publishes so far.
    pub fn published(&self) -> u64 {
        self.published
    }

    /// Publish `report` if it carries a state change or the interval is due.
    pub fn offer(&mut self, report: StatusReport, now: Instant) -> Option<PublishReason> {
        let reason = if self.last_published_at.is_none() || !self.tx.borrow().same_state(&report) {
            PublishReason::Changed
        } else if self
            .last_published_at
            .is_some_and(|at| now.saturating_duration_since(at) >= self.interval)
        {
            PublishReason::Periodic
        } else {
            return None;
        };

        trace!(?reason, door = %report.door, online = report.online, "Publishing status");
        self.tx.send_replace(report);
        self.last_published_at = Some(now);
        self.published += 1;
        Some(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearthgate_core::DeviceId;
    use hearthgate_protocol::PhaseName;

    fn boot() -> StatusReport {
        StatusReport::boot(DeviceId::new("A4:CF:12:0B:33:9E").unwrap())
    }

    #[test]
    fn test_first_offer_publishes() {
        let mut publisher = StatusPublisher::new(boot(), Duration::from_secs(5));
        assert_eq!(publisher.offer(boot(), Instant::now()), Some(PublishReason::Changed));
        assert_eq!(publisher.published(), 1);
    }

    #[test]
    fn test_change_publishes_exactly_once() {
        let t0 = Instant::now();
        let mut publisher = StatusPublisher::new(boot(), Duration::from_secs(5));
        publisher.offer(boot(), t0);

        let mut opened = boot();
        opened.door = PhaseName::Opening;
        opened.uptime_ms = 10;
        assert_eq!(
            publisher.offer(opened.clone(), t0 + Duration::from_millis(10)),
            Some(PublishReason::Changed)
        );

        opened.uptime_ms = 20;
        assert_eq!(publisher.offer(opened, t0 + Duration::from_millis(20)), None);
        assert_eq!(publisher.published(), 2);
        assert_eq!(publisher.latest().door, PhaseName::Opening);
    }

    #[test]
    fn test_periodic_publish() {
        let t0 = Instant::now();
        let mut publisher = StatusPublisher::new(boot(), Duration::from_secs(5));
        publisher.offer(boot(), t0);

        assert_eq!(publisher.offer(boot(), t0 + Duration::from_secs(4)), None);
        assert_eq!(
            publisher.offer(boot(), t0 + Duration::from_secs(5)),
            Some(PublishReason::Periodic)
        );
    }

    #[tokio::test]
    async fn test_subscribers_see_publishes() {
        let mut publisher = StatusPublisher::new(boot(), Duration::from_secs(5));
        let mut rx = publisher.subscribe();

        let mut report = boot();
        report.screen = 2;
        publisher.offer(report, Instant::now());

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().screen, 2);
    }
}
