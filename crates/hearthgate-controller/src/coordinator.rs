//! The device coordinator.
//!
//! [`Coordinator::tick`] is the only place device state changes. Each tick
//! runs the same fixed sequence:
//!
//! 1. maintenance: link state, backend probe while offline, registration
//! 2. remote commands, at most one per mailbox slot
//! 3. environment sample (on its own slower interval): climate, gas alarm,
//!    rain cover, automatic lights
//! 4. local inputs: touch pad cycles screens, exit button opens the door
//! 5. time based actuator transitions
//! 6. a freshly scanned badge, through the authorization client
//! 7. display refresh and status publication
//!
//! Because commands run before the scan, a remote `door.close` and a local
//! valid scan in the same tick end with the door re-opening: local presence
//! wins.

use crate::actuator::{ActuatorMachine, Phase, TriggerOutcome};
use crate::auth::{AuthorizationClient, AuthorizationHealth};
use crate::command::{CommandAck, CommandMailbox, CommandRejection, CommandReply};
use crate::display::{ScreenContext, Screens};
use crate::environment::Environment;
use crate::event_log::EventLogForwarder;
use crate::input::{Edge, MajorityTracker, RefractoryTracker};
use crate::lights::LightBank;
use crate::status::{PublishReason, StatusPublisher};
use hearthgate_core::constants::{EVENT_LOG_QUEUE_CAPACITY, FIRMWARE_VERSION};
use hearthgate_core::{DeviceConfig, DeviceId, Result};
use hearthgate_hardware::{BuzzerPattern, Peripherals};
use hearthgate_protocol::{
    ActuatorAction, Backend, BuzzerAction, DeviceRegistration, RemoteCommand, StatusReport,
};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Door events logged through the forwarder.
pub mod door_events {
    pub const OPEN: &str = "DOOR_OPEN";
    pub const OPEN_RFID: &str = "DOOR_OPEN (RFID)";
    pub const CLOSE: &str = "DOOR_CLOSE";
    pub const AUTO_CLOSE: &str = "DOOR_AUTO_CLOSE";
    pub const GAS_ALARM: &str = "GAS_ALARM";
}

/// How the device presents itself to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub device: DeviceId,
    pub name: String,
    pub address: String,
}

impl DeviceIdentity {
    /// `name` defaults to the MAC based display name.
    pub fn new(device: DeviceId, name: Option<String>, address: impl Into<String>) -> Self {
        let name = name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| device.default_display_name());
        Self {
            device,
            name,
            address: address.into(),
        }
    }
}

/// Connectivity flags shared with the transports.
#[derive(Debug, Clone)]
pub struct LinkState {
    network: Arc<AtomicBool>,
    broker: Arc<AtomicBool>,
}

impl Default for LinkState {
    fn default() -> Self {
        Self {
            network: Arc::new(AtomicBool::new(true)),
            broker: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl LinkState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_network_available(&self, available: bool) {
        self.network.store(available, Ordering::Release);
    }

    pub fn network_available(&self) -> bool {
        self.network.load(Ordering::Acquire)
    }

    pub fn set_broker_connected(&self, connected: bool) {
        self.broker.store(connected, Ordering::Release);
    }

    pub fn broker_connected(&self) -> bool {
        self.broker.load(Ordering::Acquire)
    }
}

#[derive(Debug, Default)]
struct Registration {
    registered: Arc<AtomicBool>,
    in_flight: Arc<AtomicBool>,
    last_attempt: Option<Instant>,
}

pub struct Coordinator<B: Backend> {
    config: DeviceConfig,
    identity: DeviceIdentity,
    peripherals: Peripherals,
    backend: Arc<B>,

    door: ActuatorMachine,
    cover: ActuatorMachine,
    touch: MajorityTracker,
    exit_button: RefractoryTracker,
    auth: AuthorizationClient<B>,
    events: EventLogForwarder,
    mailbox: CommandMailbox,
    lights: LightBank,
    environment: Environment,
    screens: Screens,
    status: StatusPublisher,
    link: LinkState,

    registration: Registration,
    booted_at: Instant,
    link_was_connected: bool,
    last_env_sample: Option<Instant>,
    last_backend_check: Instant,
    last_granted_scan: Option<Instant>,
    last_frame: Vec<String>,
    last_frame_at: Option<Instant>,
}

impl<B: Backend> std::fmt::Debug for Coordinator<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("device", &self.identity.device)
            .field("door", &self.door.phase())
            .field("cover", &self.cover.phase())
            .field("online", &self.auth.is_online())
            .finish_non_exhaustive()
    }
}

impl<B: Backend> Coordinator<B> {
    /// Build a coordinator with everything closed, off and optimistically
    /// online. Must be called inside a tokio runtime: the access log worker
    /// is spawned here.
    ///
    /// # Errors
    /// `Error::Config` if `config` does not validate.
    pub fn new(
        config: DeviceConfig,
        identity: DeviceIdentity,
        peripherals: Peripherals,
        backend: Arc<B>,
        now: Instant,
    ) -> Result<Self> {
        config.validate()?;

        let device = identity.device.clone();
        let (events, _worker) = EventLogForwarder::spawn(
            Arc::clone(&backend),
            device.clone(),
            config.log_timeout(),
            EVENT_LOG_QUEUE_CAPACITY,
        );
        let auth = AuthorizationClient::new(
            Arc::clone(&backend),
            device.clone(),
            config.auth_timeout(),
            config.offline_ceiling,
        );

        Ok(Self {
            door: ActuatorMachine::new("door", config.door_hold(), config.door_settle(), now),
            cover: ActuatorMachine::new("cover", config.cover_hold(), config.cover_settle(), now),
            touch: MajorityTracker::new(
                config.touch_samples,
                config.touch_threshold,
                config.touch_window(),
            ),
            exit_button: RefractoryTracker::new(config.button_refractory()),
            auth,
            events,
            mailbox: CommandMailbox::new(),
            lights: LightBank::new(
                config.light_channels,
                config.light_dark_threshold,
                config.light_bright_threshold,
            ),
            environment: Environment::new(),
            screens: Screens::new(config.screen_count),
            status: StatusPublisher::new(StatusReport::boot(device), config.status_interval()),
            link: LinkState::new(),
            registration: Registration::default(),
            booted_at: now,
            link_was_connected: false,
            last_env_sample: None,
            last_backend_check: now,
            last_granted_scan: None,
            last_frame: Vec::new(),
            last_frame_at: None,
            config,
            identity,
            peripherals,
            backend,
        })
    }

    /// Share connectivity flags owned by the caller (the transports).
    #[must_use]
    pub fn with_link(mut self, link: LinkState) -> Self {
        self.link = link;
        self
    }

    pub fn mailbox(&self) -> CommandMailbox {
        self.mailbox.clone()
    }

    pub fn link(&self) -> LinkState {
        self.link.clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<StatusReport> {
        self.status.subscribe()
    }

    pub fn published_count(&self) -> u64 {
        self.status.published()
    }

    pub fn door(&self) -> &ActuatorMachine {
        &self.door
    }

    pub fn cover(&self) -> &ActuatorMachine {
        &self.cover
    }

    pub fn health(&self) -> &AuthorizationHealth {
        self.auth.health()
    }

    pub fn lights(&self) -> &LightBank {
        &self.lights
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn screen(&self) -> u8 {
        self.screens.current()
    }

    pub fn is_registered(&self) -> bool {
        self.registration.registered.load(Ordering::Acquire)
    }

    /// Current state as a status report.
    pub fn snapshot(&self, now: Instant) -> StatusReport {
        StatusReport {
            device_id: self.identity.device.clone(),
            temperature: self.environment.temperature,
            humidity: self.environment.humidity,
            gas: self.environment.gas,
            gas_alert: self.environment.gas_alert,
            rain: self.environment.rain_state(),
            door: self.door.phase().name(),
            cover: self.cover.phase().name(),
            screen: self.screens.current(),
            online: self.auth.is_online(),
            link_connected: self.link.broker_connected(),
            lights: self.lights.status(),
            uptime_ms: now.saturating_duration_since(self.booted_at).as_millis() as u64,
        }
    }

    /// Run one tick.
    pub async fn tick(&mut self, now: Instant) -> Option<PublishReason> {
        self.maintain(now).await;
        self.apply_commands(now);
        if self.env_sample_due(now) {
            self.sample_environment(now);
        }
        self.sample_inputs(now);
        self.advance_actuators(now);
        self.process_scan(now).await;
        self.refresh_display(now);
        self.status.offer(self.snapshot(now), now)
    }

    /// Tick on the configured interval until `shutdown` resolves.
    pub async fn run_until<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut interval = tokio::time::interval(self.config.tick());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(device = %self.identity.device, "Coordinator started");
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = interval.tick() => {
                    self.tick(Instant::now()).await;
                }
            }
        }
        info!(device = %self.identity.device, "Coordinator stopped");
    }

    async fn maintain(&mut self, now: Instant) {
        let connected = self.link.broker_connected();
        if connected != self.link_was_connected {
            if connected {
                info!("Command link connected");
            } else {
                warn!("Command link lost");
            }
            self.link_was_connected = connected;
        }

        if !self.link.network_available() {
            return;
        }

        let check_interval = self.config.backend_check_interval();
        if !self.auth.is_online()
            && now.saturating_duration_since(self.last_backend_check) >= check_interval
        {
            self.last_backend_check = now;
            self.auth.probe().await;
        }

        let retry_due = self
            .registration
            .last_attempt
            .is_none_or(|at| now.saturating_duration_since(at) >= check_interval);
        if !self.is_registered() && retry_due {
            self.registration.last_attempt = Some(now);
            self.start_registration();
        }
    }

    fn start_registration(&self) {
        if self.registration.in_flight.swap(true, Ordering::AcqRel) {
            return;
        }

        let payload = DeviceRegistration {
            mac: self.identity.device.clone(),
            ip: self.identity.address.clone(),
            name: self.identity.name.clone(),
            firmware_version: FIRMWARE_VERSION.to_string(),
        };
        let backend = Arc::clone(&self.backend);
        let timeout = self.config.registration_timeout();
        let registered = Arc::clone(&self.registration.registered);
        let in_flight = Arc::clone(&self.registration.in_flight);

        tokio::spawn(async move {
            match tokio::time::timeout(timeout, backend.register(&payload)).await {
                Ok(Ok(())) => {
                    info!(name = %payload.name, "Device registered");
                    registered.store(true, Ordering::Release);
                }
                Ok(Err(e)) => warn!(error = %e, "Device registration failed, will retry"),
                Err(_) => warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    "Device registration timed out, will retry"
                ),
            }
            in_flight.store(false, Ordering::Release);
        });
    }

    fn apply_commands(&mut self, now: Instant) {
        for pending in self.mailbox.take_all() {
            let command = pending.command;
            let reply = self.apply(command, now);
            match &reply {
                Ok(ack) => {
                    info!(%command, source = ?pending.source, status = ack.status, "Command applied")
                }
                Err(e) => warn!(%command, source = ?pending.source, error = %e, "Command rejected"),
            }
            pending.complete(reply);
        }
    }

    fn apply(&mut self, command: RemoteCommand, now: Instant) -> CommandReply {
        match command {
            RemoteCommand::Door(ActuatorAction::Open) => {
                let outcome = self
                    .door
                    .trigger_open(now, self.peripherals.door.as_mut())
                    .map_err(|e| CommandRejection::Unsupported(e.to_string()))?;
                Ok(match outcome {
                    TriggerOutcome::Opened => {
                        self.events.log_device_event(door_events::OPEN);
                        CommandAck::new("opening")
                    }
                    TriggerOutcome::Extended => CommandAck::new("extended"),
                })
            }
            RemoteCommand::Door(ActuatorAction::Close) => {
                let started = self
                    .door
                    .request_close(now, self.peripherals.door.as_mut())
                    .map_err(|e| CommandRejection::Unsupported(e.to_string()))?;
                if started {
                    self.events.log_device_event(door_events::CLOSE);
                }
                Ok(close_ack(self.door.phase()))
            }
            RemoteCommand::Cover(ActuatorAction::Open) => {
                let outcome = self
                    .cover
                    .trigger_open(now, self.peripherals.cover.as_mut())
                    .map_err(|e| CommandRejection::Unsupported(e.to_string()))?;
                Ok(match outcome {
                    TriggerOutcome::Opened => CommandAck::new("opening"),
                    TriggerOutcome::Extended => CommandAck::new("extended"),
                })
            }
            RemoteCommand::Cover(ActuatorAction::Close) => {
                self.cover
                    .request_close(now, self.peripherals.cover.as_mut())
                    .map_err(|e| CommandRejection::Unsupported(e.to_string()))?;
                Ok(close_ack(self.cover.phase()))
            }
            RemoteCommand::Light { channel, on } => {
                if self.lights.set_manual(channel, on)? {
                    if let Err(e) = self.peripherals.relays.set(channel, on) {
                        warn!(%channel, error = %e, "Relay write failed");
                    }
                }
                Ok(CommandAck::new("relay updated"))
            }
            RemoteCommand::Mode { channel, mode } => {
                if self.lights.set_mode(channel, mode)? {
                    debug!(%channel, %mode, "Light mode changed");
                }
                Ok(CommandAck::new("mode updated"))
            }
            RemoteCommand::Buzzer(action) => {
                let (pattern, status) = match action {
                    BuzzerAction::Beep => (BuzzerPattern::Success, "beeped"),
                    BuzzerAction::Alert => (BuzzerPattern::Alert, "alerted"),
                };
                self.beep(pattern);
                Ok(CommandAck::new(status))
            }
            RemoteCommand::Screen(index) => {
                self.screens.select(index)?;
                Ok(CommandAck::new("screen changed"))
            }
        }
    }

    fn env_sample_due(&self, now: Instant) -> bool {
        self.last_env_sample
            .is_none_or(|at| now.saturating_duration_since(at) >= self.config.env_sample_interval())
    }

    fn sample_environment(&mut self, now: Instant) {
        self.last_env_sample = Some(now);

        let reading = self.peripherals.climate.read();
        self.environment.record_climate(reading);

        let gas = self.peripherals.gas.read_raw();
        if self.environment.record_gas(gas, self.config.gas_alarm_threshold) {
            warn!(gas, threshold = self.config.gas_alarm_threshold, "Gas alarm");
            self.beep(BuzzerPattern::Alert);
            self.events.log_device_event(door_events::GAS_ALARM);
        }

        let raining = !self.peripherals.rain.is_high();
        if raining != self.environment.raining {
            info!(raining, "Rain state changed");
        }
        self.environment.raining = raining;
        if raining {
            if let Err(e) = self.cover.trigger_open(now, self.peripherals.cover.as_mut()) {
                warn!(error = %e, "Rain cover trigger failed");
            }
        }

        let level = self.peripherals.light_level.read_raw();
        self.environment.light_level = level;
        for (channel, on) in self.lights.evaluate(level) {
            debug!(%channel, on, level, "Automatic light switch");
            if let Err(e) = self.peripherals.relays.set(channel, on) {
                warn!(%channel, error = %e, "Relay write failed");
            }
        }
    }

    fn sample_inputs(&mut self, now: Instant) {
        if let Some(Edge::Rising) = self.touch.sample(self.peripherals.touch.as_mut(), now) {
            let screen = self.screens.cycle();
            debug!(screen, "Touch, next screen");
        }

        if let Some(Edge::Rising) = self.exit_button.sample(self.peripherals.exit_button.as_mut(), now) {
            match self.door.trigger_open(now, self.peripherals.door.as_mut()) {
                Ok(TriggerOutcome::Opened) => {
                    info!("Exit button, opening door");
                    self.events.log_device_event(door_events::OPEN);
                }
                Ok(TriggerOutcome::Extended) => debug!("Exit button, door hold extended"),
                Err(e) => warn!(error = %e, "Exit button open failed"),
            }
        }
    }

    fn advance_actuators(&mut self, now: Instant) {
        match self.door.advance(now, self.peripherals.door.as_mut()) {
            Ok(transitions) => {
                if transitions
                    .iter()
                    .any(|t| t.from == Phase::Open && t.to == Phase::Closing)
                {
                    info!("Door hold expired, closing");
                    self.events.log_device_event(door_events::AUTO_CLOSE);
                }
            }
            Err(e) => warn!(error = %e, "Door advance failed"),
        }

        if let Err(e) = self.cover.advance(now, self.peripherals.cover.as_mut()) {
            warn!(error = %e, "Cover advance failed");
        }
    }

    async fn process_scan(&mut self, now: Instant) {
        let card = match self.peripherals.reader.poll_card() {
            Ok(Some(card)) => card,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "Card reader poll failed");
                return;
            }
        };
        let credential = match card.credential() {
            Ok(credential) => credential,
            Err(e) => {
                warn!(error = %e, "Unreadable card");
                return;
            }
        };

        if self
            .last_granted_scan
            .is_some_and(|at| now.saturating_duration_since(at) < self.config.scan_repeat_delay())
        {
            debug!(%credential, "Scan ignored, repeat delay");
            return;
        }

        let outcome = self
            .auth
            .check_authorization(&credential, self.link.network_available())
            .await;
        let until = now + self.config.display_refresh_interval();

        if outcome.is_granted() {
            self.last_granted_scan = Some(now);
            let opened = match self.door.trigger_open(now, self.peripherals.door.as_mut()) {
                Ok(outcome) => outcome == TriggerOutcome::Opened,
                Err(e) => {
                    warn!(error = %e, "Door open failed");
                    false
                }
            };
            self.beep(BuzzerPattern::Success);
            self.screens.show_scan(credential.clone(), true, until);
            self.events.log_event(credential, true);
            if opened {
                self.events.log_device_event(door_events::OPEN_RFID);
            }
        } else {
            self.beep(BuzzerPattern::Failure);
            self.screens.show_scan(credential.clone(), false, until);
            self.events.log_event(credential, false);
        }
    }

    fn refresh_display(&mut self, now: Instant) {
        let ctx = ScreenContext {
            online: self.auth.is_online(),
            link_connected: self.link.broker_connected(),
            environment: &self.environment,
            clock: chrono::Local::now(),
        };
        let frame = self.screens.compose(&ctx, now).lines();

        let refresh_due = self
            .last_frame_at
            .is_none_or(|at| now.saturating_duration_since(at) >= self.config.display_refresh_interval());
        if !refresh_due && frame == self.last_frame.as_slice() {
            return;
        }

        if let Err(e) = self.peripherals.display.render(frame) {
            warn!(error = %e, "Display render failed");
        }
        self.last_frame = frame.to_vec();
        self.last_frame_at = Some(now);
    }

    fn beep(&mut self, pattern: BuzzerPattern) {
        if let Err(e) = self.peripherals.buzzer.play(pattern) {
            warn!(%pattern, error = %e, "Buzzer failed");
        }
    }
}

fn close_ack(phase: Phase) -> CommandAck {
    match phase {
        Phase::Closed => CommandAck::new("closed"),
        _ => CommandAck::new("closing"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device() -> DeviceId {
        DeviceId::new("A4:CF:12:0B:33:9E").unwrap()
    }

    #[test]
    fn test_identity_default_name() {
        let identity = DeviceIdentity::new(device(), None, "192.168.1.40");
        assert_eq!(identity.name, device().default_display_name());

        let identity = DeviceIdentity::new(device(), Some("  ".into()), "192.168.1.40");
        assert_eq!(identity.name, device().default_display_name());

        let identity = DeviceIdentity::new(device(), Some("Front Door".into()), "192.168.1.40");
        assert_eq!(identity.name, "Front Door");
    }

    #[test]
    fn test_link_state_shared() {
        let link = LinkState::new();
        let clone = link.clone();
        assert!(link.network_available());
        assert!(!link.broker_connected());

        clone.set_broker_connected(true);
        clone.set_network_available(false);
        assert!(link.broker_connected());
        assert!(!link.network_available());
    }

    #[test]
    fn test_close_ack() {
        assert_eq!(close_ack(Phase::Closed).status, "closed");
        assert_eq!(close_ack(Phase::Closing).status, "closing");
    }
}
