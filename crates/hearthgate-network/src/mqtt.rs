//! MQTT command and status link.
//!
//! ```text
//!  broker ── cmd/<MAC> ──────────────► decode ──► CommandMailbox
//!  broker ◄─ device/status/<MAC> ───── watch::Receiver<StatusReport>
//!  broker ◄─ .../availability ──────── "online" on connect, "offline" as last will
//! ```
//!
//! The event loop runs in its own task. Every ConnAck re-subscribes to the
//! command topic and re-announces availability, since the broker may have
//! dropped the session. Connection state is mirrored into the shared
//! [`LinkState`] for the coordinator. Commands from MQTT have no reply
//! channel: rejections are only logged.

use hearthgate_controller::{CommandMailbox, CommandSource, LinkState};
use hearthgate_core::DeviceId;
use hearthgate_protocol::topics::{
    AVAILABILITY_OFFLINE, AVAILABILITY_ONLINE, availability_topic, command_topic, status_topic,
};
use hearthgate_protocol::{ProtocolError, RemoteCommand, StatusReport};
use rumqttc::{AsyncClient, Event, LastWill, MqttOptions, Packet, QoS};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub keep_alive: Duration,
    /// Pause after a connection error before polling again.
    pub reconnect_delay: Duration,
}

impl MqttConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            keep_alive: Duration::from_secs(30),
            reconnect_delay: Duration::from_secs(2),
        }
    }
}

/// Broker client id of a device: `hearthgate-` and the bare MAC.
pub fn client_id(device: &DeviceId) -> String {
    format!("hearthgate-{}", device.as_str().replace(':', ""))
}

/// Decode one command payload into the mailbox.
///
/// # Errors
/// The decode error; the payload is dropped.
pub fn handle_command_payload(
    payload: &[u8],
    mailbox: &CommandMailbox,
) -> Result<RemoteCommand, ProtocolError> {
    match RemoteCommand::decode(payload) {
        Ok(command) => {
            let id = mailbox.submit(command, CommandSource::Mqtt);
            debug!(%command, %id, "MQTT command queued");
            Ok(command)
        }
        Err(e) => {
            warn!(error = %e, payload = %String::from_utf8_lossy(payload), "Dropping MQTT command");
            Err(e)
        }
    }
}

/// Start the link task. It ends when the status sender is dropped.
pub fn spawn(
    config: MqttConfig,
    device: DeviceId,
    mailbox: CommandMailbox,
    mut status: watch::Receiver<StatusReport>,
    link: LinkState,
) -> JoinHandle<()> {
    let commands = command_topic(&device);
    let reports = status_topic(&device);
    let availability = availability_topic(&device);

    let mut options = MqttOptions::new(client_id(&device), &config.host, config.port);
    options.set_keep_alive(config.keep_alive);
    options.set_last_will(LastWill::new(
        availability.clone(),
        AVAILABILITY_OFFLINE.as_bytes().to_vec(),
        QoS::AtLeastOnce,
        true,
    ));
    let (client, mut eventloop) = AsyncClient::new(options, 20);

    tokio::spawn(async move {
        info!(host = %config.host, port = config.port, topic = %commands, "MQTT link starting");

        loop {
            tokio::select! {
                event = eventloop.poll() => match event {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!("MQTT connected");
                        link.set_broker_connected(true);

                        if let Err(e) = client.try_subscribe(&commands, QoS::AtLeastOnce) {
                            error!(error = %e, "Re-subscribe to {commands} failed");
                        }
                        if let Err(e) = client.try_publish(
                            &availability,
                            QoS::AtLeastOnce,
                            true,
                            AVAILABILITY_ONLINE.as_bytes().to_vec(),
                        ) {
                            warn!(error = %e, "Availability publish failed");
                        }
                        publish_status(&client, &reports, &status.borrow().clone());
                    }
                    Ok(Event::Incoming(Packet::Publish(p))) => {
                        if p.topic == commands {
                            let _ = handle_command_payload(&p.payload, &mailbox);
                        } else {
                            debug!(topic = %p.topic, "Ignoring publish on unexpected topic");
                        }
                    }
                    Ok(Event::Incoming(Packet::Disconnect)) => {
                        warn!("MQTT disconnected");
                        link.set_broker_connected(false);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        if link.broker_connected() {
                            warn!(error = %e, "MQTT connection lost");
                        } else {
                            debug!(error = %e, "MQTT connect failed");
                        }
                        link.set_broker_connected(false);
                        tokio::time::sleep(config.reconnect_delay).await;
                    }
                },
                changed = status.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let report = status.borrow_and_update().clone();
                    if link.broker_connected() {
                        publish_status(&client, &reports, &report);
                    }
                }
            }
        }

        link.set_broker_connected(false);
        info!("MQTT link stopped");
    })
}

fn publish_status(client: &AsyncClient, topic: &str, report: &StatusReport) {
    let payload = match serde_json::to_vec(report) {
        Ok(payload) => payload,
        Err(e) => {
            error!(error = %e, "Status report serialization failed");
            return;
        }
    };
    if let Err(e) = client.try_publish(topic, QoS::AtMostOnce, false, payload) {
        warn!(error = %e, "Status publish dropped");
    }
}
