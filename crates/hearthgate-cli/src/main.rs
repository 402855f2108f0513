//! `hearthgate`: runs the device controller on a simulated board, talking
//! to a real backend, MQTT broker and local clients.

mod cli;
mod settings;

use anyhow::Context;
use clap::Parser;
use cli::Cli;
use hearthgate_controller::{Coordinator, DeviceIdentity, LinkState};
use hearthgate_core::DeviceConfig;
use hearthgate_core::constants::DEFAULT_AUTH_TIMEOUT_MS;
use hearthgate_hardware::Peripherals;
use hearthgate_network::api::{self, ApiState, DEFAULT_REPLY_TIMEOUT, Discovery};
use hearthgate_network::{HttpBackend, HttpBackendConfig, MqttConfig, mqtt};
use settings::Settings;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let settings = Settings::resolve(Cli::parse())?;
    info!(
        device = %settings.device,
        backend = %settings.backend_url,
        version = hearthgate_core::VERSION,
        "Starting hearthgate"
    );

    let backend = HttpBackend::new(HttpBackendConfig {
        base_url: settings.backend_url.clone(),
        timeout: Duration::from_millis(DEFAULT_AUTH_TIMEOUT_MS),
    })
    .context("backend client")?;

    let (peripherals, board) = Peripherals::simulated();
    board.climate.set_reading(21.5, 45.0);

    let identity = DeviceIdentity::new(
        settings.device.clone(),
        settings.name.clone(),
        settings.address.clone(),
    );
    let link = LinkState::new();
    let coordinator = Coordinator::new(
        DeviceConfig::default(),
        identity.clone(),
        peripherals,
        Arc::new(backend),
        Instant::now(),
    )?
    .with_link(link.clone());

    let mqtt_link = match &settings.mqtt_host {
        Some(host) => Some(mqtt::spawn(
            MqttConfig::new(host.clone(), settings.mqtt_port),
            settings.device.clone(),
            coordinator.mailbox(),
            coordinator.subscribe_status(),
            link,
        )),
        None => {
            warn!("No MQTT broker configured, remote commands only via the local API");
            None
        }
    };

    let (stop_tx, mut stop_rx) = watch::channel(false);
    let listener = api::bind(settings.listen).await?;
    let api_state = ApiState {
        mailbox: coordinator.mailbox(),
        status: coordinator.subscribe_status(),
        discovery: Discovery::from(&identity),
        reply_timeout: DEFAULT_REPLY_TIMEOUT,
    };
    let server = tokio::spawn(api::serve(listener, api::router(api_state), async move {
        let _ = stop_rx.changed().await;
    }));

    coordinator
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Cannot listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await;

    let _ = stop_tx.send(true);
    server.await.context("local API task")??;
    if let Some(handle) = mqtt_link {
        handle.await.context("MQTT task")?;
    }
    info!("Shutdown complete");
    Ok(())
}
