//! Effective settings: command line and environment over the provisioning
//! record.

use crate::cli::Cli;
use anyhow::{Context, bail};
use hearthgate_core::{DeviceId, ProvisionedConfig};
use std::net::SocketAddr;

const DEFAULT_MQTT_PORT: u16 = 1883;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub device: DeviceId,
    pub name: Option<String>,
    pub address: String,
    pub backend_url: String,
    /// `None` leaves the MQTT link disabled.
    pub mqtt_host: Option<String>,
    pub mqtt_port: u16,
    pub listen: SocketAddr,
}

impl Settings {
    pub fn resolve(cli: Cli) -> anyhow::Result<Self> {
        let provisioned = match &cli.config {
            Some(path) => Some(
                ProvisionedConfig::load(path)
                    .with_context(|| format!("loading {}", path.display()))?,
            ),
            None => None,
        };
        if let Some(record) = &provisioned
            && !record.provisioned
        {
            tracing::warn!("Provisioning record is not marked as provisioned");
        }

        let device = DeviceId::new(&cli.device_id)
            .with_context(|| format!("device id '{}'", cli.device_id))?;

        let backend_url = match cli
            .backend_url
            .or_else(|| provisioned.as_ref().map(|p| p.backend_url.clone()))
        {
            Some(url) if !url.trim().is_empty() => url,
            _ => bail!("no backend URL: pass --backend-url or a provisioning record"),
        };

        let mqtt_host = cli
            .mqtt_host
            .or_else(|| provisioned.as_ref().map(|p| p.mqtt_host.clone()))
            .filter(|host| !host.trim().is_empty());
        let mqtt_port = cli
            .mqtt_port
            .or_else(|| provisioned.as_ref().map(|p| p.mqtt_port))
            .unwrap_or(DEFAULT_MQTT_PORT);

        Ok(Self {
            device,
            name: provisioned.and_then(|p| p.display_name),
            address: cli.advertise_ip,
            backend_url,
            mqtt_host,
            mqtt_port,
            listen: cli.listen,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use rstest::rstest;
    use std::io::Write;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("hearthgate").chain(args.iter().copied())).unwrap()
    }

    fn record(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_flags_only() {
        let settings = Settings::resolve(parse(&[
            "--backend-url",
            "http://10.0.0.2:8080",
            "--device-id",
            "A4:CF:12:0B:33:9E",
        ]))
        .unwrap();

        assert_eq!(settings.backend_url, "http://10.0.0.2:8080");
        assert_eq!(settings.device.as_str(), "A4:CF:12:0B:33:9E");
        assert_eq!(settings.mqtt_host, None);
        assert_eq!(settings.mqtt_port, 1883);
        assert_eq!(settings.listen, "0.0.0.0:8080".parse().unwrap());
    }

    #[test]
    fn test_record_supplies_missing_values() {
        let file = record(
            r#"{"wifiSsid":"home","backendUrl":"http://10.0.0.2:8080",
                "mqttHost":"broker.local","mqttPort":1884,
                "displayName":"Front door","provisioned":true}"#,
        );
        let path = file.path().to_str().unwrap();

        let settings = Settings::resolve(parse(&["--config", path])).unwrap();
        assert_eq!(settings.backend_url, "http://10.0.0.2:8080");
        assert_eq!(settings.mqtt_host.as_deref(), Some("broker.local"));
        assert_eq!(settings.mqtt_port, 1884);
        assert_eq!(settings.name.as_deref(), Some("Front door"));

        let overridden =
            Settings::resolve(parse(&["--config", path, "--mqtt-port", "8883"])).unwrap();
        assert_eq!(overridden.mqtt_port, 8883);
    }

    #[rstest]
    #[case(&[])]
    #[case(&["--backend-url", "  "])]
    fn test_backend_url_required(#[case] args: &[&str]) {
        assert!(Settings::resolve(parse(args)).is_err());
    }

    #[test]
    fn test_missing_record_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let cli = parse(&["--config", path.to_str().unwrap()]);
        assert!(Settings::resolve(cli).is_err());
    }

    #[test]
    fn test_invalid_device_id() {
        let cli = parse(&["--backend-url", "http://x", "--device-id", "not-a-mac"]);
        assert!(Settings::resolve(cli).is_err());
    }
}
