use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "hearthgate",
    about = "Door, cover and lights controller running on a simulated board",
    version
)]
pub struct Cli {
    /// Provisioning record (JSON) written by the setup flow
    #[arg(long, env = "HEARTHGATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Authorization backend, e.g. http://192.168.1.10:8080
    #[arg(long, env = "HEARTHGATE_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// MQTT broker host; without one the command link stays down
    #[arg(long, env = "HEARTHGATE_MQTT_HOST")]
    pub mqtt_host: Option<String>,

    #[arg(long, env = "HEARTHGATE_MQTT_PORT")]
    pub mqtt_port: Option<u16>,

    /// Local control API address
    #[arg(long, env = "HEARTHGATE_LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Device MAC address
    #[arg(long, env = "HEARTHGATE_DEVICE_ID", default_value = "02:00:00:00:00:01")]
    pub device_id: String,

    /// Address announced to the backend and in discovery
    #[arg(long, env = "HEARTHGATE_ADVERTISE_IP", default_value = "127.0.0.1")]
    pub advertise_ip: String,
}
