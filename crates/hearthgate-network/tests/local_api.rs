//! Local control API against a running coordinator on the simulated board.

use hearthgate_controller::testing::FakeBackend;
use hearthgate_controller::{CommandMailbox, Coordinator, DeviceIdentity};
use hearthgate_core::{DeviceConfig, DeviceId};
use hearthgate_hardware::Peripherals;
use hearthgate_network::api::{self, ApiState, Discovery};
use hearthgate_protocol::StatusReport;
use reqwest::StatusCode;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{oneshot, watch};

const MAC: &str = "A4:CF:12:0B:33:9E";

struct Api {
    addr: SocketAddr,
    http: reqwest::Client,
    _stop: Option<oneshot::Sender<()>>,
}

impl Api {
    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn control(&self, body: &str) -> (StatusCode, Value) {
        let response = self
            .http
            .post(self.url("/control"))
            .header("content-type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .unwrap();
        let status = response.status();
        (status, response.json().await.unwrap())
    }
}

fn identity() -> DeviceIdentity {
    DeviceIdentity::new(DeviceId::new(MAC).unwrap(), None, "192.168.4.20")
}

async fn serve(
    mailbox: CommandMailbox,
    status: watch::Receiver<StatusReport>,
    reply_timeout: Duration,
) -> SocketAddr {
    let state = ApiState {
        mailbox,
        status,
        discovery: Discovery::from(&identity()),
        reply_timeout,
    };
    let listener = api::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(api::serve(listener, api::router(state), std::future::pending()));
    addr
}

/// API in front of a coordinator ticking in the background.
async fn running() -> Api {
    let (peripherals, _board) = Peripherals::simulated();
    let config = DeviceConfig {
        touch_window_ms: 0,
        ..DeviceConfig::default()
    };
    let coordinator = Coordinator::new(
        config,
        identity(),
        peripherals,
        Arc::new(FakeBackend::new()),
        Instant::now(),
    )
    .unwrap();

    let addr = serve(
        coordinator.mailbox(),
        coordinator.subscribe_status(),
        api::DEFAULT_REPLY_TIMEOUT,
    )
    .await;

    let (stop, stopped) = oneshot::channel::<()>();
    tokio::spawn(coordinator.run_until(async {
        let _ = stopped.await;
    }));

    Api {
        addr,
        http: reqwest::Client::new(),
        _stop: Some(stop),
    }
}

#[tokio::test]
async fn test_door_open_reports_outcome() {
    let api = running().await;

    let (status, body) = api.control(r#"{"device":"door","action":"open"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "opening");

    let (status, body) = api.control(r#"{"device":"servo","action":"open"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "extended");
}

#[tokio::test]
async fn test_undecodable_command_is_bad_request() {
    let api = running().await;

    let (status, body) = api.control(r#"{"device":"toaster","action":"on"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("toaster"));

    let (status, _) = api.control("{").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rejected_command_is_bad_request() {
    let api = running().await;

    let (status, body) = api.control(r#"{"device":"screen","action":"set","value":9}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = api.control(r#"{"device":"screen","action":"set","value":2}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "screen changed");
}

#[tokio::test]
async fn test_status_and_discovery() {
    let api = running().await;
    api.control(r#"{"device":"door","action":"open"}"#).await;

    let status: Value = api
        .http
        .get(api.url("/status"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["deviceId"], MAC);
    assert!(matches!(status["door"].as_str(), Some("opening" | "open")));
    assert_eq!(status["cover"], "closed");

    let discovery: Value = api
        .http
        .get(api.url("/scan"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(discovery["id"], MAC);
    assert_eq!(discovery["type"], "Hub");
    assert_eq!(discovery["ip"], "192.168.4.20");
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let api = running().await;

    let response = api
        .http
        .get(api.url("/scan"))
        .header("origin", "http://phone.local")
        .send()
        .await
        .unwrap();
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "*"
    );
}

#[tokio::test]
async fn test_no_coordinator_is_unavailable() {
    let mailbox = CommandMailbox::new();
    let (_tx, status) = watch::channel(StatusReport::boot(DeviceId::new(MAC).unwrap()));
    let addr = serve(mailbox.clone(), status, Duration::from_millis(100)).await;

    let api = Api {
        addr,
        http: reqwest::Client::new(),
        _stop: None,
    };
    let (status, body) = api.control(r#"{"device":"door","action":"close"}"#).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].is_string());
    assert_eq!(mailbox.len(), 1);
}
