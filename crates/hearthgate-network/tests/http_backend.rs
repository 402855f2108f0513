//! HttpBackend against an in-process backend.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use hearthgate_core::{CredentialId, DeviceId};
use hearthgate_network::{HttpBackend, HttpBackendConfig};
use hearthgate_protocol::{
    AccessLogEntry, AuthorizationRequest, AuthorizationResponse, Backend, BackendError,
    DeviceRegistration,
};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const MAC: &str = "A4:CF:12:0B:33:9E";
const ALLOWED: &str = "B1:D7:7F:05";

#[derive(Clone, Default)]
struct Recorded {
    logs: Arc<Mutex<Vec<AccessLogEntry>>>,
    registrations: Arc<Mutex<Vec<DeviceRegistration>>>,
}

async fn check(Json(request): Json<AuthorizationRequest>) -> Json<AuthorizationResponse> {
    Json(AuthorizationResponse {
        authorized: request.card_uid.as_str() == ALLOWED,
    })
}

async fn log(State(recorded): State<Recorded>, Json(entry): Json<AccessLogEntry>) -> StatusCode {
    recorded.logs.lock().unwrap().push(entry);
    StatusCode::CREATED
}

async fn register(
    State(recorded): State<Recorded>,
    Json(registration): Json<DeviceRegistration>,
) -> StatusCode {
    recorded.registrations.lock().unwrap().push(registration);
    StatusCode::OK
}

async fn start(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

async fn healthy_backend() -> (SocketAddr, Recorded) {
    let recorded = Recorded::default();
    let router = Router::new()
        .route("/", get(|| async { "ok" }))
        .route("/api/rfid-cards/check", post(check))
        .route("/api/access-logs", post(log))
        .route("/api/devices/register", post(register))
        .with_state(recorded.clone());
    (start(router).await, recorded)
}

fn client(addr: SocketAddr, timeout: Duration) -> HttpBackend {
    HttpBackend::new(HttpBackendConfig {
        base_url: format!("http://{addr}"),
        timeout,
    })
    .unwrap()
}

fn request(card: &str) -> AuthorizationRequest {
    AuthorizationRequest {
        device_mac: DeviceId::new(MAC).unwrap(),
        card_uid: CredentialId::parse(card).unwrap(),
    }
}

#[tokio::test]
async fn test_check_card_verdicts() {
    let (addr, _) = healthy_backend().await;
    let backend = client(addr, Duration::from_secs(2));

    let granted = backend.check_card(&request(ALLOWED)).await.unwrap();
    assert!(granted.authorized);

    let denied = backend.check_card(&request("DE:AD:BE:EF")).await.unwrap();
    assert!(!denied.authorized);
}

#[tokio::test]
async fn test_log_and_registration_are_delivered() {
    let (addr, recorded) = healthy_backend().await;
    let backend = client(addr, Duration::from_secs(2));
    let device = DeviceId::new(MAC).unwrap();

    backend
        .submit_log(&AccessLogEntry {
            device_mac: device.clone(),
            card_uid: CredentialId::event_tag("DOOR_AUTO_CLOSE"),
            access_granted: true,
        })
        .await
        .unwrap();
    backend
        .register(&DeviceRegistration {
            mac: device.clone(),
            ip: "192.168.4.20".into(),
            name: device.default_display_name(),
            firmware_version: "1.0.0".into(),
        })
        .await
        .unwrap();
    backend.probe().await.unwrap();

    let logs = recorded.logs.lock().unwrap().clone();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].card_uid.as_str(), "DOOR_AUTO_CLOSE");
    assert_eq!(recorded.registrations.lock().unwrap()[0].name, "ESP32-0B:33:9E");
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let router = Router::new().route(
        "/api/rfid-cards/check",
        post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    );
    let backend = client(start(router).await, Duration::from_secs(2));

    let err = backend.check_card(&request(ALLOWED)).await.unwrap_err();
    assert_eq!(err, BackendError::Status(500));
}

#[tokio::test]
async fn test_undecodable_body_is_malformed() {
    let router = Router::new().route("/api/rfid-cards/check", post(|| async { "yes please" }));
    let backend = client(start(router).await, Duration::from_secs(2));

    let err = backend.check_card(&request(ALLOWED)).await.unwrap_err();
    assert!(matches!(err, BackendError::Malformed(_)));
}

#[tokio::test]
async fn test_probe_accepts_any_http_answer() {
    let router = Router::new().route("/", get(|| async { StatusCode::NOT_FOUND }));
    let backend = client(start(router).await, Duration::from_secs(2));

    assert!(backend.probe().await.is_ok());
}

#[tokio::test]
async fn test_closed_port_is_unreachable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend = client(addr, Duration::from_secs(2));
    let err = backend.check_card(&request(ALLOWED)).await.unwrap_err();
    assert!(matches!(err, BackendError::Unreachable(_)));
    assert!(backend.probe().await.is_err());
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let router = Router::new().route(
        "/api/rfid-cards/check",
        post(|| async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Json(AuthorizationResponse { authorized: true })
        }),
    );
    let backend = client(start(router).await, Duration::from_millis(100));

    let err = backend.check_card(&request(ALLOWED)).await.unwrap_err();
    assert_eq!(err, BackendError::Timeout(100));
}
