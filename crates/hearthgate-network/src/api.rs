//! Local control API.
//!
//! | Route           | Answer                                              |
//! |-----------------|-----------------------------------------------------|
//! | `GET /scan`     | discovery document `{id, name, type, ip}`           |
//! | `GET /status`   | latest published status report                      |
//! | `POST /control` | command result once the coordinator has applied it  |
//!
//! `/control` takes the same JSON body as the MQTT command topic. Unlike
//! MQTT it waits for the coordinator's reply, so a caller learns whether
//! the door is `opening` or merely `extended`.

use crate::error::{NetworkError, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use hearthgate_controller::{
    CommandAck, CommandMailbox, CommandRejection, CommandSource, DeviceIdentity,
};
use hearthgate_core::constants::COMMAND_REPLY_TIMEOUT_MS;
use hearthgate_protocol::{ProtocolError, RemoteCommand, StatusReport};
use serde::Serialize;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// How long `/control` waits for the coordinator.
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_millis(COMMAND_REPLY_TIMEOUT_MS);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Discovery {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub ip: String,
}

impl From<&DeviceIdentity> for Discovery {
    fn from(identity: &DeviceIdentity) -> Self {
        Self {
            id: identity.device.to_string(),
            name: identity.name.clone(),
            kind: "Hub",
            ip: identity.address.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiState {
    pub mailbox: CommandMailbox,
    pub status: watch::Receiver<StatusReport>,
    pub discovery: Discovery,
    pub reply_timeout: Duration,
}

/// Failures answered by `/control`.
#[derive(Debug)]
pub enum ApiError {
    Decode(ProtocolError),
    Rejected(CommandRejection),
    NoReply,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Decode(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Rejected(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::NoReply => (
                StatusCode::SERVICE_UNAVAILABLE,
                "controller did not answer".to_string(),
            ),
        };
        let body = serde_json::json!({ "error": message });
        (status, Json(body)).into_response()
    }
}

/// Build the router with permissive CORS.
pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/scan", get(scan))
        .route("/status", get(status))
        .route("/control", post(control))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn scan(State(state): State<ApiState>) -> Json<Discovery> {
    Json(state.discovery)
}

async fn status(State(state): State<ApiState>) -> Json<StatusReport> {
    let report = state.status.borrow().clone();
    Json(report)
}

async fn control(
    State(state): State<ApiState>,
    body: Bytes,
) -> std::result::Result<Json<CommandAck>, ApiError> {
    let command = RemoteCommand::decode(&body).map_err(|e| {
        debug!(error = %e, "Rejecting /control body");
        ApiError::Decode(e)
    })?;

    let (id, reply) = state.mailbox.submit_with_reply(command, CommandSource::LocalApi);
    debug!(%command, %id, "Local command queued");

    match tokio::time::timeout(state.reply_timeout, reply).await {
        Ok(Ok(Ok(ack))) => Ok(Json(ack)),
        Ok(Ok(Err(rejection))) => Err(ApiError::Rejected(rejection)),
        Ok(Err(_)) => {
            warn!(%id, "Command dropped without a reply");
            Err(ApiError::NoReply)
        }
        Err(_) => {
            warn!(%id, timeout_ms = state.reply_timeout.as_millis() as u64, "Command reply timed out");
            Err(ApiError::NoReply)
        }
    }
}

/// Bind the API listener.
///
/// # Errors
/// `Bind` if the address is unavailable.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| NetworkError::Bind { addr, source })
}

/// Serve `router` on `listener` until `shutdown` resolves.
///
/// # Errors
/// `Serve` if the server fails.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Local API listening");
    }
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(NetworkError::Serve)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearthgate_core::DeviceId;

    #[test]
    fn test_discovery_document() {
        let identity = DeviceIdentity::new(
            DeviceId::new("A4:CF:12:0B:33:9E").unwrap(),
            None,
            "192.168.1.50",
        );
        let json = serde_json::to_value(Discovery::from(&identity)).unwrap();
        assert_eq!(json["id"], "A4:CF:12:0B:33:9E");
        assert_eq!(json["name"], "ESP32-0B:33:9E");
        assert_eq!(json["type"], "Hub");
        assert_eq!(json["ip"], "192.168.1.50");
    }

    #[test]
    fn test_error_status_codes() {
        let decode = ApiError::Decode(ProtocolError::Malformed("eof".into())).into_response();
        assert_eq!(decode.status(), StatusCode::BAD_REQUEST);

        let rejected = ApiError::Rejected(CommandRejection::ModeConflict { channel: 1 }).into_response();
        assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);

        assert_eq!(ApiError::NoReply.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
