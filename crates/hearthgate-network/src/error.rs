use std::net::SocketAddr;
use thiserror::Error;

/// Transport setup failures. Request-level failures towards the backend
/// are reported as [`hearthgate_protocol::BackendError`] instead.
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Invalid backend URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Cannot bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, NetworkError>;
