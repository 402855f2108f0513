use thiserror::Error;

/// Errors decoding a remote command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Malformed command: {0}")]
    Malformed(String),

    #[error("Unknown device '{0}'")]
    UnknownTarget(String),

    #[error("Unknown action '{action}' for device '{device}'")]
    UnknownAction { device: String, action: String },

    #[error("Missing field '{0}'")]
    MissingField(&'static str),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

/// Errors talking to the backend.
///
/// Every variant is a transient-network failure as far as authorization
/// health is concerned; the split only exists for logging.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    #[error("Backend timeout after {0}ms")]
    Timeout(u64),

    #[error("Backend returned HTTP {0}")]
    Status(u16),

    #[error("Malformed backend response: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
