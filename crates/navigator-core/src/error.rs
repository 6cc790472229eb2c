use thiserror::Error;

#[derive(Debug, Error)]
pub enum NavigatorError {
    // Chain errors
    #[error("Invalid operation chain: {0}")]
    InvalidChain(String),

    #[error("Default operation unavailable: {operation}: {message}")]
    DefaultOperation { operation: String, message: String },

    // Gateway errors
    #[error("Request rejected by gateway: {0}")]
    Rejected(String),

    #[error("Unsupported operation class: {0}")]
    UnsupportedOperation(String),

    #[error("Gateway request failed: {0}")]
    GatewayRequest(String),

    #[error("Gateway returned status {status}: {body}")]
    GatewayStatus { status: u16, body: String },

    // Config errors
    #[error("Config error: {0}")]
    Config(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NavigatorError>;
