// MIT License
// Rust translation

/// All errors that can occur in the lares-ws-bridge library.
#[derive(Debug, thiserror::Error)]
pub enum LaresError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TLS error: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("envelope text has no \"CRC_16\" field")]
    ChecksumFieldMissing,

    #[error("payload requests ID_LOGIN before a login token was set")]
    LoginTokenMissing,

    #[error("login failed: {details}")]
    LoginFailed { details: String },

    #[error("Command timeout: {command}")]
    CommandTimeout { command: String },

    #[error("Command rejected by panel: {result}")]
    CommandRejected { result: String },

    #[error("Invalid response: {details}")]
    InvalidResponse { details: String },

    #[error("Socket disconnected")]
    Disconnected,

    #[error("Channel closed")]
    ChannelClosed,
}

impl LaresError {
    /// Whether this error is transient and the connection should be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LaresError::Io(_)
                | LaresError::WebSocket(_)
                | LaresError::CommandTimeout { .. }
                | LaresError::Disconnected
                | LaresError::ChannelClosed
        )
    }
}

pub type Result<T> = std::result::Result<T, LaresError>;
