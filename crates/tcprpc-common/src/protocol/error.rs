use thiserror::Error;

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("Connection closed: {0}")]
    ConnectionClosed(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Frame too large: {size} bytes (max {max} bytes)")]
    FrameTooLarge { size: usize, max: usize },

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("Mismatched request_id in response: expected {expected}, got {actual}")]
    CorrelationMismatch { expected: String, actual: String },

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RpcError {
    /// Name of the fault class this error belongs to.
    ///
    /// Used in log lines and in the notes the client records between attempts.
    pub fn kind(&self) -> &'static str {
        match self {
            RpcError::MalformedPayload(_) | RpcError::FrameTooLarge { .. } => "DecodeFault",
            RpcError::ConnectionClosed(_) | RpcError::Connection(_) | RpcError::Io(_) => {
                "ConnectionFault"
            }
            RpcError::Timeout(_) => "TimeoutFault",
            RpcError::CorrelationMismatch { .. } => "CorrelationFault",
            RpcError::Serialization(_) => "SerializationFault",
            RpcError::InvalidConfig(_) => "ConfigFault",
        }
    }

    /// Whether the error means the peer went away or the socket is unusable.
    pub fn is_connection_fault(&self) -> bool {
        matches!(
            self,
            RpcError::ConnectionClosed(_) | RpcError::Connection(_) | RpcError::Io(_)
        )
    }
}

impl From<std::net::AddrParseError> for RpcError {
    fn from(err: std::net::AddrParseError) -> Self {
        RpcError::InvalidConfig(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RpcError>;
