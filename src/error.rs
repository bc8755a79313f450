// Client-side error taxonomy
use thiserror::Error;

/// Every failure the request pipeline hands back to a caller.
///
/// All kinds are terminal for the call that produced them; the pipeline never
/// retries internally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    // 2xx response whose body does not match the envelope contract
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    // Envelope code differs from the success sentinel
    #[error("{0}")]
    BusinessError(String),

    // HTTP 401
    #[error("{0}")]
    AuthenticationFailed(String),

    // Network failure, timeout or any other non-2xx status
    #[error("{0}")]
    TransportError(String),
}

impl PipelineError {
    pub fn malformed(detail: impl Into<String>) -> Self {
        PipelineError::MalformedResponse(detail.into())
    }

    pub fn business(message: impl Into<String>) -> Self {
        PipelineError::BusinessError(message.into())
    }

    pub fn authentication_failed(message: impl Into<String>) -> Self {
        PipelineError::AuthenticationFailed(message.into())
    }

    pub fn transport(message: impl Into<String>) -> Self {
        PipelineError::TransportError(message.into())
    }

    /// User-facing message, without the kind prefix
    pub fn message(&self) -> &str {
        match self {
            PipelineError::MalformedResponse(msg) => msg,
            PipelineError::BusinessError(msg) => msg,
            PipelineError::AuthenticationFailed(msg) => msg,
            PipelineError::TransportError(msg) => msg,
        }
    }

    /// Stable machine-readable code for JSON output
    pub fn error_code(&self) -> &'static str {
        match self {
            PipelineError::MalformedResponse(_) => "MALFORMED_RESPONSE",
            PipelineError::BusinessError(_) => "BUSINESS_ERROR",
            PipelineError::AuthenticationFailed(_) => "AUTHENTICATION_FAILED",
            PipelineError::TransportError(_) => "TRANSPORT_ERROR",
        }
    }

    /// Whether the caller can sensibly retry (possibly with different input).
    /// Authentication failures force session invalidation instead.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, PipelineError::AuthenticationFailed(_))
    }
}

/// Pipeline construction failures
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Invalid base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// Failures of the durable key/value channel behind the session store
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Storage location unavailable: {0}")]
    Unavailable(String),
}
