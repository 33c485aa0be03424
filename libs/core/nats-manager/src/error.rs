//! Error types for JetStream management calls.

use thiserror::Error;

/// Result type alias for management operations.
pub type JsmResult<T> = Result<T, JsmError>;

/// Description fragment the server uses when JetStream is disabled for an account.
const NOT_ENABLED_SIGNATURE: &str = "not enabled for";

/// Error that can occur in a management call.
///
/// Variants fall into four groups:
/// - **Validation**: detected locally before any request is sent, never retried
/// - **Transport**: timeout, cancellation, missing responders, connection failure
/// - **Decode**: the reply could not be parsed
/// - **Application**: the server answered with an explicit error record
#[derive(Debug, Error)]
pub enum JsmError {
    /// Stream name missing
    #[error("stream name is required")]
    StreamNameRequired,

    /// Consumer name missing
    #[error("consumer name is required")]
    ConsumerNameRequired,

    /// Durable name contains the subject token separator
    #[error("invalid durable name: must not contain '.'")]
    InvalidDurableName,

    /// Both a cancellation token and a timeout were supplied
    #[error("context and timeout can not both be set")]
    ContextAndTimeout,

    /// JetStream is not enabled (no API responder, or disabled for the account)
    #[error("jetstream not enabled")]
    JetStreamNotEnabled,

    /// Nobody is listening on the API subject
    #[error("no responders available for request")]
    NoResponders,

    /// The call deadline elapsed
    #[error("request timed out")]
    Timeout,

    /// The caller's cancellation token fired
    #[error("request cancelled")]
    Cancelled,

    /// Any other transport failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Request body could not be serialized
    #[error("failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),

    /// Reply could not be deserialized
    #[error("failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),

    /// Error record returned by the server
    #[error("{description}")]
    Api { code: u16, description: String },

    /// Stored message payload or headers are malformed
    #[error("invalid stored message: {0}")]
    InvalidMessage(String),

    /// The listing task died before reporting its outcome
    #[error("listing task failed: {0}")]
    Task(String),
}

impl JsmError {
    /// Translate a server error record into a typed failure.
    pub fn from_api(code: u16, description: impl Into<String>) -> Self {
        let description = description.into();
        if description.contains(NOT_ENABLED_SIGNATURE) {
            return Self::JetStreamNotEnabled;
        }
        Self::Api { code, description }
    }

    /// Whether the error was raised locally before any request was sent.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            JsmError::StreamNameRequired
                | JsmError::ConsumerNameRequired
                | JsmError::InvalidDurableName
                | JsmError::ContextAndTimeout
                | JsmError::Encode(_)
        )
    }

    /// Whether the create loop may issue another attempt after this error.
    ///
    /// Transport, decode and application errors are all treated alike.
    pub fn is_retryable(&self) -> bool {
        !self.is_validation() && !matches!(self, JsmError::Cancelled | JsmError::Task(_))
    }

    /// Short label used as a metrics outcome.
    pub fn label(&self) -> &'static str {
        match self {
            JsmError::StreamNameRequired
            | JsmError::ConsumerNameRequired
            | JsmError::InvalidDurableName
            | JsmError::ContextAndTimeout => "invalid",
            JsmError::JetStreamNotEnabled => "not_enabled",
            JsmError::NoResponders => "no_responders",
            JsmError::Timeout => "timeout",
            JsmError::Cancelled => "cancelled",
            JsmError::Transport(_) | JsmError::Task(_) => "transport",
            JsmError::Encode(_) | JsmError::Decode(_) | JsmError::InvalidMessage(_) => "decode",
            JsmError::Api { .. } => "api_error",
        }
    }

    /// Server error code, when the error came from an error record.
    pub fn api_code(&self) -> Option<u16> {
        match self {
            JsmError::Api { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Error reported by a [`Transport`](crate::Transport).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out")]
    TimedOut,

    #[error("no responders")]
    NoResponders,

    #[error("{0}")]
    Other(String),
}

impl From<TransportError> for JsmError {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::TimedOut => JsmError::Timeout,
            TransportError::NoResponders => JsmError::NoResponders,
            TransportError::Other(msg) => JsmError::Transport(msg),
        }
    }
}
