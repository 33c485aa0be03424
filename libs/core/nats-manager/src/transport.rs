//! Request-reply transport used by the manager.

use crate::error::TransportError;
use async_nats::client::RequestErrorKind;
use async_trait::async_trait;
use std::time::Duration;

/// Subject-addressed request-reply exchange.
///
/// Implementations must keep concurrent requests apart (NATS does this with
/// per-request reply inboxes), since one transport is shared by every call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `payload` to `subject` and wait up to `timeout` for a single reply.
    async fn request(
        &self,
        subject: String,
        payload: Vec<u8>,
        timeout: Duration,
    ) -> Result<Vec<u8>, TransportError>;
}

#[async_trait]
impl Transport for async_nats::Client {
    async fn request(
        &self,
        subject: String,
        payload: Vec<u8>,
        timeout: Duration,
    ) -> Result<Vec<u8>, TransportError> {
        let request = async_nats::Request::new()
            .payload(payload.into())
            .timeout(Some(timeout));

        match self.send_request(subject, request).await {
            Ok(message) => Ok(message.payload.to_vec()),
            Err(e) => Err(match e.kind() {
                RequestErrorKind::TimedOut => TransportError::TimedOut,
                RequestErrorKind::NoResponders => TransportError::NoResponders,
                RequestErrorKind::Other => TransportError::Other(e.to_string()),
            }),
        }
    }
}
