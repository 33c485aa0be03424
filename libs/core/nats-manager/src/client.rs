//! The manager handle and its request-reply envelope.

use crate::api::{ApiSubject, DEFAULT_API_PREFIX, decode_response, domain_prefix, normalize_prefix};
use crate::config::{DEFAULT_REQUEST_TIMEOUT, ManagerConfig};
use crate::error::{JsmError, JsmResult};
use crate::metrics::ManagerMetrics;
use crate::options::{CallContext, ManageOpt, ResolvedOptions};
use crate::transport::Transport;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Management client for JetStream streams and consumers.
///
/// Cloning is cheap; clones share the transport. No other state is shared
/// between calls.
#[derive(Clone)]
pub struct JetStreamManager {
    transport: Arc<dyn Transport>,
    prefix: String,
    wait: Duration,
}

impl std::fmt::Debug for JetStreamManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JetStreamManager")
            .field("prefix", &self.prefix)
            .field("wait", &self.wait)
            .finish_non_exhaustive()
    }
}

impl JetStreamManager {
    /// Create a manager over any transport.
    pub fn new<T: Transport + 'static>(transport: T) -> Self {
        Self::from_arc(Arc::new(transport))
    }

    /// Create from an Arc (for sharing).
    pub fn from_arc(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            prefix: DEFAULT_API_PREFIX.to_string(),
            wait: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Connect to the NATS server named in `config`.
    pub async fn connect(config: &ManagerConfig) -> JsmResult<Self> {
        let client = async_nats::connect(&config.nats_url)
            .await
            .map_err(|e| JsmError::Transport(e.to_string()))?;

        info!(url = %config.nats_url, prefix = %config.resolved_prefix(), "Connected to NATS");

        Ok(Self::from_config(client, config))
    }

    /// Create a manager over `transport` using the prefix and wait from `config`.
    pub fn from_config<T: Transport + 'static>(transport: T, config: &ManagerConfig) -> Self {
        Self {
            transport: Arc::new(transport),
            prefix: config.resolved_prefix(),
            wait: config.request_timeout,
        }
    }

    /// Set a custom API prefix.
    pub fn with_api_prefix(mut self, prefix: &str) -> Self {
        self.prefix = normalize_prefix(prefix);
        self
    }

    /// Address the API of a JetStream domain.
    pub fn with_domain(mut self, domain: &str) -> Self {
        self.prefix = domain_prefix(domain);
        self
    }

    /// Set the default deadline for calls without a timeout or token.
    pub fn with_default_wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    pub fn api_prefix(&self) -> &str {
        &self.prefix
    }

    pub fn default_wait(&self) -> Duration {
        self.wait
    }

    /// Resolve per-call options against this manager's default wait.
    pub fn resolve(&self, opts: &[ManageOpt]) -> JsmResult<ResolvedOptions> {
        ResolvedOptions::resolve(opts, self.wait)
    }

    /// One request-reply exchange, bounded by the context.
    ///
    /// Without a deadline the manager's default wait bounds the exchange.
    pub(crate) async fn request_raw(
        &self,
        subject: ApiSubject<'_>,
        payload: Vec<u8>,
        ctx: &CallContext,
    ) -> JsmResult<Vec<u8>> {
        if ctx.is_done() {
            return Err(ctx.done_error());
        }

        let full_subject = subject.subject(&self.prefix);
        let timeout = ctx.remaining().unwrap_or(self.wait);
        let start = Instant::now();

        let result = tokio::select! {
            biased;
            _ = ctx.done() => Err(ctx.done_error()),
            reply = self.transport.request(full_subject.clone(), payload, timeout) => {
                reply.map_err(JsmError::from)
            }
        };

        let elapsed = start.elapsed();
        ManagerMetrics::record_request(subject.operation(), &result, elapsed);
        debug!(
            subject = %full_subject,
            elapsed_ms = elapsed.as_millis() as u64,
            ok = result.is_ok(),
            "JetStream API request"
        );

        result
    }

    /// Request and unwrap the response envelope.
    pub(crate) async fn api_request<R: DeserializeOwned>(
        &self,
        subject: ApiSubject<'_>,
        payload: Vec<u8>,
        ctx: &CallContext,
    ) -> JsmResult<R> {
        let raw = self.request_raw(subject, payload, ctx).await?;
        decode_response(&raw)
    }
}

/// Serialize a request body.
pub(crate) fn encode<T: Serialize>(body: &T) -> JsmResult<Vec<u8>> {
    serde_json::to_vec(body).map_err(JsmError::Encode)
}
