//! Bounded retry loop for create calls.

use crate::api::{ApiSubject, decode_response};
use crate::client::JetStreamManager;
use crate::error::{JsmError, JsmResult};
use crate::metrics::ManagerMetrics;
use crate::options::ResolvedOptions;
use serde::de::DeserializeOwned;
use tracing::warn;

impl JetStreamManager {
    /// Issue a create request up to `opts.max_tries()` times.
    ///
    /// All attempts share one context, so the deadline bounds the whole loop
    /// rather than each attempt. A missing API responder means JetStream is
    /// not running at all and is reported as [`JsmError::JetStreamNotEnabled`].
    pub(crate) async fn create_with_retry<R: DeserializeOwned>(
        &self,
        subject: ApiSubject<'_>,
        payload: Vec<u8>,
        opts: &ResolvedOptions,
    ) -> JsmResult<R> {
        let ctx = opts.context();
        let max_tries = opts.max_tries();
        let mut last_err = None;

        for attempt in 1..=max_tries {
            if attempt > 1 && ctx.is_done() {
                break;
            }

            let result = match self.request_raw(subject, payload.clone(), ctx).await {
                Ok(raw) => decode_response::<R>(&raw),
                Err(JsmError::NoResponders) => Err(JsmError::JetStreamNotEnabled),
                Err(e) => Err(e),
            };
            ManagerMetrics::record_create_attempt(subject.operation(), &result);

            match result {
                Ok(created) => return Ok(created),
                Err(e) => {
                    warn!(
                        operation = subject.operation(),
                        attempt,
                        max_tries,
                        error = %e,
                        "Create attempt failed"
                    );
                    let retryable = e.is_retryable();
                    last_err = Some(e);
                    if !retryable {
                        break;
                    }
                }
            }
        }

        Err(last_err.unwrap_or_else(|| ctx.done_error()))
    }
}
