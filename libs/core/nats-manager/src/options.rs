//! Per-call options: deadline, cancellation and retry budget.
//!
//! Every management call takes a slice of [`ManageOpt`] modifiers and resolves
//! them into a [`ResolvedOptions`] once, before any request is sent.

use crate::error::JsmError;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Stand-in deadline for timeouts too large to represent as an instant.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Modifier for a single management call.
///
/// Later modifiers of the same kind override earlier ones.
#[derive(Debug, Clone)]
pub enum ManageOpt {
    /// Bound the whole call by a fixed timeout. `Duration::ZERO` means unset.
    Timeout(Duration),

    /// Abort the call when this token is cancelled. The caller keeps ownership.
    Context(CancellationToken),

    /// Extra attempts for create calls on top of the first one.
    Retries(u32),
}

/// Cancellation view shared by every wait point of one call.
///
/// Cheap to clone; clones observe the same token and deadline.
#[derive(Debug, Clone)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// Context with a fixed deadline and a fresh token.
    ///
    /// Timeouts past the representable range are clamped to a far-future deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        let now = Instant::now();
        let deadline = now
            .checked_add(timeout)
            .unwrap_or_else(|| now + FAR_FUTURE);
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// Context driven only by an external token.
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` when the context has no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Whether the token fired or the deadline passed.
    pub fn is_done(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Resolves once the token fires or the deadline passes.
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }

    /// Error describing why the context is done.
    pub fn done_error(&self) -> JsmError {
        if self.token.is_cancelled() {
            JsmError::Cancelled
        } else {
            JsmError::Timeout
        }
    }
}

/// Options of one call after resolution. Immutable once built.
///
/// When the context was derived from a timeout, this value owns its token and
/// cancels it when dropped, so every exit path of the owning call releases it
/// exactly once. A caller-supplied token is never cancelled here.
#[derive(Debug)]
pub struct ResolvedOptions {
    ctx: CallContext,
    max_tries: u32,
    release: Option<DropGuard>,
}

impl ResolvedOptions {
    /// Resolve `opts`, falling back to `default_wait` when neither a timeout
    /// nor a token was given.
    pub fn resolve(opts: &[ManageOpt], default_wait: Duration) -> Result<Self, JsmError> {
        let mut timeout = Duration::ZERO;
        let mut token = None;
        let mut retries = 0u32;

        for opt in opts {
            match opt {
                ManageOpt::Timeout(t) => timeout = *t,
                ManageOpt::Context(t) => token = Some(t.clone()),
                ManageOpt::Retries(n) => retries = *n,
            }
        }

        if token.is_some() && !timeout.is_zero() {
            return Err(JsmError::ContextAndTimeout);
        }

        let (ctx, release) = match token {
            Some(token) => (CallContext::with_token(token), None),
            None => {
                if timeout.is_zero() {
                    timeout = default_wait;
                }
                let ctx = CallContext::with_timeout(timeout);
                let release = ctx.token.clone().drop_guard();
                (ctx, Some(release))
            }
        };

        Ok(Self {
            ctx,
            max_tries: retries.saturating_add(1),
            release,
        })
    }

    pub fn context(&self) -> &CallContext {
        &self.ctx
    }

    /// Total attempts allowed for create calls (always at least one).
    pub fn max_tries(&self) -> u32 {
        self.max_tries
    }

    /// Whether dropping these options cancels the context token.
    pub fn owns_cancellation(&self) -> bool {
        self.release.is_some()
    }
}
