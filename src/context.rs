use std::future::Future;

use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Reasons a [`Context`] stops an operation before it completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error("context cancelled")]
    Cancelled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Execution context governing cancellation and deadlines.
///
/// Operations run through [`Context::run`] race against the context: they
/// fail with [`ContextError`] as soon as the token is cancelled or the
/// deadline passes, whichever comes first. Derived contexts inherit the
/// parent's cancellation and can only tighten its deadline.
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Wrap an existing cancellation token, e.g. one owned by a server's
    /// shutdown logic. Cancelling `token` cancels the returned context.
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Derive a context that also expires after `timeout`.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a context that also expires at `deadline`.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    /// Derive a context that can be cancelled without affecting this one.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Cancel this context and every context derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the reason this context is done, if it is.
    pub fn err(&self) -> Option<ContextError> {
        if self.token.is_cancelled() {
            Some(ContextError::Cancelled)
        } else if self.deadline.is_some_and(|d| Instant::now() >= d) {
            Some(ContextError::DeadlineExceeded)
        } else {
            None
        }
    }

    /// Drive `fut` to completion unless the context finishes first.
    ///
    /// A context that is already done never polls `fut`.
    pub async fn run<F, T, E>(&self, fut: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: From<ContextError>,
    {
        if let Some(err) = self.err() {
            return Err(err.into());
        }

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(ContextError::Cancelled.into()),
            _ = expires(self.deadline) => Err(ContextError::DeadlineExceeded.into()),
            res = fut => res,
        }
    }
}

async fn expires(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
