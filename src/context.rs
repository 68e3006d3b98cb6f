//! Cancellation and deadlines for store operations.

use std::{sync::Arc, time::Duration};

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::{AppState, Error};

/// Bounds a store operation with a cancellation signal and an optional deadline.
///
/// Cloning a context shares the cancellation signal and the deadline.
#[derive(Debug, Clone)]
pub struct RequestContext {
    token: CancellationToken,
    deadline: Option<Instant>,
    /// Cancels `token` once every clone of the context has been dropped, e.g.
    /// when axum drops the handler future because the client went away.
    _cancel_on_drop: Option<Arc<DropGuard>>,
}

impl RequestContext {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
            _cancel_on_drop: None,
        }
    }

    /// A context that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
            ..Self::background()
        }
    }

    /// A copy that sees this context's cancellation and deadline without
    /// keeping a request context alive.
    ///
    /// Store operations that run several statements hold one of these to
    /// stop between statements.
    pub fn detach(&self) -> Self {
        Self {
            token: self.token.clone(),
            deadline: self.deadline,
            _cancel_on_drop: None,
        }
    }

    /// The context for a single HTTP request.
    ///
    /// The context is cancelled when the last clone is dropped.
    pub fn for_request(timeout: Duration) -> Self {
        let token = CancellationToken::new();
        let guard = token.clone().drop_guard();

        Self {
            token,
            deadline: Some(Instant::now() + timeout),
            _cancel_on_drop: Some(Arc::new(guard)),
        }
    }

    /// Signal cancellation to every operation using this context.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// A token that observes this context's cancellation without keeping it alive.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// The time after which operations using this context fail with [Error::Timeout].
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Return the error for a context that is already done, or `Ok` if work
    /// may still start.
    pub fn check(&self) -> Result<(), Error> {
        check_expired(&self.token, self.deadline)
    }

    /// Wait until the context is cancelled or its deadline passes and return
    /// the matching error.
    ///
    /// Never resolves for a [RequestContext::background] context.
    pub async fn done(&self) -> Error {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => Error::Canceled,
                    _ = tokio::time::sleep_until(deadline) => Error::Timeout,
                }
            }
            None => {
                self.token.cancelled().await;
                Error::Canceled
            }
        }
    }
}

/// Return the error for a cancelled `token` or a passed `deadline`.
///
/// Cancellation takes precedence over the deadline.
pub(crate) fn check_expired(
    token: &CancellationToken,
    deadline: Option<Instant>,
) -> Result<(), Error> {
    if token.is_cancelled() {
        return Err(Error::Canceled);
    }

    match deadline {
        Some(deadline) if Instant::now() >= deadline => Err(Error::Timeout),
        _ => Ok(()),
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(_: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        Ok(Self::for_request(state.request_timeout))
    }
}

#[cfg(test)]
mod request_context_tests {
    use std::time::Duration;

    use crate::Error;

    use super::RequestContext;

    #[tokio::test]
    async fn background_context_is_live() {
        assert_eq!(RequestContext::background().check(), Ok(()));
    }

    #[tokio::test]
    async fn cancelled_context_reports_canceled() {
        let context = RequestContext::background();

        context.cancel();

        assert_eq!(context.check(), Err(Error::Canceled));
        assert_eq!(context.done().await, Error::Canceled);
    }

    #[tokio::test]
    async fn expired_context_reports_timeout() {
        let context = RequestContext::with_timeout(Duration::ZERO);

        assert_eq!(context.check(), Err(Error::Timeout));
        assert_eq!(context.done().await, Error::Timeout);
    }

    #[tokio::test]
    async fn request_context_is_cancelled_when_dropped() {
        let context = RequestContext::for_request(Duration::from_secs(60));
        let token = context.token();

        assert!(!token.is_cancelled());

        drop(context);

        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn clones_keep_request_context_alive() {
        let context = RequestContext::for_request(Duration::from_secs(60));
        let clone = context.clone();
        let token = context.token();

        drop(context);
        assert!(!token.is_cancelled());

        drop(clone);
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn detached_context_does_not_keep_request_alive() {
        let context = RequestContext::for_request(Duration::from_secs(60));
        let detached = context.detach();

        assert_eq!(detached.check(), Ok(()));

        drop(context);

        assert_eq!(detached.check(), Err(Error::Canceled));
    }
}
