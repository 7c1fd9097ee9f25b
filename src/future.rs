//! Asynchronous combinators.
//!
//! Every combinator here awaits the user-supplied continuation and nothing
//! else: no tasks are spawned and steps of a chain run strictly one after
//! the other. The short-circuit rule is the same as for the synchronous
//! combinators; a failed outcome never starts its continuation.
//!
//! Panics inside a continuation propagate from `map_async`/`bind_async`.
//! The `try_` variants catch them and fail with an
//! [`ErrorKind::Unexpected`](crate::ErrorKind::Unexpected) error instead.

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use crate::cancel::CancellationSignal;
use crate::outcome::{capture_panic, Outcome};
use crate::reason::Error;

fn cancelled_error() -> Error {
    #[cfg(feature = "tracing")]
    tracing::debug!("outcome.cancelled");

    Error::cancelled()
}

/// Run `start()` unless the signal already fired, racing it against the signal.
async fn race_cancellation<S, F, Fut>(signal: &S, start: F) -> Option<Fut::Output>
where
    S: CancellationSignal + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future,
{
    if signal.is_cancelled() {
        return None;
    }
    let work = start();
    tokio::select! {
        biased;
        _ = signal.cancelled() => None,
        output = work => Some(output),
    }
}

impl<T> Outcome<T> {
    /// Asynchronous [`map`](Self::map).
    pub async fn map_async<U, F, Fut>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = U>,
    {
        match self.split() {
            Ok((value, successes)) => Outcome::from_split(f(value).await, successes),
            Err(failed) => failed,
        }
    }

    /// Asynchronous [`bind`](Self::bind). Success annotations are not merged.
    pub async fn bind_async<U, F, Fut>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Outcome<U>>,
    {
        match self.split() {
            Ok((value, _)) => f(value).await,
            Err(failed) => failed,
        }
    }

    /// Asynchronous [`ensure`](Self::ensure).
    ///
    /// The predicate receives a borrow of the value; the future it returns
    /// must own whatever it needs from it.
    pub async fn ensure_async<F, Fut>(self, pred: F, error: impl Into<Error>) -> Self
    where
        F: FnOnce(&T) -> Fut,
        Fut: Future<Output = bool>,
    {
        if self.is_failed() {
            return self;
        }
        if pred(self.value()).await {
            self
        } else {
            self.with_error(error)
        }
    }

    /// Asynchronous [`match_with`](Self::match_with).
    pub async fn match_async<R, S, SFut, F, FFut>(self, on_success: S, on_failure: F) -> R
    where
        S: FnOnce(T) -> SFut,
        SFut: Future<Output = R>,
        F: FnOnce(Vec<Error>) -> FFut,
        FFut: Future<Output = R>,
    {
        match self.split::<T>() {
            Ok((value, _)) => on_success(value).await,
            Err(failed) => {
                let (_, _, errors) = failed.into_parts();
                on_failure(errors).await
            }
        }
    }

    /// [`map_async`](Self::map_async) that turns a panic in `f`, or in the
    /// future it returns, into a failed outcome.
    pub async fn try_map_async<U, F, Fut>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = U>,
    {
        let (value, successes) = match self.split() {
            Ok(parts) => parts,
            Err(failed) => return failed,
        };
        match AssertUnwindSafe(async move { f(value).await })
            .catch_unwind()
            .await
        {
            Ok(mapped) => Outcome::from_split(mapped, successes),
            Err(payload) => Outcome::failed_with(successes, capture_panic(payload)),
        }
    }

    /// [`bind_async`](Self::bind_async) that turns a panic in `f`, or in the
    /// future it returns, into a failed outcome.
    pub async fn try_bind_async<U, F, Fut>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Outcome<U>>,
    {
        let (value, _) = match self.split() {
            Ok(parts) => parts,
            Err(failed) => return failed,
        };
        AssertUnwindSafe(async move { f(value).await })
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Outcome::fail_with(capture_panic(payload)))
    }

    /// [`map_async`](Self::map_async) that stops when `signal` fires.
    ///
    /// The signal is checked before `f` is called and raced against the
    /// future it returns. Cancellation yields a failure holding
    /// [`Error::cancelled`]; a failed receiver is passed through unchanged.
    pub async fn map_async_cancellable<U, S, F, Fut>(self, signal: &S, f: F) -> Outcome<U>
    where
        S: CancellationSignal + ?Sized,
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = U>,
    {
        let (value, successes) = match self.split() {
            Ok(parts) => parts,
            Err(failed) => return failed,
        };
        match race_cancellation(signal, move || f(value)).await {
            Some(mapped) => Outcome::from_split(mapped, successes),
            None => Outcome::failed_with(successes, cancelled_error()),
        }
    }

    /// [`bind_async`](Self::bind_async) that stops when `signal` fires.
    ///
    /// See [`map_async_cancellable`](Self::map_async_cancellable).
    pub async fn bind_async_cancellable<U, S, F, Fut>(self, signal: &S, f: F) -> Outcome<U>
    where
        S: CancellationSignal + ?Sized,
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Outcome<U>>,
    {
        let (value, successes) = match self.split() {
            Ok(parts) => parts,
            Err(failed) => return failed,
        };
        race_cancellation(signal, move || f(value))
            .await
            .unwrap_or_else(|| Outcome::failed_with(successes, cancelled_error()))
    }

    /// [`ensure_async`](Self::ensure_async) that stops when `signal` fires.
    ///
    /// A cancelled check fails the outcome with [`Error::cancelled`] instead
    /// of `error`; the successes are kept.
    pub async fn ensure_async_cancellable<S, F, Fut>(
        self,
        signal: &S,
        pred: F,
        error: impl Into<Error>,
    ) -> Self
    where
        S: CancellationSignal + ?Sized,
        F: FnOnce(&T) -> Fut,
        Fut: Future<Output = bool>,
    {
        if self.is_failed() {
            return self;
        }
        let passed = race_cancellation(signal, || pred(self.value())).await;
        match passed {
            Some(true) => self,
            Some(false) => self.with_error(error),
            None => self.with_error(cancelled_error()),
        }
    }

    /// [`try_map_async`](Self::try_map_async) that stops when `signal` fires.
    pub async fn try_map_async_cancellable<U, S, F, Fut>(self, signal: &S, f: F) -> Outcome<U>
    where
        S: CancellationSignal + ?Sized,
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = U>,
    {
        let (value, successes) = match self.split() {
            Ok(parts) => parts,
            Err(failed) => return failed,
        };
        let work = move || AssertUnwindSafe(async move { f(value).await }).catch_unwind();
        match race_cancellation(signal, work).await {
            Some(Ok(mapped)) => Outcome::from_split(mapped, successes),
            Some(Err(payload)) => Outcome::failed_with(successes, capture_panic(payload)),
            None => Outcome::failed_with(successes, cancelled_error()),
        }
    }

    /// [`try_bind_async`](Self::try_bind_async) that stops when `signal` fires.
    pub async fn try_bind_async_cancellable<U, S, F, Fut>(self, signal: &S, f: F) -> Outcome<U>
    where
        S: CancellationSignal + ?Sized,
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Outcome<U>>,
    {
        let (value, successes) = match self.split() {
            Ok(parts) => parts,
            Err(failed) => return failed,
        };
        let work = move || AssertUnwindSafe(async move { f(value).await }).catch_unwind();
        match race_cancellation(signal, work).await {
            Some(Ok(bound)) => bound,
            Some(Err(payload)) => Outcome::fail_with(capture_panic(payload)),
            None => Outcome::failed_with(successes, cancelled_error()),
        }
    }
}

// ============================================================================
// Future Extension
// ============================================================================

/// Chain async combinators directly on a future that yields an [`Outcome`].
///
/// ```ignore
/// let saved = repo.get(id).bind_async(|user| repo.save(user)).await;
/// ```
pub trait OutcomeFutureExt<T>: Future<Output = Outcome<T>> + Sized {
    /// Await, then [`Outcome::map_async`].
    fn map_async<U, F, Fut>(self, f: F) -> impl Future<Output = Outcome<U>>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = U>;

    /// Await, then [`Outcome::bind_async`].
    fn bind_async<U, F, Fut>(self, f: F) -> impl Future<Output = Outcome<U>>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Outcome<U>>;

    /// Await, then [`Outcome::ensure_async`].
    fn ensure_async<F, Fut, E>(self, pred: F, error: E) -> impl Future<Output = Outcome<T>>
    where
        F: FnOnce(&T) -> Fut,
        Fut: Future<Output = bool>,
        E: Into<Error>;

    /// Await, then [`Outcome::try_map_async`].
    fn try_map_async<U, F, Fut>(self, f: F) -> impl Future<Output = Outcome<U>>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = U>;

    /// Await, then [`Outcome::try_bind_async`].
    fn try_bind_async<U, F, Fut>(self, f: F) -> impl Future<Output = Outcome<U>>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Outcome<U>>;

    /// Await, then [`Outcome::map_async_cancellable`].
    fn map_async_cancellable<U, S, F, Fut>(
        self,
        signal: &S,
        f: F,
    ) -> impl Future<Output = Outcome<U>>
    where
        S: CancellationSignal + ?Sized,
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = U>;

    /// Await, then [`Outcome::bind_async_cancellable`].
    fn bind_async_cancellable<U, S, F, Fut>(
        self,
        signal: &S,
        f: F,
    ) -> impl Future<Output = Outcome<U>>
    where
        S: CancellationSignal + ?Sized,
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Outcome<U>>;

    /// Await, then [`Outcome::ensure_async_cancellable`].
    fn ensure_async_cancellable<S, F, Fut, E>(
        self,
        signal: &S,
        pred: F,
        error: E,
    ) -> impl Future<Output = Outcome<T>>
    where
        S: CancellationSignal + ?Sized,
        F: FnOnce(&T) -> Fut,
        Fut: Future<Output = bool>,
        E: Into<Error>;

    /// Await, then [`Outcome::try_map_async_cancellable`].
    fn try_map_async_cancellable<U, S, F, Fut>(
        self,
        signal: &S,
        f: F,
    ) -> impl Future<Output = Outcome<U>>
    where
        S: CancellationSignal + ?Sized,
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = U>;

    /// Await, then [`Outcome::try_bind_async_cancellable`].
    fn try_bind_async_cancellable<U, S, F, Fut>(
        self,
        signal: &S,
        f: F,
    ) -> impl Future<Output = Outcome<U>>
    where
        S: CancellationSignal + ?Sized,
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Outcome<U>>;

    /// Await, then [`Outcome::match_async`].
    fn match_async<R, S, SFut, F, FFut>(
        self,
        on_success: S,
        on_failure: F,
    ) -> impl Future<Output = R>
    where
        S: FnOnce(T) -> SFut,
        SFut: Future<Output = R>,
        F: FnOnce(Vec<Error>) -> FFut,
        FFut: Future<Output = R>;
}

impl<T, X> OutcomeFutureExt<T> for X
where
    X: Future<Output = Outcome<T>>,
{
    fn map_async<U, F, Fut>(self, f: F) -> impl Future<Output = Outcome<U>>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = U>,
    {
        async move { self.await.map_async(f).await }
    }

    fn bind_async<U, F, Fut>(self, f: F) -> impl Future<Output = Outcome<U>>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Outcome<U>>,
    {
        async move { self.await.bind_async(f).await }
    }

    fn ensure_async<F, Fut, E>(self, pred: F, error: E) -> impl Future<Output = Outcome<T>>
    where
        F: FnOnce(&T) -> Fut,
        Fut: Future<Output = bool>,
        E: Into<Error>,
    {
        async move { self.await.ensure_async(pred, error).await }
    }

    fn try_map_async<U, F, Fut>(self, f: F) -> impl Future<Output = Outcome<U>>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = U>,
    {
        async move { self.await.try_map_async(f).await }
    }

    fn try_bind_async<U, F, Fut>(self, f: F) -> impl Future<Output = Outcome<U>>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Outcome<U>>,
    {
        async move { self.await.try_bind_async(f).await }
    }

    fn map_async_cancellable<U, S, F, Fut>(
        self,
        signal: &S,
        f: F,
    ) -> impl Future<Output = Outcome<U>>
    where
        S: CancellationSignal + ?Sized,
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = U>,
    {
        async move { self.await.map_async_cancellable(signal, f).await }
    }

    fn bind_async_cancellable<U, S, F, Fut>(
        self,
        signal: &S,
        f: F,
    ) -> impl Future<Output = Outcome<U>>
    where
        S: CancellationSignal + ?Sized,
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Outcome<U>>,
    {
        async move { self.await.bind_async_cancellable(signal, f).await }
    }

    fn ensure_async_cancellable<S, F, Fut, E>(
        self,
        signal: &S,
        pred: F,
        error: E,
    ) -> impl Future<Output = Outcome<T>>
    where
        S: CancellationSignal + ?Sized,
        F: FnOnce(&T) -> Fut,
        Fut: Future<Output = bool>,
        E: Into<Error>,
    {
        async move {
            self.await
                .ensure_async_cancellable(signal, pred, error)
                .await
        }
    }

    fn try_map_async_cancellable<U, S, F, Fut>(
        self,
        signal: &S,
        f: F,
    ) -> impl Future<Output = Outcome<U>>
    where
        S: CancellationSignal + ?Sized,
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = U>,
    {
        async move { self.await.try_map_async_cancellable(signal, f).await }
    }

    fn try_bind_async_cancellable<U, S, F, Fut>(
        self,
        signal: &S,
        f: F,
    ) -> impl Future<Output = Outcome<U>>
    where
        S: CancellationSignal + ?Sized,
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Outcome<U>>,
    {
        async move { self.await.try_bind_async_cancellable(signal, f).await }
    }

    fn match_async<R, S, SFut, F, FFut>(
        self,
        on_success: S,
        on_failure: F,
    ) -> impl Future<Output = R>
    where
        S: FnOnce(T) -> SFut,
        SFut: Future<Output = R>,
        F: FnOnce(Vec<Error>) -> FFut,
        FFut: Future<Output = R>,
    {
        async move { self.await.match_async(on_success, on_failure).await }
    }
}
