//! Execution body abstraction.
//!
//! This module defines the [`Work`] trait (async, cancelable, generic over
//! the produced value) and two implementations:
//!
//! - [`WorkFn`] — closure-backed body producing a fresh future per firing,
//!   suitable for one-shot and repeating schedules alike.
//! - [`WorkOnce`] — `FnOnce`-backed body for one-shot submissions whose
//!   closure must own moved state (used by the try-async wrappers).
//!
//! `Work<()>` is the side-effecting ("action") family; `Work<T>` with a
//! non-unit `T` is the value-producing ("compute") family.
//!
//! A body receives a [`CancellationToken`] and should check it during long
//! work to honor interruption promptly.

use std::future::Future;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// Shared handle to an execution body.
pub type WorkRef<T> = Arc<dyn Work<T>>;

/// # Asynchronous, cancelable unit of work.
///
/// `run` is invoked once per firing; a repeating schedule calls it again for
/// every tick, so implementations must be able to produce a fresh future
/// each time.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use tasksmith::{TaskError, Work};
///
/// struct Probe;
///
/// #[async_trait]
/// impl Work<u32> for Probe {
///     async fn run(&self, ctx: CancellationToken) -> Result<u32, TaskError> {
///         if ctx.is_cancelled() {
///             return Err(TaskError::Canceled);
///         }
///         Ok(42)
///     }
/// }
/// ```
#[async_trait]
pub trait Work<T>: Send + Sync + 'static {
    /// Executes one firing of the body.
    ///
    /// Implementations should check `ctx.is_cancelled()` during long work
    /// and return [`TaskError::Canceled`] to exit promptly.
    async fn run(&self, ctx: CancellationToken) -> Result<T, TaskError>;
}

/// Closure-backed body.
///
/// Wraps `F: Fn(CancellationToken) -> Fut`, producing a fresh future per
/// firing. No shared mutable state between firings; share state explicitly
/// through an `Arc` inside the closure if needed.
pub struct WorkFn<F> {
    f: F,
}

impl<F> WorkFn<F> {
    /// Creates a new closure-backed body.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the body and returns it as a shared [`WorkRef`].
    pub fn arc<T>(f: F) -> WorkRef<T>
    where
        T: Send + 'static,
        Self: Work<T>,
    {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<T, F, Fut> Work<T> for WorkFn<F>
where
    T: Send + 'static,
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
{
    async fn run(&self, ctx: CancellationToken) -> Result<T, TaskError> {
        (self.f)(ctx).await
    }
}

type OnceBody<T> = Box<dyn FnOnce(CancellationToken) -> BoxFuture<'static, Result<T, TaskError>> + Send>;

/// One-shot body backed by an `FnOnce` closure.
///
/// The closure may own moved state (resources, buffers). Firing it a second
/// time yields an execution failure rather than a panic; one-shot dispatch
/// paths never do so.
pub struct WorkOnce<T> {
    f: Mutex<Option<OnceBody<T>>>,
}

impl<T: Send + 'static> WorkOnce<T> {
    /// Creates a one-shot body from an `FnOnce` closure.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
    {
        let boxed: OnceBody<T> = Box::new(move |ctx| Box::pin(f(ctx)));
        Self {
            f: Mutex::new(Some(boxed)),
        }
    }

    /// Creates the body and returns it as a shared [`WorkRef`].
    pub fn arc<F, Fut>(f: F) -> WorkRef<T>
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
    {
        Arc::new(Self::new(f))
    }

    fn take(&self) -> Option<OnceBody<T>> {
        self.f.lock().expect("work body lock poisoned").take()
    }
}

#[async_trait]
impl<T: Send + 'static> Work<T> for WorkOnce<T> {
    async fn run(&self, ctx: CancellationToken) -> Result<T, TaskError> {
        match self.take() {
            Some(f) => f(ctx).await,
            None => Err(TaskError::msg("one-shot body fired more than once")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rt() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap()
    }

    #[test]
    fn test_work_fn_fires_repeatedly() {
        let body = WorkFn::new(|_ctx: CancellationToken| async { Ok::<u32, TaskError>(7) });
        let rt = rt();
        assert_eq!(rt.block_on(body.run(CancellationToken::new())).unwrap(), 7);
        assert_eq!(rt.block_on(body.run(CancellationToken::new())).unwrap(), 7);
    }

    #[test]
    fn test_work_once_fires_once() {
        let moved = String::from("owned");
        let body = WorkOnce::new(move |_ctx| async move { Ok::<String, TaskError>(moved) });
        let rt = rt();
        assert_eq!(
            rt.block_on(body.run(CancellationToken::new())).unwrap(),
            "owned"
        );
        assert!(rt.block_on(body.run(CancellationToken::new())).is_err());
    }
}
