//! # Async try/catch/finally wrappers.
//!
//! Wraps one async operation with typed failure handlers, finalizers, and
//! auto-closed resources, executed through the builder engine on a
//! single-worker pool:
//!
//! ```text
//! try_async(body)                      side-effecting operation
//! try_async_compute(body, consumer)    value-producing operation
//! try_async_with_resource(r, body)     one resource, closed on completion
//! try_async_with_resources(rs, body)   several resources of one type
//! try_async_with_resource_map(m, body) named, heterogeneous resources
//!        │
//!        └─► .catch::<E>(..)/.catch_when(..)/.add_finalizer(..) ─► .execute()
//! ```
//!
//! ## Rules
//! - On failure the handler table is scanned in registration order; the
//!   first structural match consumes the failure, at most one handler fires.
//! - Finalizers all run, in registration order, after the outcome is known.
//! - Resources are closed exactly once, in declaration order, after the
//!   finalizers; a close failure goes through the handler table and never
//!   masks the primary outcome.
//! - An unmatched failure is recorded as the pending failure; consume it
//!   through [`TryAsyncHandle::consume_pending_failure`] to route it to the
//!   process-wide sink.
//!
//! # Example
//! ```no_run
//! use tasksmith::try_async::try_async;
//! use tasksmith::TaskError;
//!
//! let mut op = try_async(|_ctx| async {
//!     Err::<(), _>(TaskError::fail(std::io::Error::other("boom")))
//! })
//! .catch::<std::io::Error>(|err| eprintln!("io failed: {err}"))
//! .add_finalizer(|| println!("done either way"))
//! .execute()?;
//!
//! let _ = op.join();
//! op.consume_pending_failure();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod catcher;
mod core;
mod resource;

use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::try_async::resource::CloseEntry;

pub use core::{TryAsyncBuilder, TryAsyncHandle};
pub use resource::{Closable, ResourceMap, SharedResource};

/// Wraps a side-effecting async operation.
pub fn try_async<F, Fut>(f: F) -> TryAsyncBuilder<()>
where
    F: FnOnce(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    TryAsyncBuilder::from_once(f)
}

/// Wraps a value-producing async operation; `result_consumer` receives the
/// value on success.
pub fn try_async_compute<T, F, Fut>(
    f: F,
    result_consumer: impl Fn(&T) + Send + Sync + 'static,
) -> TryAsyncBuilder<T>
where
    T: Send + 'static,
    F: FnOnce(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
{
    let mut builder = TryAsyncBuilder::from_once(f);
    builder.set_result_consumer(result_consumer);
    builder
}

/// Wraps an operation over one resource; the resource is closed on
/// completion regardless of the outcome.
pub fn try_async_with_resource<R, F, Fut>(resource: R, f: F) -> TryAsyncBuilder<()>
where
    R: Closable,
    F: FnOnce(SharedResource<R>, CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    let shared = Arc::new(Mutex::new(resource));
    let body_resource = Arc::clone(&shared);
    let mut builder = TryAsyncBuilder::from_once(move |ctx| f(body_resource, ctx));
    builder.push_close(CloseEntry::new(None, shared));
    builder
}

/// Wraps an operation over several resources of one type; all are closed in
/// declaration order on completion.
pub fn try_async_with_resources<R, F, Fut>(resources: Vec<R>, f: F) -> TryAsyncBuilder<()>
where
    R: Closable,
    F: FnOnce(Vec<SharedResource<R>>, CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    let shared: Vec<SharedResource<R>> = resources
        .into_iter()
        .map(|r| Arc::new(Mutex::new(r)))
        .collect();
    let body_resources = shared.clone();
    let mut builder = TryAsyncBuilder::from_once(move |ctx| f(body_resources, ctx));
    for resource in shared {
        builder.push_close(CloseEntry::new(None, resource));
    }
    builder
}

/// Wraps an operation over a named, heterogeneous resource collection; every
/// entry is closed in declaration order on completion.
pub fn try_async_with_resource_map<F, Fut>(map: ResourceMap, f: F) -> TryAsyncBuilder<()>
where
    F: FnOnce(ResourceMap, CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    let closes = map.close_entries();
    let mut builder = TryAsyncBuilder::from_once(move |ctx| f(map, ctx));
    for entry in closes {
        builder.push_close(entry);
    }
    builder
}
