//! Try-async builder core: handler table, finalizers, cleanup, execution.

use std::error::Error;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

use crate::builder::{TaskHandle, ThreadBuilder};
use crate::error::{ConfigError, TaskError};
use crate::pool::TaskInfo;
use crate::sink;
use crate::try_async::catcher::CatcherTable;
use crate::try_async::resource::CloseEntry;
use crate::work::{WorkOnce, WorkRef};

type Finalizer = Box<dyn FnOnce() + Send + 'static>;
type PendingSlot = Arc<Mutex<Option<TaskError>>>;

/// Try/catch/finally wrapper around one async operation.
///
/// Built through the [`try_async`](crate::try_async::try_async) family of
/// entry points. Configure handlers and finalizers, then [`execute`]
/// (Self::execute) to submit; the wrapper guarantees:
///
/// - at most one handler fires per failure (first structural match wins);
/// - every finalizer runs exactly once, in registration order, after the
///   outcome is known;
/// - every supplied resource is closed exactly once, in declaration order,
///   after the finalizers;
/// - a failure no handler matched is recorded as the pending failure instead
///   of disappearing.
pub struct TryAsyncBuilder<T> {
    work: Option<WorkRef<T>>,
    catchers: CatcherTable,
    finalizers: Vec<Finalizer>,
    closes: Vec<CloseEntry>,
    result_consumer: Option<Arc<dyn Fn(&T) + Send + Sync>>,
}

impl<T: Send + 'static> TryAsyncBuilder<T> {
    pub(crate) fn from_once<F, Fut>(f: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
    {
        Self {
            work: Some(WorkOnce::arc(f)),
            catchers: CatcherTable::default(),
            finalizers: Vec::new(),
            closes: Vec::new(),
            result_consumer: None,
        }
    }

    pub(crate) fn push_close(&mut self, entry: CloseEntry) {
        self.closes.push(entry);
    }

    pub(crate) fn set_result_consumer(&mut self, f: impl Fn(&T) + Send + Sync + 'static) {
        self.result_consumer = Some(Arc::new(f));
    }

    /// Registers a handler for failures whose source chain contains an `E`.
    ///
    /// Handlers are tried in registration order; the first match consumes
    /// the failure.
    pub fn catch<E>(mut self, handler: impl Fn(&E) + Send + Sync + 'static) -> Self
    where
        E: Error + 'static,
    {
        self.catchers.add_typed(handler);
        self
    }

    /// Registers a handler guarded by a predicate on the whole failure.
    pub fn catch_when(
        mut self,
        predicate: impl Fn(&TaskError) -> bool + Send + Sync + 'static,
        handler: impl Fn(&TaskError) + Send + Sync + 'static,
    ) -> Self {
        self.catchers.add_predicate(predicate, handler);
        self
    }

    /// Registers a finalizer. All finalizers run after the outcome is known,
    /// in registration order, whether the operation succeeded or failed.
    pub fn add_finalizer(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.finalizers.push(Box::new(f));
        self
    }

    /// Submits the wrapped operation onto a single-worker pool and returns
    /// immediately.
    ///
    /// Worker-side order per outcome: operation, then on success the result
    /// consumer / on failure the first matching handler (or the pending
    /// failure record), then finalizers, then resource closes.
    pub fn execute(mut self) -> Result<TryAsyncHandle<T>, ConfigError> {
        let pending: PendingSlot = Arc::new(Mutex::new(None));
        let catchers = Arc::new(self.catchers);

        let uncaught = {
            let pending = Arc::clone(&pending);
            let catchers = Arc::clone(&catchers);
            move |err: &TaskError| {
                if !catchers.dispatch(err) {
                    record_if_empty(&pending, err.clone());
                }
            }
        };

        // Taken exactly once; the submission is one-shot but the observer
        // signature allows repeat invocation.
        let cleanup = Mutex::new(Some((self.finalizers, self.closes)));
        let observer = {
            let pending = Arc::clone(&pending);
            let catchers = Arc::clone(&catchers);
            move |info: &TaskInfo, _err: Option<&TaskError>| {
                let taken = cleanup.lock().expect("cleanup lock poisoned").take();
                let Some((finalizers, closes)) = taken else {
                    return;
                };

                for finalizer in finalizers {
                    if catch_unwind(AssertUnwindSafe(finalizer)).is_err() {
                        log::error!("finalizer panicked; task={}", info.name());
                    }
                }

                for close in closes {
                    let name = close.name().unwrap_or("<unnamed>").to_owned();
                    if let Err(cause) = close.run() {
                        log::warn!(
                            "resource close failed; task={} resource={} error={}",
                            info.name(),
                            name,
                            cause
                        );
                        let err = TaskError::from_dyn(cause);
                        if !catchers.dispatch(&err) {
                            record_if_empty(&pending, err);
                        }
                    }
                }
            }
        };

        let mut builder = ThreadBuilder::computation::<T>()
            .with_pool_size(1)
            .with_name_fn(|| "try-async".to_string())
            .with_uncaught_consumer(uncaught)
            .with_after_execute(observer);
        if let Some(consumer) = self.result_consumer.take() {
            builder = builder.with_result_consumer(move |value| consumer(value));
        }
        if let Some(work) = self.work.take() {
            builder = builder.with_work(work);
        }

        let handle = builder.start()?;
        Ok(TryAsyncHandle {
            handle: Some(handle),
            pending,
            info: TaskInfo::new("try-async"),
        })
    }
}

/// Handle to an executing or completed try-async operation.
pub struct TryAsyncHandle<T> {
    handle: Option<TaskHandle<T>>,
    pending: PendingSlot,
    info: TaskInfo,
}

impl<T: Send + 'static> TryAsyncHandle<T> {
    /// Blocks until the operation, its finalizers, and its resource closes
    /// finished, and returns the operation's outcome.
    ///
    /// A second call reports an execution failure instead of blocking.
    pub fn join(&mut self) -> Result<T, TaskError> {
        match self.handle.take() {
            Some(handle) => handle.join(),
            None => Err(TaskError::msg("try-async outcome already joined")),
        }
    }

    /// Requests cancellation of the wrapped operation.
    pub fn cancel(&self) {
        if let Some(handle) = &self.handle {
            handle.cancel();
        }
    }

    /// A failure no handler matched, if one was recorded. Peeks only.
    pub fn pending_failure(&self) -> Option<TaskError> {
        self.pending
            .lock()
            .expect("pending failure lock poisoned")
            .clone()
    }

    /// Delivers the pending failure (if any) to the process-wide sink,
    /// clears it, and returns it. Idempotent: a second call finds nothing.
    pub fn consume_pending_failure(&self) -> Option<TaskError> {
        let taken = self
            .pending
            .lock()
            .expect("pending failure lock poisoned")
            .take();
        if let Some(err) = &taken {
            (sink::failure_sink())(&self.info, err);
        }
        taken
    }
}

fn record_if_empty(pending: &PendingSlot, err: TaskError) {
    let mut slot = pending.lock().expect("pending failure lock poisoned");
    if slot.is_none() {
        *slot = Some(err);
    }
}
