//! Scheduled/caught pool: a fixed-size worker pool with after-execute hooks.
//!
//! [`Pool`] wraps the runtime built by [`WorkerFactory`] and maintains the
//! ordered after-execute observer list. Scheduling primitives by themselves
//! discard failures from periodic work; the pool's `after_execute` hook is
//! the single place that corrects that, surfacing every firing's outcome to
//! every observer.
//!
//! ## Rules
//! - Observers run exactly once per firing, in registration order, for every
//!   outcome (success, failure, cancellation).
//! - An observer panic is caught and logged; it never aborts the pool or the
//!   remaining observers.
//! - Registration has no upper bound and no de-duplication.

use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use tokio::runtime::Runtime;
use tokio::task::JoinHandle;

use crate::error::{ConfigError, TaskError};
use crate::pool::factory::WorkerFactory;

/// After-execute observer: receives the task info and the firing's failure,
/// if any.
pub type AfterExecuteFn = Arc<dyn Fn(&TaskInfo, Option<&TaskError>) + Send + Sync>;

/// Identity of a submission as seen by observers and the sink.
#[derive(Clone, Debug)]
pub struct TaskInfo {
    name: Arc<str>,
    firing: u64,
}

impl TaskInfo {
    pub(crate) fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            firing: 0,
        }
    }

    /// Returns a copy stamped with the given firing number (1-based).
    pub(crate) fn at_firing(&self, firing: u64) -> Self {
        Self {
            name: Arc::clone(&self.name),
            firing,
        }
    }

    /// The task name, from the builder's name supplier or the default.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Firing number within the submission (1-based; 0 before the first).
    pub fn firing(&self) -> u64 {
        self.firing
    }
}

/// Fixed-size worker pool with an ordered after-execute observer list.
///
/// Created lazily by a builder's `start()` (sized by the builder's pool
/// size), or explicitly via [`Pool::new`] to share across builders.
pub struct Pool {
    // Taken by Drop; present for the pool's entire usable lifetime.
    runtime: Option<Runtime>,
    observers: Mutex<Vec<AfterExecuteFn>>,
    size: usize,
}

impl Pool {
    /// Builds a pool of `size` workers using the given factory.
    ///
    /// Fails with [`ConfigError::ZeroPoolSize`] for an empty pool and
    /// [`ConfigError::PoolBuild`] if the runtime cannot be constructed.
    pub fn new(size: usize, factory: &WorkerFactory) -> Result<Arc<Self>, ConfigError> {
        if size == 0 {
            return Err(ConfigError::ZeroPoolSize);
        }

        let runtime = factory.build_runtime(size)?;
        Ok(Arc::new(Self {
            runtime: Some(runtime),
            observers: Mutex::new(Vec::new()),
            size,
        }))
    }

    fn runtime(&self) -> &Runtime {
        self.runtime.as_ref().expect("runtime taken before drop")
    }

    /// Number of worker threads.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Registers an after-execute observer.
    ///
    /// Observers are invoked once per firing, in registration order.
    pub fn add_after_execute(&self, consumer: AfterExecuteFn) {
        self.observers
            .lock()
            .expect("observer list lock poisoned")
            .push(consumer);
    }

    /// Returns the registered observers, in registration order.
    pub fn after_execute_consumers(&self) -> Vec<AfterExecuteFn> {
        self.observers
            .lock()
            .expect("observer list lock poisoned")
            .clone()
    }

    /// Invokes every observer with this firing's outcome.
    ///
    /// Called by the dispatch layer after each firing. Observer panics are
    /// contained here.
    pub(crate) fn after_execute(&self, info: &TaskInfo, error: Option<&TaskError>) {
        let observers = self.after_execute_consumers();
        for observer in observers {
            if catch_unwind(AssertUnwindSafe(|| observer(info, error))).is_err() {
                log::error!(
                    "after-execute observer panicked; task={} firing={}",
                    info.name(),
                    info.firing()
                );
            }
        }
    }

    pub(crate) fn spawn<F>(&self, fut: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.runtime().handle().spawn(fut)
    }

    /// Blocks the calling (non-worker) thread on the given future.
    ///
    /// Used by [`TaskHandle::join`](crate::TaskHandle::join); must not be
    /// called from inside the pool's own workers.
    pub(crate) fn block_on<F: Future>(&self, fut: F) -> F::Output {
        self.runtime().block_on(fut)
    }
}

impl Drop for Pool {
    /// When the caller drops the handle without joining, the last owner of
    /// the pool is the driver future itself, so this runs on one of the
    /// pool's own workers. A plain `Runtime` drop would block (and panic)
    /// there; background shutdown never does.
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_zero_pool_size_is_rejected() {
        let err = Pool::new(0, &WorkerFactory::new()).err().expect("error");
        assert_eq!(err.as_label(), "config_zero_pool_size");
    }

    #[test]
    fn test_observers_fire_in_registration_order() {
        let pool = Pool::new(1, &WorkerFactory::new()).unwrap();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let order = order.clone();
            pool.add_after_execute(Arc::new(move |_, _| {
                order.lock().unwrap().push(tag);
            }));
        }

        let info = TaskInfo::new("probe");
        pool.after_execute(&info, None);
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_observer_panic_does_not_abort_the_rest() {
        let pool = Pool::new(1, &WorkerFactory::new()).unwrap();
        let reached = Arc::new(AtomicUsize::new(0));

        pool.add_after_execute(Arc::new(|_, _| panic!("observer boom")));
        let seen = reached.clone();
        pool.add_after_execute(Arc::new(move |_, _| {
            seen.fetch_add(1, Ordering::SeqCst);
        }));

        pool.after_execute(&TaskInfo::new("probe"), None);
        assert_eq!(reached.load(Ordering::SeqCst), 1);
    }
}
