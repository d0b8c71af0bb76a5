//! Worker factory: thread naming, thread priority, and runtime construction.
//!
//! [`WorkerFactory`] is the leaf component that produces the worker threads
//! backing a [`Pool`](crate::Pool). It carries two first-class suppliers,
//! each invoked once per thread creation:
//!
//! - **name supplier** — returns the thread name; the default produces unique
//!   `tasksmith-worker-N` names from a global counter.
//! - **priority supplier** — returns a unix niceness value (-20..=19) applied
//!   on thread start; a no-op on non-unix targets.
//!
//! Thread creation is the only side effect here; no scheduling logic lives
//! in the factory. Uncaught failures never terminate a worker silently: every
//! firing is panic-wrapped by the dispatch layer and unconsumed failures are
//! forwarded to the process-wide sink.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::runtime::Runtime;

/// Global counter behind the default thread-name supplier.
static WORKER_SEQ: AtomicU64 = AtomicU64::new(0);

/// Supplier invoked once per thread creation to name the thread.
pub type NameSupplier = Arc<dyn Fn() -> String + Send + Sync>;

/// Supplier invoked once per thread creation to pick its niceness.
pub type PrioritySupplier = Arc<dyn Fn() -> i32 + Send + Sync>;

/// Factory for the worker threads backing a pool.
#[derive(Clone)]
pub struct WorkerFactory {
    name_fn: NameSupplier,
    priority_fn: Option<PrioritySupplier>,
}

impl Default for WorkerFactory {
    fn default() -> Self {
        Self {
            name_fn: Arc::new(default_thread_name),
            priority_fn: None,
        }
    }
}

impl WorkerFactory {
    /// Creates a factory with the default name supplier and no priority.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the thread-name supplier.
    ///
    /// The supplier runs once per created thread, so it may produce a
    /// different name each invocation.
    pub fn with_name_fn(mut self, f: impl Fn() -> String + Send + Sync + 'static) -> Self {
        self.name_fn = Arc::new(f);
        self
    }

    /// Sets the thread-priority supplier (unix niceness, -20..=19).
    pub fn with_priority_fn(mut self, f: impl Fn() -> i32 + Send + Sync + 'static) -> Self {
        self.priority_fn = Some(Arc::new(f));
        self
    }

    /// Builds the multi-threaded runtime that hosts the pool's workers.
    pub(crate) fn build_runtime(&self, size: usize) -> std::io::Result<Runtime> {
        let name_fn = Arc::clone(&self.name_fn);
        let mut builder = tokio::runtime::Builder::new_multi_thread();
        builder
            .worker_threads(size)
            .enable_time()
            .thread_name_fn(move || name_fn());

        if let Some(priority_fn) = self.priority_fn.clone() {
            builder.on_thread_start(move || apply_niceness(priority_fn()));
        }

        builder.build()
    }
}

fn default_thread_name() -> String {
    format!("tasksmith-worker-{}", WORKER_SEQ.fetch_add(1, Ordering::Relaxed))
}

#[cfg(unix)]
fn apply_niceness(nice: i32) {
    // PRIO_PROCESS with pid 0 targets the calling thread on Linux.
    let rc = unsafe { libc::setpriority(libc::PRIO_PROCESS, 0, nice) };
    if rc != 0 {
        log::warn!(
            "failed to set niceness {} for {}: {}",
            nice,
            std::thread::current().name().unwrap_or("worker"),
            std::io::Error::last_os_error()
        );
    }
}

#[cfg(not(unix))]
fn apply_niceness(_nice: i32) {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_default_names_are_unique() {
        let a = default_thread_name();
        let b = default_thread_name();
        assert_ne!(a, b);
        assert!(a.starts_with("tasksmith-worker-"));
    }

    #[test]
    fn test_name_supplier_runs_per_thread() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let factory = WorkerFactory::new().with_name_fn(move || {
            format!("probe-{}", seen.fetch_add(1, Ordering::SeqCst))
        });

        let rt = factory.build_runtime(2).expect("runtime");
        // Force both workers to spin up.
        rt.block_on(async {
            let names = (0..4)
                .map(|_| {
                    tokio::spawn(async {
                        std::thread::current().name().map(str::to_owned)
                    })
                })
                .collect::<Vec<_>>();
            for handle in names {
                let name = handle.await.unwrap().expect("thread name");
                assert!(name.starts_with("probe-"), "unexpected name {name}");
            }
        });
        assert!(calls.load(Ordering::SeqCst) >= 2);
    }
}
