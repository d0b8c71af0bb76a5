//! One-shot action builder: side-effecting bodies, no schedule.

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::builder::common::CommonConfig;
use crate::builder::dispatch;
use crate::builder::handle::TaskHandle;
use crate::builder::schedule::Schedule;
use crate::error::{ConfigError, TaskError};
use crate::pool::{Pool, TaskInfo};
use crate::work::{WorkFn, WorkOnce, WorkRef};

/// Builder for one-shot, immediately submitted actions (`Work<()>`).
///
/// Obtained through [`ThreadBuilder::execution`](crate::ThreadBuilder::execution).
/// All setters are last-write-wins and nothing is validated or created until
/// [`start`](Self::start).
///
/// # Example
/// ```no_run
/// use tasksmith::ThreadBuilder;
///
/// let handle = ThreadBuilder::execution()
///     .with_fn(|_ctx| async { Ok(()) })
///     .with_uncaught_consumer(|err| eprintln!("task failed: {err}"))
///     .start()?;
/// handle.join()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct ActionBuilder {
    common: CommonConfig<()>,
    work: Option<WorkRef<()>>,
}

impl ActionBuilder {
    pub(crate) fn new() -> Self {
        Self {
            common: CommonConfig::new(),
            work: None,
        }
    }

    pub(crate) fn chained(common: CommonConfig<()>) -> Self {
        Self { common, work: None }
    }

    /// Sets the body to execute.
    pub fn with_work(mut self, work: WorkRef<()>) -> Self {
        self.work = Some(work);
        self
    }

    /// Sets the body from an async closure.
    pub fn with_fn<F, Fut>(self, f: F) -> Self
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        self.with_work(WorkFn::arc(f))
    }

    /// Sets the body from a one-shot closure that may own moved state.
    pub fn with_once<F, Fut>(self, f: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        self.with_work(WorkOnce::arc(f))
    }

    /// Worker count for the lazily created pool. Ignored when an explicit
    /// pool is supplied.
    pub fn with_pool_size(mut self, size: usize) -> Self {
        self.common.pool_size = size;
        self
    }

    /// Submits onto an existing pool instead of creating one.
    pub fn with_pool(mut self, pool: Arc<Pool>) -> Self {
        self.common.pool = Some(pool);
        self
    }

    /// Supplier for worker thread names and the task's display name.
    pub fn with_name_fn(mut self, f: impl Fn() -> String + Send + Sync + 'static) -> Self {
        self.common.name_fn = Some(Arc::new(f));
        self
    }

    /// Supplier for worker thread priority (unix niceness).
    pub fn with_priority_fn(mut self, f: impl Fn() -> i32 + Send + Sync + 'static) -> Self {
        self.common.priority_fn = Some(Arc::new(f));
        self
    }

    /// Consumer for failures that reach the top of the submission. Without
    /// one, failures go to the process-wide sink.
    pub fn with_uncaught_consumer(mut self, f: impl Fn(&TaskError) + Send + Sync + 'static) -> Self {
        self.common.uncaught = Some(Arc::new(f));
        self
    }

    /// Registers an after-execute observer on the submission's pool.
    pub fn with_after_execute(
        mut self,
        f: impl Fn(&TaskInfo, Option<&TaskError>) + Send + Sync + 'static,
    ) -> Self {
        self.common.after_execute.push(Arc::new(f));
        self
    }

    /// Whether cancellation may abort a body that already started.
    pub fn with_may_interrupt(mut self, may_interrupt: bool) -> Self {
        self.common.may_interrupt = may_interrupt;
        self
    }

    /// Swallows interruption outcomes instead of routing them as failures.
    pub fn with_silent_interruption(mut self, silent: bool) -> Self {
        self.common.silent_interruption = silent;
        self
    }

    /// Validates the configuration, materializes the pool if needed, and
    /// submits. Never blocks.
    pub fn start(mut self) -> Result<TaskHandle<()>, ConfigError> {
        dispatch::start(&mut self.common, self.work.take(), Schedule::NoSchedule)
    }

    /// Like [`start`](Self::start), but also returns a fresh builder that
    /// shares this submission's pool and worker settings. The new builder
    /// has no body and no consumers of its own.
    pub fn start_and_build_other(mut self) -> Result<(TaskHandle<()>, Self), ConfigError> {
        let handle = dispatch::start(&mut self.common, self.work.take(), Schedule::NoSchedule)?;
        let next = Self::chained(self.common.chained());
        Ok((handle, next))
    }
}
