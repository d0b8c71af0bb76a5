//! One-shot computation builder: value-producing bodies.

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

/// Builder for one-shot computations (`Work<T>` with a value).
///
/// Mirrors [`ActionBuilder`](crate::ActionBuilder) plus a result consumer
/// invoked with the produced value. The value is also available through
/// [`TaskHandle::join`].
pub struct ComputeBuilder<T> {
    common: CommonConfig<T>,
    work: Option<WorkRef<T>>,
}

impl<T: Send + 'static> ComputeBuilder<T> {
    pub(crate) fn new() -> Self {
        Self {
            common: CommonConfig::new(),
            work: None,
        }
    }

    pub(crate) fn chained(common: CommonConfig<T>) -> Self {
        Self { common, work: None }
    }

    /// Sets the body to execute.
    pub fn with_work(mut self, work: WorkRef<T>) -> Self {
        self.work = Some(work);
        self
    }

    /// Sets the body from an async closure.
    pub fn with_fn<F, Fut>(self, f: F) -> Self
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
    {
        self.with_work(WorkFn::arc(f))
    }

    /// Sets the body from a one-shot closure that may own moved state.
    pub fn with_once<F, Fut>(self, f: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
    {
        self.with_work(WorkOnce::arc(f))
    }

    /// Consumer invoked with the computed value on success.
    pub fn with_result_consumer(mut self, f: impl Fn(&T) + Send + Sync + 'static) -> Self {
        self.common.result_consumer = Some(Arc::new(f));
        self
    }

    pub fn with_pool_size(mut self, size: usize) -> Self {
        self.common.pool_size = size;
        self
    }

    pub fn with_pool(mut self, pool: Arc<Pool>) -> Self {
        self.common.pool = Some(pool);
        self
    }

    pub fn with_name_fn(mut self, f: impl Fn() -> String + Send + Sync + 'static) -> Self {
        self.common.name_fn = Some(Arc::new(f));
        self
    }

    pub fn with_priority_fn(mut self, f: impl Fn() -> i32 + Send + Sync + 'static) -> Self {
        self.common.priority_fn = Some(Arc::new(f));
        self
    }

    pub fn with_uncaught_consumer(mut self, f: impl Fn(&TaskError) + Send + Sync + 'static) -> Self {
        self.common.uncaught = Some(Arc::new(f));
        self
    }

    pub fn with_after_execute(
        mut self,
        f: impl Fn(&TaskInfo, Option<&TaskError>) + Send + Sync + 'static,
    ) -> Self {
        self.common.after_execute.push(Arc::new(f));
        self
    }

    pub fn with_may_interrupt(mut self, may_interrupt: bool) -> Self {
        self.common.may_interrupt = may_interrupt;
        self
    }

    pub fn with_silent_interruption(mut self, silent: bool) -> Self {
        self.common.silent_interruption = silent;
        self
    }

    /// Validates the configuration, materializes the pool if needed, and
    /// submits. Never blocks.
    pub fn start(mut self) -> Result<TaskHandle<T>, ConfigError> {
        dispatch::start(&mut self.common, self.work.take(), Schedule::NoSchedule)
    }

    /// Like [`start`](Self::start), but also returns a fresh builder that
    /// shares this submission's pool and worker settings.
    pub fn start_and_build_other(mut self) -> Result<(TaskHandle<T>, Self), ConfigError> {
        let handle = dispatch::start(&mut self.common, self.work.take(), Schedule::NoSchedule)?;
        let next = Self::chained(self.common.chained());
        Ok((handle, next))
    }
}
