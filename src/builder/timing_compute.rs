//! Scheduling builder for computations: delay and timeout only.
//!
//! A value-producing body cannot repeat: one handle carries one value, and
//! there is no meaningful "result of firing three". The interval venue is
//! therefore absent from this builder entirely; the closest configurations
//! are a delayed one-shot or a timeout-bounded one-shot.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::builder::common::CommonConfig;
use crate::builder::dispatch;
use crate::builder::handle::TaskHandle;
use crate::builder::schedule::TimingConfig;
use crate::error::{ConfigError, TaskError};
use crate::pool::{Pool, TaskInfo};
use crate::work::{WorkFn, WorkOnce, WorkRef};

/// Builder for delayed or timeout-bounded computations.
///
/// Obtained through
/// [`ThreadBuilder::scheduled_computation`](crate::ThreadBuilder::scheduled_computation).
pub struct TimingComputeBuilder<T> {
    common: CommonConfig<T>,
    timing: TimingConfig,
    work: Option<WorkRef<T>>,
}

impl<T: Send + 'static> TimingComputeBuilder<T> {
    pub(crate) fn new() -> Self {
        Self {
            common: CommonConfig::new(),
            timing: TimingConfig::default(),
            work: None,
        }
    }

    pub(crate) fn chained(common: CommonConfig<T>) -> Self {
        Self {
            common,
            timing: TimingConfig::default(),
            work: None,
        }
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

    /// Delay before the firing.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.timing.set_delay(delay);
        self
    }

    /// Cancels the submission `delay + timeout` after `start()` if the body
    /// has not finished.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timing.set_timeout(timeout);
        self
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

    /// Resolves the timing fields into one schedule, validates, and submits.
    /// Never blocks.
    pub fn start(mut self) -> Result<TaskHandle<T>, ConfigError> {
        let schedule = self.timing.resolve()?;
        dispatch::start(&mut self.common, self.work.take(), schedule)
    }

    /// Like [`start`](Self::start), but also returns a fresh builder sharing
    /// this submission's pool and worker settings. Timing does not travel.
    pub fn start_and_build_other(mut self) -> Result<(TaskHandle<T>, Self), ConfigError> {
        let schedule = self.timing.resolve()?;
        let handle = dispatch::start(&mut self.common, self.work.take(), schedule)?;
        let next = Self::chained(self.common.chained());
        Ok((handle, next))
    }
}
