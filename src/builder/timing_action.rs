//! Scheduling builder for actions: delay, fixed-rate interval, timeout.
//!
//! Extends the one-shot action configuration with the three timing fields.
//! Timing resolution happens at `start()` per the rules in
//! [`schedule`](crate::builder::schedule):
//!
//! - delay alone delays a one-shot submission;
//! - an interval repeats the body at a fixed rate, first firing at the delay
//!   (or the enforced minimum when no delay was set);
//! - a timeout arms a watchdog that cancels the submission `delay + timeout`
//!   after `start()` if the body has not finished;
//! - interval and timeout are mutually exclusive venues; when both were
//!   configured the one set last wins.

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
use crate::work::{WorkFn, WorkRef};

/// Builder for scheduled actions.
///
/// Obtained through [`ThreadBuilder::scheduling`](crate::ThreadBuilder::scheduling).
///
/// # Example
/// ```no_run
/// use std::time::Duration;
/// use tasksmith::ThreadBuilder;
///
/// // Fire every 100ms, starting 50ms from now, until cancelled.
/// let handle = ThreadBuilder::scheduling()
///     .with_fn(|_ctx| async { Ok(()) })
///     .with_delay(Duration::from_millis(50))
///     .with_interval(Duration::from_millis(100))
///     .start()?;
/// handle.cancel();
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct TimingActionBuilder {
    common: CommonConfig<()>,
    timing: TimingConfig,
    work: Option<WorkRef<()>>,
}

impl TimingActionBuilder {
    pub(crate) fn new() -> Self {
        Self {
            common: CommonConfig::new(),
            timing: TimingConfig::default(),
            work: None,
        }
    }

    pub(crate) fn chained(common: CommonConfig<()>) -> Self {
        Self {
            common,
            timing: TimingConfig::default(),
            work: None,
        }
    }

    /// Sets the body to execute.
    ///
    /// With an interval configured, the body fires once per tick; it must be
    /// able to produce a fresh future each firing (see [`WorkFn`]).
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

    /// Delay before the (first) firing.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.timing.set_delay(delay);
        self
    }

    /// Fixed-rate repetition period. Mutually exclusive with the timeout;
    /// whichever was set last wins.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.timing.set_interval(interval);
        self
    }

    /// Cancels the submission `delay + timeout` after `start()` if the body
    /// has not finished. Mutually exclusive with the interval; whichever was
    /// set last wins.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timing.set_timeout(timeout);
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
    pub fn start(mut self) -> Result<TaskHandle<()>, ConfigError> {
        let schedule = self.timing.resolve()?;
        dispatch::start(&mut self.common, self.work.take(), schedule)
    }

    /// Like [`start`](Self::start), but also returns a fresh builder sharing
    /// this submission's pool and worker settings. Timing does not travel.
    pub fn start_and_build_other(mut self) -> Result<(TaskHandle<()>, Self), ConfigError> {
        let schedule = self.timing.resolve()?;
        let handle = dispatch::start(&mut self.common, self.work.take(), schedule)?;
        let next = Self::chained(self.common.chained());
        Ok((handle, next))
    }
}
