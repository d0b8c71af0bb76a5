//! Submission dispatch: one free function per resolved timing mode.
//!
//! `start()` resolves the builder's configuration into a [`Schedule`] and
//! hands it here. Each function spawns one driver task on the pool; the
//! driver runs firings, invokes the after-execute observer list once per
//! firing, and routes the outcome to the configured consumers. The caller
//! gets a [`TaskHandle`] immediately and never blocks.
//!
//! ## Firing pipeline (on the driver, per firing)
//! ```text
//! sleep(delay) / ticker.tick()        cancellable wait
//!   └─► run_guarded(body)             panic-wrapped, optionally interruptible
//!         └─► route(outcome)          result consumer | uncaught consumer | sink
//!               └─► pool.after_execute(info, err)   observers, in order
//! ```
//!
//! Cancellation that lands while still waiting (before the body ever ran)
//! skips the observer list: nothing executed, so there is no "after execute".

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::builder::common::{CommonConfig, ResultConsumer, UncaughtConsumer};
use crate::builder::handle::TaskHandle;
use crate::builder::schedule::Schedule;
use crate::error::{ConfigError, TaskError};
use crate::pool::{Pool, TaskInfo};
use crate::sink;
use crate::work::{Work, WorkRef};

/// Counter behind default task names.
static TASK_SEQ: AtomicU64 = AtomicU64::new(0);

pub(crate) fn default_task_name() -> String {
    format!("task-{}", TASK_SEQ.fetch_add(1, Ordering::Relaxed))
}

/// Consumer snapshot handed to a driver at submission time.
///
/// The configuration is frozen from here on; later builder mutation (there
/// is none, `start` consumes the builder) could not affect a running task.
pub(crate) struct RouteCtx<T> {
    pub info: TaskInfo,
    pub uncaught: Option<UncaughtConsumer>,
    pub result_consumer: Option<ResultConsumer<T>>,
    pub silent_interruption: bool,
}

impl<T> RouteCtx<T> {
    /// Routes one firing's outcome per the completion policy:
    /// value → result consumer; failure → uncaught consumer or the
    /// process-wide sink; interruption → swallowed when silenced.
    fn route(&self, info: &TaskInfo, outcome: &Result<T, TaskError>) {
        match outcome {
            Ok(value) => {
                if let Some(consumer) = &self.result_consumer {
                    consumer(value);
                }
            }
            Err(err) if self.silent_interruption && err.is_interruption() => {
                log::debug!("silenced interruption; task={}", info.name());
            }
            Err(err) => match &self.uncaught {
                Some(consumer) => consumer(err),
                None => (sink::failure_sink())(info, err),
            },
        }
    }
}

/// Common `start()` path for every builder flavor: validate, materialize
/// the pool, freeze the consumer snapshot, submit.
pub(crate) fn start<T: Send + 'static>(
    common: &mut CommonConfig<T>,
    work: Option<WorkRef<T>>,
    schedule: Schedule,
) -> Result<TaskHandle<T>, ConfigError> {
    let work = work.ok_or(ConfigError::MissingExecution)?;
    let pool = common.materialize_pool()?;
    let ctx = common.route_ctx();
    let token = CancellationToken::new();
    let (driver, watchdog) = submit(&pool, work, ctx, schedule, common.may_interrupt, token.clone());
    Ok(TaskHandle::new(pool, driver, token, watchdog))
}

/// Dispatches a submission according to its resolved schedule.
pub(crate) fn submit<T: Send + 'static>(
    pool: &Arc<Pool>,
    work: WorkRef<T>,
    ctx: RouteCtx<T>,
    schedule: Schedule,
    may_interrupt: bool,
    token: CancellationToken,
) -> (JoinHandle<Result<T, TaskError>>, Option<JoinHandle<()>>) {
    match schedule {
        Schedule::NoSchedule => (submit_now(pool, work, ctx, may_interrupt, token), None),
        Schedule::Delay(delay) => (
            submit_after(pool, work, ctx, delay, may_interrupt, token),
            None,
        ),
        Schedule::DelayTimeout { delay, timeout } => {
            submit_with_timeout(pool, work, ctx, delay, timeout, may_interrupt, token)
        }
        Schedule::DelayInterval { delay, interval } => (
            submit_periodic(pool, work, ctx, delay, interval, may_interrupt, token),
            None,
        ),
    }
}

/// Immediate one-shot submission.
fn submit_now<T: Send + 'static>(
    pool: &Arc<Pool>,
    work: WorkRef<T>,
    ctx: RouteCtx<T>,
    may_interrupt: bool,
    token: CancellationToken,
) -> JoinHandle<Result<T, TaskError>> {
    submit_after(pool, work, ctx, Duration::ZERO, may_interrupt, token)
}

/// One-shot submission after a delay.
fn submit_after<T: Send + 'static>(
    pool: &Arc<Pool>,
    work: WorkRef<T>,
    ctx: RouteCtx<T>,
    delay: Duration,
    may_interrupt: bool,
    token: CancellationToken,
) -> JoinHandle<Result<T, TaskError>> {
    let pool_ref = Arc::clone(pool);
    pool.spawn(async move {
        if !wait_delay(delay, &token).await {
            let outcome = Err(TaskError::Canceled);
            ctx.route(&ctx.info, &outcome);
            return outcome;
        }

        let outcome = run_guarded(work.as_ref(), &token, may_interrupt).await;
        let info = ctx.info.at_firing(1);
        ctx.route(&info, &outcome);
        pool_ref.after_execute(&info, outcome.as_ref().err());
        outcome
    })
}

/// One-shot submission raced by an independent watchdog that cancels the
/// main task `timeout` after its scheduled start, honoring `may_interrupt`.
fn submit_with_timeout<T: Send + 'static>(
    pool: &Arc<Pool>,
    work: WorkRef<T>,
    ctx: RouteCtx<T>,
    delay: Duration,
    timeout: Duration,
    may_interrupt: bool,
    token: CancellationToken,
) -> (JoinHandle<Result<T, TaskError>>, Option<JoinHandle<()>>) {
    let started = Arc::new(AtomicBool::new(false));
    let done = Arc::new(AtomicBool::new(false));
    let timed_out = Arc::new(AtomicBool::new(false));

    let watchdog = {
        let token = token.clone();
        let started = Arc::clone(&started);
        let done = Arc::clone(&done);
        let timed_out = Arc::clone(&timed_out);
        pool.spawn(async move {
            tokio::time::sleep(delay + timeout).await;
            if done.load(Ordering::Acquire) {
                return;
            }
            // Without may-interrupt, a body that already started is left to
            // finish; cancellation then only wins the not-yet-started race.
            if may_interrupt || !started.load(Ordering::Acquire) {
                timed_out.store(true, Ordering::Release);
                token.cancel();
            }
        })
    };

    let pool_ref = Arc::clone(pool);
    let driver = pool.spawn(async move {
        if !wait_delay(delay, &token).await {
            let outcome = Err(timeout_or_cancel(&timed_out, timeout));
            ctx.route(&ctx.info, &outcome);
            return outcome;
        }

        started.store(true, Ordering::Release);
        let mut outcome = run_guarded(work.as_ref(), &token, may_interrupt).await;
        done.store(true, Ordering::Release);

        if matches!(outcome, Err(TaskError::Canceled)) && timed_out.load(Ordering::Acquire) {
            outcome = Err(TaskError::Timeout { timeout });
        }

        let info = ctx.info.at_firing(1);
        ctx.route(&info, &outcome);
        pool_ref.after_execute(&info, outcome.as_ref().err());
        outcome
    });

    (driver, Some(watchdog))
}

/// Fixed-rate submission: first firing at `delay`, then every `interval`.
/// Firings are serialized on the driver; a slow body delays later ticks
/// rather than overlapping them.
fn submit_periodic<T: Send + 'static>(
    pool: &Arc<Pool>,
    work: WorkRef<T>,
    ctx: RouteCtx<T>,
    delay: Duration,
    interval: Duration,
    may_interrupt: bool,
    token: CancellationToken,
) -> JoinHandle<Result<T, TaskError>> {
    let pool_ref = Arc::clone(pool);
    pool.spawn(async move {
        let start = tokio::time::Instant::now() + delay;
        let mut ticker = tokio::time::interval_at(start, interval);
        let mut firing: u64 = 0;

        loop {
            tokio::select! {
                _ = token.cancelled() => return Err(TaskError::Canceled),
                _ = ticker.tick() => {}
            }

            firing += 1;
            let outcome = run_guarded(work.as_ref(), &token, may_interrupt).await;
            let info = ctx.info.at_firing(firing);
            let failed = outcome.as_ref().err();
            ctx.route(&info, &outcome);
            pool_ref.after_execute(&info, failed);

            if token.is_cancelled() {
                return Err(TaskError::Canceled);
            }
        }
    })
}

/// Cancellable delay; returns false if cancellation won the race.
async fn wait_delay(delay: Duration, token: &CancellationToken) -> bool {
    if delay.is_zero() {
        return !token.is_cancelled();
    }
    tokio::select! {
        _ = token.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

fn timeout_or_cancel(timed_out: &AtomicBool, timeout: Duration) -> TaskError {
    if timed_out.load(Ordering::Acquire) {
        TaskError::Timeout { timeout }
    } else {
        TaskError::Canceled
    }
}

/// Runs one firing with panic capture.
///
/// With `may_interrupt` the body races the cancellation token and is dropped
/// mid-flight on cancel; without it the body always runs to completion.
async fn run_guarded<T: Send + 'static>(
    work: &dyn Work<T>,
    token: &CancellationToken,
    may_interrupt: bool,
) -> Result<T, TaskError> {
    let body = AssertUnwindSafe(work.run(token.child_token())).catch_unwind();

    if may_interrupt {
        tokio::select! {
            _ = token.cancelled() => Err(TaskError::Canceled),
            caught = body => unwrap_panic(caught),
        }
    } else {
        unwrap_panic(body.await)
    }
}

fn unwrap_panic<T>(
    caught: Result<Result<T, TaskError>, Box<dyn Any + Send>>,
) -> Result<T, TaskError> {
    match caught {
        Ok(outcome) => outcome,
        Err(payload) => Err(TaskError::Panicked {
            info: panic_message(payload),
        }),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "opaque panic payload".to_string()
    }
}
