//! Result handle returned by `start()`.
//!
//! [`TaskHandle`] wraps the driver task spawned for one submission, the
//! submission's cancellation token, and - for timeout schedules - the
//! watchdog racing the main task. It owns a reference to the originating
//! pool, so the pool outlives the handle.
//!
//! One `start()` call produces exactly one handle. A periodic schedule
//! produces one handle whose driver represents the repeating task, not one
//! handle per firing.
//!
//! `start()` itself never blocks; blocking is the caller's explicit choice
//! through [`TaskHandle::join`].

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::pool::Pool;

/// Handle to an in-flight or completed submission.
pub struct TaskHandle<T> {
    pool: Arc<Pool>,
    driver: JoinHandle<Result<T, TaskError>>,
    token: CancellationToken,
    watchdog: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> TaskHandle<T> {
    pub(crate) fn new(
        pool: Arc<Pool>,
        driver: JoinHandle<Result<T, TaskError>>,
        token: CancellationToken,
        watchdog: Option<JoinHandle<()>>,
    ) -> Self {
        Self {
            pool,
            driver,
            token,
            watchdog,
        }
    }

    /// Requests cancellation of the submission.
    ///
    /// Whether a body that is already running gets aborted is governed by
    /// the builder's `may_interrupt_if_running` flag; with the flag unset,
    /// cancellation only takes effect before the body starts.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// True once cancellation was requested (by [`cancel`](Self::cancel) or
    /// a timeout watchdog).
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// True once the driver finished (any outcome).
    pub fn is_finished(&self) -> bool {
        self.driver.is_finished()
    }

    /// The pool backing this submission.
    pub fn pool(&self) -> &Arc<Pool> {
        &self.pool
    }

    /// Blocks until the submission finishes and returns its outcome.
    ///
    /// For a periodic schedule this returns only after the repeat loop ends,
    /// i.e. after cancellation; the outcome is then `Err(Canceled)`.
    ///
    /// Must be called from outside the pool's worker threads (e.g. the
    /// thread that called `start()`).
    pub fn join(self) -> Result<T, TaskError> {
        let outcome = match self.pool.block_on(self.driver) {
            Ok(outcome) => outcome,
            Err(join_err) if join_err.is_cancelled() => Err(TaskError::Canceled),
            Err(join_err) => Err(TaskError::Panicked {
                info: join_err.to_string(),
            }),
        };

        // The watchdog is pure cleanup once the main task is done.
        if let Some(watchdog) = self.watchdog {
            watchdog.abort();
        }

        outcome
    }
}
