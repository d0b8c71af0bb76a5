//! Error types used by the tasksmith builders and task executions.
//!
//! This module defines two main error enums:
//!
//! - [`ConfigError`] — submission-time errors, reported synchronously by `start()`.
//! - [`TaskError`] — execution-time failures, routed through consumers and the sink.
//!
//! Both types provide `as_label` helpers for logging, and [`TaskError`]
//! additionally exposes [`TaskError::is_interruption`] which drives the
//! silent-interruption policy.

use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Boxed dynamic error produced by fallible task bodies and resource closes.
pub type DynError = Box<dyn Error + Send + Sync>;

/// # Errors raised at submission time.
///
/// These represent invalid builder configurations. They are fatal, never
/// retried, and are returned synchronously from `start()`/`execute()` before
/// any pool or worker is created.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// `start()` was called without an execution body.
    #[error("no execution body was set before start")]
    MissingExecution,

    /// The pool was configured with zero workers.
    #[error("pool size must be at least 1")]
    ZeroPoolSize,

    /// A fixed-rate schedule was configured with a delay below the minimum.
    #[error("delay {delay:?} is below the scheduling minimum {min:?}")]
    DelayBelowMinimum {
        /// The configured delay.
        delay: Duration,
        /// The enforced minimum.
        min: Duration,
    },

    /// A fixed-rate schedule was configured with an interval below the minimum.
    #[error("interval {interval:?} is below the scheduling minimum {min:?}")]
    IntervalBelowMinimum {
        /// The configured interval.
        interval: Duration,
        /// The enforced minimum.
        min: Duration,
    },

    /// The backing runtime could not be built.
    #[error("failed to build worker pool: {0}")]
    PoolBuild(#[from] std::io::Error),
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::MissingExecution => "config_missing_execution",
            ConfigError::ZeroPoolSize => "config_zero_pool_size",
            ConfigError::DelayBelowMinimum { .. } => "config_delay_below_minimum",
            ConfigError::IntervalBelowMinimum { .. } => "config_interval_below_minimum",
            ConfigError::PoolBuild(_) => "config_pool_build",
        }
    }
}

/// # Failures produced by task execution.
///
/// These never propagate synchronously to the caller of `start()`; they are
/// routed to the uncaught-exception consumer (or the process-wide sink),
/// surfaced through [`TaskHandle::join`](crate::TaskHandle::join), and passed
/// to after-execute observers.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum TaskError {
    /// The body returned an error. Carries the typed source so handler
    /// tables can match on the concrete error type.
    #[error("execution failed: {0}")]
    Fail(#[source] Arc<dyn Error + Send + Sync>),

    /// The body exceeded a configured timeout and was cancelled.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The timeout that was exceeded.
        timeout: Duration,
    },

    /// The body panicked; the panic was caught on the worker.
    #[error("execution panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// The task was cancelled before or during execution.
    ///
    /// This is the interruption signal suppressed by the
    /// silent-interruption policy.
    #[error("task canceled")]
    Canceled,
}

impl TaskError {
    /// Wraps a typed error as an execution failure.
    pub fn fail(error: impl Error + Send + Sync + 'static) -> Self {
        TaskError::Fail(Arc::new(error))
    }

    /// Wraps an already-boxed error as an execution failure.
    pub fn from_dyn(error: DynError) -> Self {
        TaskError::Fail(Arc::from(error))
    }

    /// Builds an execution failure from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        TaskError::Fail(Arc::new(Message(message.into())))
    }

    /// Returns the typed source of a [`TaskError::Fail`], if any.
    pub fn source_err(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        match self {
            TaskError::Fail(e) => Some(e.as_ref()),
            _ => None,
        }
    }

    /// True for cancellation-caused failures.
    ///
    /// The silent-interruption policy swallows exactly these.
    pub fn is_interruption(&self) -> bool {
        matches!(self, TaskError::Canceled)
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail(_) => "task_failed",
            TaskError::Timeout { .. } => "task_timeout",
            TaskError::Panicked { .. } => "task_panicked",
            TaskError::Canceled => "task_canceled",
        }
    }
}

/// Plain string error for [`TaskError::msg`].
#[derive(Debug)]
struct Message(String);

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Error for Message {}
