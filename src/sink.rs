//! Process-wide default failure sink.
//!
//! Whenever a task fails and no uncaught-exception consumer was registered on
//! its builder, the failure is delivered here so it is never silently
//! dropped. The sink is process-wide state with explicit one-time
//! initialization and a lock-free read path.
//!
//! ## Rules
//! - [`set_failure_sink`] succeeds at most once per process (first caller wins).
//! - [`failure_sink`] may be called concurrently from any worker thread.
//! - Before initialization the fallback sink logs through `log::error!`.

use std::sync::Arc;
use std::sync::OnceLock;

use crate::error::TaskError;
use crate::pool::TaskInfo;

/// Shared consumer invoked with a failed task's info and error.
pub type FailureSink = Arc<dyn Fn(&TaskInfo, &TaskError) + Send + Sync>;

static SINK: OnceLock<FailureSink> = OnceLock::new();

/// Installs the process-wide default failure sink.
///
/// Returns `false` if a sink was already installed; the existing sink is kept.
/// Configure this once at process start, before building tasks.
pub fn set_failure_sink(sink: FailureSink) -> bool {
    SINK.set(sink).is_ok()
}

/// Returns the installed sink, or the logging fallback if none was set.
pub fn failure_sink() -> FailureSink {
    match SINK.get() {
        Some(sink) => Arc::clone(sink),
        None => Arc::new(log_failure),
    }
}

/// Fallback sink: structured error log, one line per failure.
fn log_failure(info: &TaskInfo, err: &TaskError) {
    log::error!(
        "task={} firing={} label={} error={}",
        info.name(),
        info.firing(),
        err.as_label(),
        err
    );
}
