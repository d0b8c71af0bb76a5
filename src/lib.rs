//! # tasksmith
//!
//! **Tasksmith** is a task-execution helper library for Rust.
//!
//! Describe a unit of work (an async action or a value-producing
//! computation), configure how it runs (immediately, after a delay,
//! repeatedly at an interval, or one-shot with a timeout), and configure how
//! its outcome is observed - without managing worker pools or future polling
//! yourself. A companion [`try_async`] module offers try/catch/finally style
//! wrapping with typed handlers, finalizers, and auto-closed resources.
//!
//! The central guarantee: no task silently loses an uncaught failure or
//! panic. Every firing is panic-wrapped, every failure is routed to a
//! consumer or to the process-wide sink, and after-execute observers see
//! every outcome.
//!
//! ## Architecture
//! ```text
//!                       ThreadBuilder
//!        ┌───────────┬──────┴───────────┬─────────────────────┐
//!   execution()  computation()     scheduling()   scheduled_computation()
//!        │           │                  │                     │
//!        └───────────┴───────┬──────────┴─────────────────────┘
//!                            ▼ start()
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  validate config ─► materialize Pool (lazy) ─► resolve Schedule   │
//! │  ─► dispatch: submit_now | submit_after | submit_periodic |       │
//! │               submit_with_timeout (+ watchdog)                    │
//! └──────────────────────────────┬────────────────────────────────────┘
//!                                ▼ per firing, on the worker
//!             run body (panic-wrapped, cancellable)
//!               ├─ Ok  ──► result consumer (compute family)
//!               └─ Err ──► uncaught consumer │ default sink
//!                          (Canceled swallowed when silenced)
//!             after-execute observers, in registration order
//!                                │
//!                                ▼
//!                      TaskHandle (join / cancel)
//! ```
//!
//! ## Features
//! | Area            | Description                                              | Key types                                    |
//! |-----------------|----------------------------------------------------------|----------------------------------------------|
//! | **Builders**    | Fluent submission: body, timing, consumers, pool sizing. | [`ThreadBuilder`], [`TimingActionBuilder`]   |
//! | **Scheduling**  | Delay, fixed-rate interval, timeout with watchdog.       | [`TaskHandle`], [`MIN_SCHEDULE_DELAY`]       |
//! | **Pool**        | Fixed-size workers, after-execute observer list.         | [`Pool`], [`WorkerFactory`], [`TaskInfo`]    |
//! | **Try-async**   | Typed catch, finalizers, auto-closed resources.          | [`try_async::TryAsyncBuilder`], [`Closable`] |
//! | **Errors**      | Typed submission-time and execution-time failures.       | [`ConfigError`], [`TaskError`]               |
//! | **Sink**        | Process-wide default destination for unconsumed failures.| [`set_failure_sink`]                         |
//!
//! ## Example
//! ```no_run
//! use std::time::Duration;
//! use tasksmith::ThreadBuilder;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // A computation with a 2s timeout, interrupted if it overruns.
//!     let handle = ThreadBuilder::scheduled_computation::<u64>()
//!         .with_fn(|_ctx| async {
//!             // ... expensive work ...
//!             Ok(42)
//!         })
//!         .with_timeout(Duration::from_secs(2))
//!         .with_may_interrupt(true)
//!         .with_result_consumer(|answer| println!("answer: {answer}"))
//!         .start()?;
//!
//!     let answer = handle.join()?;
//!     assert_eq!(answer, 42);
//!     Ok(())
//! }
//! ```

mod builder;
mod error;
mod pool;
mod sink;
mod work;

pub mod try_async;

// ---- Public re-exports ----

pub use builder::{
    ActionBuilder, ComputeBuilder, ResultConsumer, TaskHandle, ThreadBuilder,
    TimingActionBuilder, TimingComputeBuilder, UncaughtConsumer, MIN_SCHEDULE_DELAY,
};
pub use error::{ConfigError, DynError, TaskError};
pub use pool::{AfterExecuteFn, NameSupplier, Pool, PrioritySupplier, TaskInfo, WorkerFactory};
pub use sink::{failure_sink, set_failure_sink, FailureSink};
pub use try_async::Closable;
pub use work::{Work, WorkFn, WorkOnce, WorkRef};
