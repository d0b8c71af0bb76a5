//! # Builder hierarchy: task submission and scheduling.
//!
//! [`ThreadBuilder`] is the single entry point; it hands out one of four
//! builder flavors depending on whether the body produces a value and
//! whether it needs timing:
//!
//! ```text
//!                ThreadBuilder
//!        ┌───────────┼────────────────┬───────────────────────┐
//!   execution()  computation::<T>()  scheduling()  scheduled_computation::<T>()
//!        │           │                │                       │
//!  ActionBuilder  ComputeBuilder   TimingActionBuilder  TimingComputeBuilder
//!   (one-shot)    (one-shot, T)    (delay/interval/      (delay/timeout, T)
//!                                   timeout)
//! ```
//!
//! ## Rules
//! - Setters are last-write-wins; nothing validates or allocates before
//!   `start()`.
//! - `start()` validates, lazily creates the pool, submits, and returns a
//!   [`TaskHandle`] without blocking.
//! - `start_and_build_other()` additionally returns a fresh builder sharing
//!   the submission's pool, for chaining related tasks onto one pool.
//! - Repetition is action-only: the compute builders have no interval setter.

mod action;
mod common;
mod compute;
mod dispatch;
mod handle;
mod schedule;
mod timing_action;
mod timing_compute;

pub use action::ActionBuilder;
pub use common::{ResultConsumer, UncaughtConsumer};
pub use compute::ComputeBuilder;
pub use handle::TaskHandle;
pub use schedule::MIN_SCHEDULE_DELAY;
pub use timing_action::TimingActionBuilder;
pub use timing_compute::TimingComputeBuilder;

/// Entry point for building task submissions.
///
/// Each method returns a fresh builder of the matching flavor; see the
/// module docs for the map.
pub struct ThreadBuilder;

impl ThreadBuilder {
    /// One-shot action: side effects only, submitted immediately.
    pub fn execution() -> ActionBuilder {
        ActionBuilder::new()
    }

    /// One-shot computation producing a `T`.
    pub fn computation<T: Send + 'static>() -> ComputeBuilder<T> {
        ComputeBuilder::new()
    }

    /// Scheduled action: delay, fixed-rate interval, or timeout.
    pub fn scheduling() -> TimingActionBuilder {
        TimingActionBuilder::new()
    }

    /// Scheduled computation: delay or timeout (no repetition).
    pub fn scheduled_computation<T: Send + 'static>() -> TimingComputeBuilder<T> {
        TimingComputeBuilder::new()
    }
}
