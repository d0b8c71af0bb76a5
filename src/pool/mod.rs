//! Worker pool and thread factory.
//!
//! This module provides the execution substrate for the builders:
//! - [`WorkerFactory`] - worker thread construction (name/priority suppliers)
//! - [`Pool`] - fixed-size pool with the after-execute observer list
//! - [`TaskInfo`] - submission identity passed to observers and the sink

mod core;
mod factory;

pub use core::{AfterExecuteFn, Pool, TaskInfo};
pub use factory::{NameSupplier, PrioritySupplier, WorkerFactory};
