//! Configuration shared by every builder flavor.
//!
//! [`CommonConfig`] holds the fields that apply to all submissions: pool
//! sizing, worker naming and priority, the completion consumers, the
//! after-execute observers, and the interruption flags. The concrete
//! builders own one of these and delegate their setters to it; `start()`
//! calls [`CommonConfig::materialize_pool`] to turn the accumulated fields
//! into a live [`Pool`].
//!
//! ## Rules
//! - Setters are last-write-wins; no setter validates.
//! - The pool is created lazily at the first `start()`, sized by `pool_size`,
//!   unless an explicit pool was supplied or inherited from a previous
//!   submission in the same chain.
//! - After-execute observers accumulate on the pool at `start()`; sharing a
//!   pool across chained submissions shares the observer list.

use std::sync::Arc;

use crate::builder::dispatch::{self, RouteCtx};
use crate::error::{ConfigError, TaskError};
use crate::pool::{AfterExecuteFn, NameSupplier, Pool, PrioritySupplier, TaskInfo, WorkerFactory};

/// Consumer for failures that reach the top of a submission.
pub type UncaughtConsumer = Arc<dyn Fn(&TaskError) + Send + Sync>;

/// Consumer for a computation's successful value.
pub type ResultConsumer<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Default worker count for lazily created pools.
pub(crate) const DEFAULT_POOL_SIZE: usize = 1;

pub(crate) struct CommonConfig<T> {
    pub pool_size: usize,
    pub pool: Option<Arc<Pool>>,
    pub name_fn: Option<NameSupplier>,
    pub priority_fn: Option<PrioritySupplier>,
    pub uncaught: Option<UncaughtConsumer>,
    pub result_consumer: Option<ResultConsumer<T>>,
    pub after_execute: Vec<AfterExecuteFn>,
    pub may_interrupt: bool,
    pub silent_interruption: bool,
}

impl<T> CommonConfig<T> {
    pub(crate) fn new() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            pool: None,
            name_fn: None,
            priority_fn: None,
            uncaught: None,
            result_consumer: None,
            after_execute: Vec::new(),
            may_interrupt: false,
            silent_interruption: false,
        }
    }

    /// Resolves the pool for this submission: the explicit/inherited one if
    /// present, a fresh one otherwise. Pending after-execute observers are
    /// drained onto the pool either way.
    pub(crate) fn materialize_pool(&mut self) -> Result<Arc<Pool>, ConfigError> {
        if self.pool.is_none() {
            let mut factory = WorkerFactory::new();
            if let Some(name_fn) = &self.name_fn {
                let name_fn = Arc::clone(name_fn);
                factory = factory.with_name_fn(move || name_fn());
            }
            if let Some(priority_fn) = &self.priority_fn {
                let priority_fn = Arc::clone(priority_fn);
                factory = factory.with_priority_fn(move || priority_fn());
            }
            self.pool = Some(Pool::new(self.pool_size, &factory)?);
        }

        let pool = Arc::clone(self.pool.as_ref().expect("pool materialized above"));
        for observer in self.after_execute.drain(..) {
            pool.add_after_execute(observer);
        }
        Ok(pool)
    }

    /// Freezes the consumer fields into the snapshot a driver runs with.
    pub(crate) fn route_ctx(&self) -> RouteCtx<T> {
        let name = match &self.name_fn {
            Some(name_fn) => name_fn(),
            None => dispatch::default_task_name(),
        };
        RouteCtx {
            info: TaskInfo::new(name),
            uncaught: self.uncaught.clone(),
            result_consumer: self.result_consumer.clone(),
            silent_interruption: self.silent_interruption,
        }
    }

    /// Carries pool and worker settings into the next builder of a chain.
    /// Body and consumers do not travel; each submission sets its own.
    pub(crate) fn chained<U>(&self) -> CommonConfig<U> {
        CommonConfig {
            pool_size: self.pool_size,
            pool: self.pool.clone(),
            name_fn: self.name_fn.clone(),
            priority_fn: self.priority_fn.clone(),
            uncaught: None,
            result_consumer: None,
            after_execute: Vec::new(),
            may_interrupt: self.may_interrupt,
            silent_interruption: self.silent_interruption,
        }
    }
}
