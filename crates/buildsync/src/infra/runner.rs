//! Thread-pool task runner for synchronization jobs.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use parking_lot::{Condvar, Mutex};
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::app::dispatch::{Task, TaskRunner};
use crate::infra::config::Config;

#[derive(Debug, Default)]
struct InFlight {
    count: Mutex<usize>,
    idle: Condvar,
}

impl InFlight {
    fn start(&self) {
        *self.count.lock() += 1;
    }

    fn finish(&self) {
        let mut count = self.count.lock();
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.idle.notify_all();
        }
    }
}

/// Marks a task finished when dropped, including while unwinding.
struct FinishGuard(Arc<InFlight>);

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.0.finish();
    }
}

/// Runs submitted tasks on a dedicated rayon pool without waiting for them.
pub struct PoolRunner {
    pool: ThreadPool,
    in_flight: Arc<InFlight>,
}

impl PoolRunner {
    pub fn new(workers: usize, thread_prefix: &str) -> Result<Self> {
        let prefix = thread_prefix.to_owned();
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(move |index| format!("{prefix}-{index}"))
            .panic_handler(|_payload| {
                tracing::error!("synchronization task panicked outside its handler");
            })
            .build()
            .context("failed to start synchronization worker pool")?;
        Ok(Self {
            pool,
            in_flight: Arc::new(InFlight::default()),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.dispatch.workers, &config.dispatch.thread_prefix)
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Block until every submitted task has finished or `timeout` elapses.
    ///
    /// Returns `true` when the runner drained. Only hosts that must outlive their tasks,
    /// such as a command-line process about to exit, need this.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let mut count = self.in_flight.count.lock();
        if *count == 0 {
            return true;
        }
        let result = self
            .in_flight
            .idle
            .wait_while_for(&mut count, |count| *count > 0, timeout);
        !result.timed_out()
    }
}

impl TaskRunner for PoolRunner {
    fn submit(&self, task: Task) {
        self.in_flight.start();
        let guard = FinishGuard(Arc::clone(&self.in_flight));
        self.pool.spawn(move || {
            let _guard = guard;
            task();
        });
    }
}
