//! Fixed-size worker pool for download and processing jobs
//!
//! Tasks may spawn further tasks while they run; the pool returns once every
//! task, including late additions, has finished. The first failing task stops
//! the pool: tasks that have not started yet are skipped and its error is
//! returned.

use anyhow::{anyhow, Context, Result};
use rayon::{Scope, ThreadPool, ThreadPoolBuilder};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::info;

/// Tasks faster than this aren't worth a progress line.
const SLOW_TASK: Duration = Duration::from_millis(100);

#[derive(Default)]
struct Progress {
    stopped: AtomicBool,
    error: Mutex<Option<anyhow::Error>>,
    scheduled: AtomicUsize,
    completed: AtomicUsize,
}

impl Progress {
    fn fail(&self, err: anyhow::Error) {
        self.stopped.store(true, Ordering::SeqCst);
        self.error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert(err);
    }
}

pub struct TaskQueue {
    pool: ThreadPool,
    progress: Progress,
}

/// Handle given to running tasks so they can schedule follow-ups.
pub struct Tasks<'s, 'scope> {
    scope: &'s Scope<'scope>,
    progress: &'scope Progress,
}

impl TaskQueue {
    pub fn new(workers: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("fgoplan-worker-{}", i))
            .build()
            .context("Failed to start worker pool")?;

        Ok(Self {
            pool,
            progress: Progress::default(),
        })
    }

    /// Run `seed`, which schedules the initial tasks, and wait for every task
    /// it leads to.
    pub fn run<'scope, F>(&'scope self, seed: F) -> Result<()>
    where
        F: FnOnce(&Tasks<'_, 'scope>) + Send,
    {
        let progress = &self.progress;
        self.pool.scope(|scope| seed(&Tasks { scope, progress }));

        match progress
            .error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl<'scope> Tasks<'_, 'scope> {
    /// Schedule a task.
    pub fn push<F>(&self, task: F)
    where
        F: FnOnce(&Tasks<'_, 'scope>) -> Result<()> + Send + 'scope,
    {
        let progress = self.progress;
        progress.scheduled.fetch_add(1, Ordering::SeqCst);

        self.scope.spawn(move |scope| {
            if progress.stopped.load(Ordering::SeqCst) {
                return;
            }

            let start = Instant::now();
            let tasks = Tasks { scope, progress };
            let result = panic::catch_unwind(AssertUnwindSafe(|| task(&tasks)))
                .unwrap_or_else(|_| Err(anyhow!("Worker task panicked")));
            let done = progress.completed.fetch_add(1, Ordering::SeqCst) + 1;

            if let Err(err) = result {
                progress.fail(err);
                return;
            }
            if start.elapsed() > SLOW_TASK {
                let total = progress.scheduled.load(Ordering::SeqCst);
                info!("Run {}/{} tasks", done, total);
            }
        });
    }
}
