//! Fork-join evaluation over a fixed worker pool.

use anyhow::{bail, Context, Result};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::num::NonZeroUsize;
use std::thread;

/// A bounded set of worker threads that evaluates independent jobs with a
/// static, stride-based assignment.
///
/// Worker `i` of `N` handles job indices `i, i + N, i + 2N, ...`, so the
/// results never depend on scheduling. With a single worker every job runs
/// inline on the calling thread.
#[derive(Debug)]
pub struct WorkerPool {
    workers: usize,
    pool: Option<ThreadPool>,
}

impl WorkerPool {
    /// Builds a pool with `threads` workers, or one per available hardware
    /// thread when `None`.
    pub fn new(threads: Option<usize>) -> Result<Self> {
        let workers = match threads {
            Some(0) => bail!("Worker count must be at least 1."),
            Some(count) => count,
            None => thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
        };
        if workers == 1 {
            return Ok(Self::serial());
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("pendulum-worker-{index}"))
            .build()
            .with_context(|| format!("Failed to start {workers} worker threads."))?;
        Ok(Self {
            workers,
            pool: Some(pool),
        })
    }

    /// A pool that runs everything on the calling thread.
    pub fn serial() -> Self {
        Self {
            workers: 1,
            pool: None,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Evaluates `job(index)` for every index in `0..len` and returns the
    /// results in index order. Blocks until every worker is done.
    pub fn strided_map<T, F>(&self, len: usize, job: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize) -> T + Sync,
    {
        let Some(pool) = &self.pool else {
            return (0..len).map(job).collect();
        };

        let workers = self.workers;
        let lanes: Vec<Vec<T>> = pool.install(|| {
            (0..workers)
                .into_par_iter()
                .map(|lane| (lane..len).step_by(workers).map(&job).collect())
                .collect()
        });

        // Interleave the lanes back into index order.
        let mut lanes: Vec<_> = lanes.into_iter().map(Vec::into_iter).collect();
        (0..len)
            .filter_map(|index| lanes[index % workers].next())
            .collect()
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::serial()
    }
}

#[cfg(test)]
mod tests {
    use super::WorkerPool;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::thread;

    #[test]
    fn rejects_zero_workers() {
        let err = WorkerPool::new(Some(0)).expect_err("zero workers should fail");
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn default_pool_uses_available_parallelism() {
        let pool = WorkerPool::new(None).expect("pool should build");
        assert!(pool.workers() >= 1);
    }

    #[test]
    fn results_come_back_in_index_order() {
        for threads in [1, 2, 3, 8] {
            let pool = WorkerPool::new(Some(threads)).expect("pool should build");
            let squares = pool.strided_map(17, |i| i * i);
            assert_eq!(squares, (0..17).map(|i| i * i).collect::<Vec<_>>());
        }
    }

    #[test]
    fn handles_fewer_jobs_than_workers() {
        let pool = WorkerPool::new(Some(8)).expect("pool should build");
        assert_eq!(pool.strided_map(3, |i| i + 1), vec![1, 2, 3]);
        assert!(pool.strided_map(0, |i| i).is_empty());
    }

    #[test]
    fn every_job_runs_exactly_once() {
        let pool = WorkerPool::new(Some(4)).expect("pool should build");
        let seen = Mutex::new(Vec::new());
        pool.strided_map(100, |i| seen.lock().expect("lock").push(i));
        let seen = seen.into_inner().expect("lock");
        assert_eq!(seen.len(), 100);
        assert_eq!(seen.into_iter().collect::<HashSet<_>>().len(), 100);
    }

    #[test]
    fn multi_worker_pool_runs_off_the_calling_thread() {
        let caller = thread::current().id();
        let pool = WorkerPool::new(Some(2)).expect("pool should build");
        let ids = pool.strided_map(4, |_| thread::current().id());
        assert!(ids.iter().all(|id| *id != caller));
    }
}
