//! The concurrency seam. The scheduler needs exactly one primitive: run
//! a batch of independent jobs and hand the results back in order. The
//! production implementation fans out on the rayon pool; the sequential
//! one keeps tests deterministic.

use crate::context::Dynamic;

/// One scheduled unit of work, type-erased so executors stay object-safe.
pub type Job<'a> = Box<dyn FnOnce() -> Dynamic + Send + 'a>;

/// Runs batches of independent jobs.
pub trait Executor: Send + Sync {
    /// Executes every job and returns the results in job order.
    fn run_all<'a>(&self, jobs: Vec<Job<'a>>) -> Vec<Dynamic>;
}

/// Parallel executor on the global rayon pool.
#[derive(Default)]
pub struct RayonExecutor;

impl Executor for RayonExecutor {
    fn run_all<'a>(&self, jobs: Vec<Job<'a>>) -> Vec<Dynamic> {
        use rayon::iter::{IntoParallelIterator, ParallelIterator};

        jobs.into_par_iter().map(|job| job()).collect()
    }
}

/// In-order, single-threaded executor.
#[derive(Default)]
pub struct SequentialExecutor;

impl Executor for SequentialExecutor {
    fn run_all<'a>(&self, jobs: Vec<Job<'a>>) -> Vec<Dynamic> {
        jobs.into_iter().map(|job| job()).collect()
    }
}
