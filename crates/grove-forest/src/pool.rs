//! Bounded worker pool for independent per-tree units.

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::debug;

use crate::error::ForestError;

/// A unit that failed, tagged with its position in the input sequence.
#[derive(Debug)]
pub struct UnitFailure<E> {
    /// Zero-based index of the failing unit.
    pub index: usize,
    /// The unit's error.
    pub error: E,
}

/// A fixed-size pool of worker threads.
///
/// Units run concurrently up to the pool size; extra units wait for a free
/// worker. Results come back in input order regardless of completion order.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    worker_limit: usize,
}

impl WorkerPool {
    /// Build a pool with `worker_limit` threads.
    ///
    /// # Errors
    ///
    /// | Variant                              | When                       |
    /// |--------------------------------------|----------------------------|
    /// | [`ForestError::InvalidWorkerLimit`]  | `worker_limit` is zero     |
    /// | [`ForestError::ThreadPool`]          | threads cannot be spawned  |
    pub fn new(worker_limit: usize) -> Result<Self, ForestError> {
        if worker_limit == 0 {
            return Err(ForestError::InvalidWorkerLimit { worker_limit });
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(worker_limit)
            .thread_name(|i| format!("grove-worker-{i}"))
            .build()
            .map_err(|source| ForestError::ThreadPool {
                worker_limit,
                source,
            })?;
        Ok(Self { pool, worker_limit })
    }

    /// Run every unit and return their results in input order.
    ///
    /// All units run to completion. If any failed, the failure with the
    /// lowest index is returned, so the reported error does not depend on
    /// scheduling.
    pub fn run_parallel<T, E, F>(&self, units: Vec<F>) -> Result<Vec<T>, UnitFailure<E>>
    where
        F: FnOnce() -> Result<T, E> + Send,
        T: Send,
        E: Send,
    {
        let n_units = units.len();
        debug!(n_units, worker_limit = self.worker_limit, "dispatching units");

        let outcomes: Vec<Result<T, E>> = self
            .pool
            .install(|| units.into_par_iter().map(|unit| unit()).collect());

        let mut results = Vec::with_capacity(n_units);
        for (index, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(value) => results.push(value),
                Err(error) => return Err(UnitFailure { index, error }),
            }
        }
        Ok(results)
    }
}
