//! Thread pools used by the server to run one job per accepted connection.

use crate::Result;

mod shared_queue;

pub use self::shared_queue::SharedQueueThreadPool;

/// The functionality every thread pool provides to the server.
pub trait ThreadPool: Send + Sync + 'static {
    /// Creates a new thread pool, immediately spawning the specified number of threads.
    ///
    /// # Errors
    /// Returns an error if `threads` is zero or if any thread fails to spawn. All previously
    /// spawned threads are shut down.
    fn new(threads: u32) -> Result<Self>
    where
        Self: Sized;

    /// Queues a job to be run by one of the pool's threads.
    ///
    /// Never blocks on queue capacity. A job that panics does not take its thread down.
    ///
    /// # Errors
    /// Returns [`KvError::PoolShutdown`](crate::KvError::PoolShutdown) if the pool has no
    /// threads left to run the job.
    fn spawn<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static;

    /// Stops the pool once every queued job has run, and blocks until all threads have exited.
    ///
    /// The pool is consumed, so nothing can be spawned onto it afterwards.
    fn shutdown(self)
    where
        Self: Sized;
}

/// Returns the default number of worker threads: one per available hardware thread, or 1 if
/// that cannot be determined.
pub fn default_threads() -> u32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(1)
}
