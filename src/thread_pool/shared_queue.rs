use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender};
use tracing::{debug, error, instrument};

use super::ThreadPool;
use crate::{KvError, Result};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A thread pool implemented with a shared job queue (i.e. channel).
///
/// This implementation uses the MPMC [`channel`] provided by the crossbeam crate.
/// Any number of producers may call [`spawn`](ThreadPool::spawn) through a shared reference,
/// and the threads in the pool are the consumers. The queue is unbounded.
///
/// If a spawned job panics, the panic is caught and logged and the thread moves on to the
/// next job, so the number of threads never changes while the pool is running.
///
/// [`channel`]: https://docs.rs/crossbeam/0.8.1/crossbeam/channel/index.html
pub struct SharedQueueThreadPool {
    /// the sending part of the channel, `None` once the pool is shutting down
    tx: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl ThreadPool for SharedQueueThreadPool {
    /// create a new "thread pool" with the given number of `threads`.
    /// Every thread created will have a handle to the receiving end of the channel
    fn new(threads: u32) -> Result<Self> {
        if threads == 0 {
            return Err(KvError::InvalidConfig(
                "a thread pool needs at least one thread".to_owned(),
            ));
        }

        let (tx, rx) = channel::unbounded::<Job>();
        let mut pool = SharedQueueThreadPool {
            tx: Some(tx),
            workers: Vec::with_capacity(threads as usize),
        };
        for id in 0..threads {
            let task_rx = rx.clone();
            // on error `pool` is dropped here, which joins the threads spawned so far
            let handle = thread::Builder::new()
                .name(format!("kv-worker-{}", id))
                .spawn(move || run_tasks(id, task_rx))?;
            pool.workers.push(handle);
        }
        debug!("created thread pool with {} threads", threads);

        Ok(pool)
    }

    /// Spawns a function into the thread pool.
    fn spawn<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let tx = self.tx.as_ref().ok_or(KvError::PoolShutdown)?;
        tx.send(Box::new(job)).map_err(|_| KvError::PoolShutdown)
    }

    fn shutdown(mut self) {
        self.join_workers();
    }
}

impl SharedQueueThreadPool {
    /// returns the number of threads in this pool
    pub fn threads(&self) -> usize {
        self.workers.len()
    }

    // Dropping the only sender disconnects the channel; receivers still get every job that
    // was queued before the disconnect, then see the error and exit.
    fn join_workers(&mut self) {
        drop(self.tx.take());
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                error!("a worker thread exited with a panic");
            }
        }
    }
}

impl Drop for SharedQueueThreadPool {
    fn drop(&mut self) {
        self.join_workers();
    }
}

/// this function waits for a task to arrive on its receiver, and then runs the task.
/// It returns once the channel is disconnected and drained.
#[instrument(skip(rx))]
fn run_tasks(id: u32, rx: Receiver<Job>) {
    while let Ok(task) = rx.recv() {
        debug!("received a new task");
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
            error!("task panicked: {}", panic_message(&*payload));
        }
    }
    debug!("thread exited because the thread pool was shut down");
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic payload"
    }
}
