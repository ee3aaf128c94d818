//! Bounded worker pool.
//!
//! The pool knows nothing about connections; it executes anything that is
//! [`Runnable`]. Submission is non-blocking: a saturated queue hands the
//! task straight back so the caller can tear the connection down instead of
//! silently leaking it.

use std::io;
use std::sync::mpsc::{Receiver, SyncSender, TrySendError, sync_channel};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use tracing::debug;

/// Unit of work the pool can execute.
///
/// Each submitted task runs exactly once, unless it was rejected at
/// submission time or the pool is shutting down.
pub trait Runnable: Send {
    fn process(self);
}

pub struct WorkerPool<T: Runnable + 'static> {
    sender: Option<SyncSender<T>>,
    workers: Vec<JoinHandle<()>>,
}

impl<T: Runnable + 'static> WorkerPool<T> {
    /// Spawns `workers` threads sharing a queue of at most `queue_depth`
    /// pending tasks.
    pub fn new(workers: usize, queue_depth: usize) -> io::Result<Self> {
        let (sender, receiver) = sync_channel::<T>(queue_depth);
        let receiver = Arc::new(Mutex::new(receiver));
        let mut handles = Vec::with_capacity(workers);
        for i in 0..workers {
            let receiver = Arc::clone(&receiver);
            let handle = std::thread::Builder::new()
                .name(format!("worker-{i}"))
                .spawn(move || worker_loop(receiver))?;
            handles.push(handle);
        }
        Ok(Self {
            sender: Some(sender),
            workers: handles,
        })
    }

    /// Submits a task, handing it back when the queue is full or closed.
    pub fn submit(&self, task: T) -> Result<(), T> {
        let Some(sender) = &self.sender else {
            return Err(task);
        };
        sender.try_send(task).map_err(|e| match e {
            TrySendError::Full(task) => task,
            TrySendError::Disconnected(task) => task,
        })
    }
}

impl<T: Runnable + 'static> Drop for WorkerPool<T> {
    fn drop(&mut self) {
        // Closing the channel lets the workers drain and exit.
        self.sender.take();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                debug!("worker thread panicked");
            }
        }
    }
}

fn worker_loop<T: Runnable>(receiver: Arc<Mutex<Receiver<T>>>) {
    loop {
        let task = {
            let Ok(guard) = receiver.lock() else {
                break;
            };
            guard.recv()
        };
        match task {
            Ok(task) => task.process(),
            Err(_) => break,
        }
    }
}
