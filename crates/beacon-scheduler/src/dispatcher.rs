//! Timer sequencer: one dedicated thread fires one-shot tasks at their deadline.
//!
//! The deadline queue lives behind a mutex shared with callers so that
//! `cancel` is synchronous. The crossbeam channel only wakes the worker when
//! the queue head may have moved, or asks it to exit.

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

/// A one-shot unit of work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Identifies a scheduled task for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

impl TaskHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

/// Runs tasks after a delay. Implementations must never run a task inline
/// from `schedule`.
pub trait TaskDispatcher: Send + Sync {
    fn schedule(&self, delay: Duration, task: Task) -> TaskHandle;

    /// Remove a task that has not started. Returns whether it was removed.
    fn cancel(&self, handle: TaskHandle) -> bool;
}

enum Wake {
    QueueChanged,
    Shutdown,
}

#[derive(Default)]
struct TimerQueue {
    by_deadline: BTreeMap<(Instant, u64), Task>,
    deadlines: HashMap<u64, Instant>,
}

impl TimerQueue {
    fn insert(&mut self, id: u64, deadline: Instant, task: Task) {
        self.by_deadline.insert((deadline, id), task);
        self.deadlines.insert(id, deadline);
    }

    fn remove(&mut self, id: u64) -> bool {
        match self.deadlines.remove(&id) {
            Some(deadline) => self.by_deadline.remove(&(deadline, id)).is_some(),
            None => false,
        }
    }

    /// Pop every task due at `now`, and report the next deadline.
    fn take_due(&mut self, now: Instant) -> (Vec<(u64, Task)>, Option<Instant>) {
        let mut due = Vec::new();
        while let Some(entry) = self.by_deadline.first_entry() {
            if entry.key().0 > now {
                break;
            }
            let ((_, id), task) = entry.remove_entry();
            self.deadlines.remove(&id);
            due.push((id, task));
        }
        let next = self.by_deadline.keys().next().map(|(deadline, _)| *deadline);
        (due, next)
    }

    fn clear(&mut self) -> usize {
        let count = self.by_deadline.len();
        self.by_deadline.clear();
        self.deadlines.clear();
        count
    }
}

struct Shared {
    queue: Mutex<TimerQueue>,
    next_id: AtomicU64,
}

impl Shared {
    fn queue(&self) -> MutexGuard<'_, TimerQueue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Dedicated-thread implementation of [`TaskDispatcher`].
pub struct WorkerDispatcher {
    shared: Arc<Shared>,
    wake: Sender<Wake>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl WorkerDispatcher {
    /// Spawn the worker thread under `name`.
    pub fn new(name: &str) -> io::Result<Self> {
        let shared = Arc::new(Shared {
            queue: Mutex::new(TimerQueue::default()),
            next_id: AtomicU64::new(1),
        });
        let (wake, rx) = crossbeam_channel::unbounded();
        let worker_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || worker_loop(worker_shared, rx))?;
        tracing::debug!(thread = name, "dispatcher started");
        Ok(Self {
            shared,
            wake,
            worker: Mutex::new(Some(handle)),
        })
    }

    /// Number of tasks waiting for their deadline.
    pub fn pending(&self) -> usize {
        self.shared.queue().by_deadline.len()
    }

    /// Stop the worker, join it, and drop every pending task.
    pub fn shutdown(&self) {
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(handle) = handle else {
            return;
        };
        let _ = self.wake.send(Wake::Shutdown);
        if handle.thread().id() == thread::current().id() {
            // Dropped from one of our own tasks; the loop exits after it returns.
            tracing::debug!("dispatcher shut down from its own thread");
        } else if handle.join().is_err() {
            tracing::warn!("dispatcher thread panicked");
        }
        let dropped = self.shared.queue().clear();
        if dropped > 0 {
            tracing::info!(dropped, "dropped pending tasks at dispatcher shutdown");
        }
    }
}

impl TaskDispatcher for WorkerDispatcher {
    fn schedule(&self, delay: Duration, task: Task) -> TaskHandle {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let deadline = Instant::now() + delay;
        self.shared.queue().insert(id, deadline, task);
        if self.wake.send(Wake::QueueChanged).is_err() {
            tracing::warn!(task_id = id, "dispatcher is shut down, task will not run");
        }
        TaskHandle(id)
    }

    fn cancel(&self, handle: TaskHandle) -> bool {
        let removed = self.shared.queue().remove(handle.0);
        if removed {
            let _ = self.wake.send(Wake::QueueChanged);
        }
        removed
    }
}

impl Drop for WorkerDispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(shared: Arc<Shared>, wake: Receiver<Wake>) {
    loop {
        let (due, next) = shared.queue().take_due(Instant::now());
        for (id, task) in due {
            run_task(id, task);
        }

        let signal = match next {
            Some(deadline) => {
                wake.recv_timeout(deadline.saturating_duration_since(Instant::now()))
            }
            None => wake.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        match signal {
            Ok(Wake::QueueChanged) | Err(RecvTimeoutError::Timeout) => continue,
            Ok(Wake::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    tracing::debug!("dispatcher stopped");
}

fn run_task(id: u64, task: Task) {
    tracing::trace!(task_id = id, "running task");
    if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
        tracing::warn!(task_id = id, "dispatched task panicked");
    }
}
