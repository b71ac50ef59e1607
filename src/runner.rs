//! Generic single-consumer job queue with per-job status tracking
//!
//! An [`AsyncRunner`] owns one worker thread that drains a FIFO of
//! `(Id, J)` pairs. Producers on any thread post jobs and either return
//! immediately with the fresh ID or block until the job reaches a terminal
//! status. IDs come from one process-wide counter, so they are unique and
//! comparable across every runner in the process.

use std::collections::{HashMap, VecDeque};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex, RwLock};
use tracing::debug;

/// Identifier of a posted job. Unique within the process.
pub type Id = i64;

/// Reserved "no such job" identifier.
pub const INVALID_ID: Id = 0;

static NEXT_ID: AtomicI64 = AtomicI64::new(INVALID_ID);

fn alloc_id() -> Id {
    NEXT_ID.fetch_add(1, Ordering::SeqCst) + 1
}

fn latest_id() -> Id {
    NEXT_ID.load(Ordering::SeqCst)
}

/// Lifecycle state of a job.
///
/// A job walks `Pending -> Running -> Success | Failed` and never moves
/// backwards. `Invalid` is what [`AsyncRunner::status`] reports for IDs it
/// does not know (never issued, or wiped by [`AsyncRunner::clear`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Invalid,
    Pending,
    Running,
    Success,
    Failed,
}

impl Status {
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Success | Status::Failed)
    }
}

struct Shared<J> {
    queue: Mutex<VecDeque<(Id, J)>>,
    queue_cond: Condvar,
    running: AtomicBool,
    exit: AtomicBool,
    status: RwLock<HashMap<Id, Status>>,
    // Completion cursor: highest job ID known to have finished. wait(id)
    // sleeps until the cursor catches up with id.
    completed: Mutex<Id>,
    completed_cond: Condvar,
}

impl<J> Shared<J> {
    fn set_status(&self, id: Id, status: Status) {
        self.status.write().insert(id, status);
    }
}

/// Single-worker FIFO job runner.
///
/// Dropping the runner releases it: the worker finishes the job in hand,
/// then exits and is joined.
pub struct AsyncRunner<J> {
    shared: Arc<Shared<J>>,
    worker: Option<JoinHandle<()>>,
}

impl<J: Send + 'static> AsyncRunner<J> {
    /// Start the worker thread. `process` is invoked on the worker for
    /// every job in FIFO order; its boolean return decides `Success` vs
    /// `Failed`.
    pub fn new<F>(process: F) -> Self
    where
        F: FnMut(Id, J) -> bool + Send + 'static,
    {
        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::new()),
            queue_cond: Condvar::new(),
            running: AtomicBool::new(false),
            exit: AtomicBool::new(false),
            status: RwLock::new(HashMap::new()),
            completed: Mutex::new(INVALID_ID),
            completed_cond: Condvar::new(),
        });

        let worker = thread::spawn({
            let shared = Arc::clone(&shared);
            move || Self::working(shared, process)
        });

        Self {
            shared,
            worker: Some(worker),
        }
    }

    fn working<F>(shared: Arc<Shared<J>>, mut process: F)
    where
        F: FnMut(Id, J) -> bool,
    {
        loop {
            let (id, job) = {
                let mut queue = shared.queue.lock();
                loop {
                    if shared.exit.load(Ordering::SeqCst) {
                        return;
                    }
                    if let Some(entry) = queue.pop_front() {
                        break entry;
                    }
                    shared.running.store(false, Ordering::SeqCst);
                    shared.queue_cond.wait(&mut queue);
                }
            };

            shared.set_status(id, Status::Running);

            // A panicking job must not take the worker down with it.
            let ok = catch_unwind(AssertUnwindSafe(|| process(id, job))).unwrap_or(false);

            shared.set_status(id, if ok { Status::Success } else { Status::Failed });

            let mut completed = shared.completed.lock();
            // clear() may have pushed the cursor past us already.
            if id > *completed {
                *completed = id;
            }
            shared.completed_cond.notify_all();
        }
    }

    /// Enqueue a job and return its freshly allocated ID. With
    /// `block = true` the call only returns once the job has reached
    /// `Success` or `Failed` (or the runner was released).
    pub fn post(&self, job: J, block: bool) -> Id {
        let id;
        {
            let mut queue = self.shared.queue.lock();
            id = alloc_id();
            queue.push_back((id, job));
            self.shared.status.write().insert(id, Status::Pending);
            self.shared.running.store(true, Ordering::SeqCst);
            self.shared.queue_cond.notify_one();
        }

        if block {
            self.wait(id);
        }
        id
    }

    /// Block until a job with ID >= `id` has completed, or the runner is
    /// shutting down. Returns immediately if that already happened.
    pub fn wait(&self, id: Id) {
        let mut completed = self.shared.completed.lock();
        loop {
            // exit must be re-read under the lock: release() stores it
            // before notifying, so a waiter cannot sleep through shutdown.
            if id <= *completed || self.shared.exit.load(Ordering::SeqCst) {
                return;
            }
            self.shared.completed_cond.wait(&mut completed);
        }
    }

    /// Current status of `id`, or `Status::Invalid` for unknown IDs.
    pub fn status(&self, id: Id) -> Status {
        self.shared
            .status
            .read()
            .get(&id)
            .copied()
            .unwrap_or(Status::Invalid)
    }

    /// Drop every still-pending job, wipe the status map, and wake all
    /// waiters. The job currently in the worker's hands is unaffected.
    pub fn clear(&self) {
        debug!("clearing pending jobs");
        {
            let mut queue = self.shared.queue.lock();
            queue.clear();
            self.shared.queue_cond.notify_all();
        }
        {
            // Advance the cursor to the latest issued ID so every
            // outstanding wait() returns.
            let mut completed = self.shared.completed.lock();
            *completed = latest_id();
            self.shared.completed_cond.notify_all();
        }
        self.shared.status.write().clear();
    }

    /// True while the worker has a job in hand or the queue is non-empty.
    pub fn running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Signal the worker to exit after its current job and join it.
    /// Idempotent.
    pub fn release(&mut self) {
        self.shared.exit.store(true, Ordering::SeqCst);
        {
            let _queue = self.shared.queue.lock();
            self.shared.queue_cond.notify_all();
        }
        {
            let _completed = self.shared.completed.lock();
            self.shared.completed_cond.notify_all();
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }

    /// Visit every still-pending job. Advisory snapshot: the queue is
    /// locked for the duration of the call.
    pub fn for_each(&self, mut f: impl FnMut(Id, &J)) {
        let queue = self.shared.queue.lock();
        for (id, job) in queue.iter() {
            f(*id, job);
        }
    }
}

impl<J> Drop for AsyncRunner<J> {
    fn drop(&mut self) {
        self.shared.exit.store(true, Ordering::SeqCst);
        {
            let _queue = self.shared.queue.lock();
            self.shared.queue_cond.notify_all();
        }
        {
            let _completed = self.shared.completed.lock();
            self.shared.completed_cond.notify_all();
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[test]
    fn test_ids_unique_and_positive_across_threads() {
        let runner = Arc::new(AsyncRunner::new(|_, _: u32| true));
        let ids = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let runner = Arc::clone(&runner);
            let ids = Arc::clone(&ids);
            handles.push(thread::spawn(move || {
                for job in 0..25 {
                    let id = runner.post(job, false);
                    ids.lock().push(id);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let mut ids = ids.lock().clone();
        assert_eq!(ids.len(), 100);
        assert!(ids.iter().all(|&id| id > INVALID_ID));
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_fifo_execution_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let runner = AsyncRunner::new({
            let seen = Arc::clone(&seen);
            move |id, _: u32| {
                seen.lock().push(id);
                true
            }
        });

        let mut posted = Vec::new();
        for job in 0..20 {
            posted.push(runner.post(job, false));
        }
        runner.wait(*posted.last().unwrap());

        assert_eq!(*seen.lock(), posted);
    }

    #[test]
    fn test_blocking_post_returns_terminal() {
        let runner = AsyncRunner::new(|_, _: u32| {
            thread::sleep(Duration::from_millis(10));
            true
        });
        let id = runner.post(1, true);
        assert_eq!(runner.status(id), Status::Success);
    }

    #[test]
    fn test_status_lifecycle_and_failure() {
        let runner = AsyncRunner::new(|_, job: bool| job);

        let ok = runner.post(true, true);
        assert_eq!(runner.status(ok), Status::Success);

        let bad = runner.post(false, true);
        assert_eq!(runner.status(bad), Status::Failed);
    }

    #[test]
    fn test_panic_marks_failed() {
        let runner = AsyncRunner::new(|_, job: u32| {
            if job == 13 {
                panic!("boom");
            }
            true
        });

        let id = runner.post(13, true);
        assert_eq!(runner.status(id), Status::Failed);

        // Worker survives the panic.
        let next = runner.post(1, true);
        assert_eq!(runner.status(next), Status::Success);
    }

    #[test]
    fn test_unknown_id_is_invalid() {
        let runner = AsyncRunner::new(|_, _: u32| true);
        assert_eq!(runner.status(999_999_999), Status::Invalid);
        assert_eq!(runner.status(INVALID_ID), Status::Invalid);
    }

    #[test]
    fn test_wait_returns_after_completion() {
        let runner = Arc::new(AsyncRunner::new(|_, _: u32| {
            thread::sleep(Duration::from_millis(5));
            true
        }));
        let id = runner.post(1, false);

        let waiter = thread::spawn({
            let runner = Arc::clone(&runner);
            move || runner.wait(id)
        });
        waiter.join().unwrap();
        assert!(runner.status(id).is_terminal());
    }

    #[test]
    fn test_clear_drops_pending_jobs() {
        let processed = Arc::new(AtomicUsize::new(0));
        let runner = AsyncRunner::new({
            let processed = Arc::clone(&processed);
            move |_, _: u32| {
                processed.fetch_add(1, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(50));
                true
            }
        });

        let mut ids = Vec::new();
        for job in 0..100 {
            ids.push(runner.post(job, false));
        }
        runner.clear();

        // Only what was already in flight may still reach the processor.
        runner.wait(*ids.last().unwrap());
        assert!(processed.load(Ordering::SeqCst) <= 2);
        assert_eq!(runner.status(ids[50]), Status::Invalid);
        assert_eq!(runner.status(*ids.last().unwrap()), Status::Invalid);
    }

    #[test]
    fn test_release_is_idempotent_and_unblocks_waiters() {
        let mut runner = AsyncRunner::new(|_, _: u32| {
            thread::sleep(Duration::from_millis(20));
            true
        });
        runner.post(1, false);
        runner.release();
        runner.release();

        // After release, waiting on an ID that never ran must not hang.
        runner.wait(i64::MAX);
    }

    #[test]
    fn test_running_reflects_queue_state() {
        let runner = AsyncRunner::new(|_, _: u32| {
            thread::sleep(Duration::from_millis(20));
            true
        });
        assert!(!runner.running());
        let id = runner.post(1, false);
        assert!(runner.running());
        runner.wait(id);
        // Give the worker a moment to park again.
        thread::sleep(Duration::from_millis(20));
        assert!(!runner.running());
    }

    #[test]
    fn test_for_each_sees_pending_jobs() {
        let runner = AsyncRunner::new(|_, _: u32| {
            thread::sleep(Duration::from_millis(50));
            true
        });
        runner.post(0, false);
        for job in 1..=5 {
            runner.post(job, false);
        }

        let mut seen = 0;
        runner.for_each(|id, _| {
            assert!(id > INVALID_ID);
            seen += 1;
        });
        assert!(seen <= 6);
    }
}
