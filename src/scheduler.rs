//! Deferred-execution timer
//!
//! A dedicated timer thread owns a min-heap of scheduled jobs ordered by
//! deadline, with insertion order breaking ties so equal-delay jobs run in
//! FIFO order. `schedule` pushes an entry and wakes the thread; due jobs run
//! on the timer thread, one at a time, in deadline order.
//!
//! This is the event queue behind `Thread::resolve`: a resumed continuation
//! re-enters the driver from here, and may schedule further continuations
//! onto the same queue.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// One scheduled job
struct Entry {
    fire_at: Instant,
    seq: u64,
    job: Job,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    /// Reversed so the max-heap pops the earliest deadline; among equal
    /// deadlines, the lowest sequence number wins
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .fire_at
            .cmp(&self.fire_at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct State {
    heap: BinaryHeap<Entry>,
    next_seq: u64,
    closed: bool,
}

struct Inner {
    state: Mutex<State>,
    wakeup: Condvar,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Cheap cloneable handle to the timer thread
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

impl Scheduler {
    /// Start the timer thread and return a handle to it
    pub fn new() -> Self {
        let inner = Arc::new(Inner {
            state: Mutex::new(State {
                heap: BinaryHeap::new(),
                next_seq: 0,
                closed: false,
            }),
            wakeup: Condvar::new(),
            handle: Mutex::new(None),
        });

        let loop_inner = Arc::clone(&inner);
        let handle = thread::spawn(move || run_loop(&loop_inner));
        *inner
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handle);

        Scheduler { inner }
    }

    /// Enqueue `job` to run after `delay` on the timer thread
    ///
    /// Jobs with equal deadlines run in the order they were scheduled.
    pub fn schedule<F>(&self, delay: Duration, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = self.inner.lock_state();
        let seq = state.next_seq;
        state.next_seq += 1;
        state.heap.push(Entry {
            fire_at: Instant::now() + delay,
            seq,
            job: Box::new(job),
        });
        drop(state);
        self.inner.wakeup.notify_one();
    }

    /// Number of jobs still waiting to fire
    pub fn pending(&self) -> usize {
        self.inner.lock_state().heap.len()
    }

    /// Wait for the queue to drain, then stop the timer thread
    ///
    /// Jobs may keep scheduling follow-up work while draining; shutdown
    /// returns once the queue goes quiet. Dropping the last handle without
    /// calling this leaves the thread parked until process exit.
    pub fn shutdown(&self) {
        {
            let mut state = self.inner.lock_state();
            state.closed = true;
        }
        self.inner.wakeup.notify_all();

        let handle = self
            .inner
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::error!("timer thread panicked");
            }
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.pending())
            .finish()
    }
}

/// Timer thread body: pop due entries, run them, sleep until the next one
fn run_loop(inner: &Inner) {
    loop {
        let mut due: Vec<Job> = Vec::new();
        {
            let mut state = inner.lock_state();
            let now = Instant::now();

            while let Some(entry) = state.heap.peek() {
                if entry.fire_at > now {
                    break;
                }
                if let Some(entry) = state.heap.pop() {
                    due.push(entry.job);
                }
            }

            if due.is_empty() {
                if state.closed && state.heap.is_empty() {
                    return;
                }
                let wait = state
                    .heap
                    .peek()
                    .map(|entry| entry.fire_at.saturating_duration_since(now));
                match wait {
                    Some(timeout) => {
                        let (guard, _) = inner
                            .wakeup
                            .wait_timeout(state, timeout)
                            .unwrap_or_else(PoisonError::into_inner);
                        drop(guard);
                    }
                    None => {
                        let guard = inner
                            .wakeup
                            .wait(state)
                            .unwrap_or_else(PoisonError::into_inner);
                        drop(guard);
                    }
                }
                continue;
            }
        }

        for job in due {
            job();
        }
    }
}
