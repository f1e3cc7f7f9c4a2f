//! Thread state: the suspended call stack
//!
//! A `Thread` holds everything one logical asynchronous operation needs to
//! resume:
//! - tasks: stack of suspended frames, top = most recently called
//! - handlers: stack of catch registrations, keyed by the depth that
//!   installed them
//!
//! Every operation returns a new `Thread`; the receiver is never mutated.
//! That makes a snapshot captured by `resolve` safe to resume independently
//! of any later transitions on other copies.

use super::task::{ResumeFn, Task};
use super::values::Val;
use crate::scheduler::Scheduler;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Default deferral applied by `resolve`
pub const DEFAULT_RESOLVE_DELAY: Duration = Duration::from_millis(1);

/* ===================== Handler ===================== */

/// One catch registration
///
/// `depth` is the index of the frame that entered the try-region; a fault
/// unwinds the task stack back to that frame and resumes it at `catch_pos`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handler {
    pub catch_pos: u32,
    pub depth: usize,
}

/* ===================== Thread ===================== */

/// The full suspended call stack for one logical asynchronous operation
///
/// Treat the public fields as read-only; go through the operations below for
/// every transition.
#[derive(Debug, Clone)]
pub struct Thread {
    /// Identity shared by every copy of this logical thread (for tracing)
    pub id: Uuid,

    /// Stack of suspended frames
    pub tasks: Vec<Task>,

    /// Stack of catch registrations
    pub handlers: Vec<Handler>,

    /// Deferral applied by `resolve`
    pub resolve_delay: Duration,

    sched: Scheduler,
}

impl Thread {
    /// Create an empty thread bound to a scheduler
    pub fn new(sched: &Scheduler) -> Self {
        Self {
            id: Uuid::new_v4(),
            tasks: Vec::new(),
            handlers: Vec::new(),
            resolve_delay: DEFAULT_RESOLVE_DELAY,
            sched: sched.clone(),
        }
    }

    /// Copy with a different `resolve` deferral
    pub fn with_resolve_delay(&self, delay: Duration) -> Thread {
        let mut copy = self.clone();
        copy.resolve_delay = delay;
        copy
    }

    /// The scheduler this thread resolves through
    pub fn scheduler(&self) -> &Scheduler {
        &self.sched
    }

    /* ===================== Accessors ===================== */

    /// The top frame, if any
    pub fn last(&self) -> Option<&Task> {
        self.tasks.last()
    }

    /// Number of active frames
    pub fn depth(&self) -> usize {
        self.tasks.len()
    }

    /// Resume position of the top frame
    pub fn pos(&self) -> u32 {
        self.top("pos").pos
    }

    /// Last completed sub-call value seen by the top frame
    pub fn res(&self) -> &Val {
        &self.top("res").res
    }

    /// Inbound error of the top frame, present when resuming inside a catch
    pub fn error(&self) -> Option<&Val> {
        self.top("error").err.as_ref()
    }

    /// Read a variable from the top frame; missing names read as `Val::Null`
    pub fn get_var(&self, name: &str) -> Val {
        self.top("get_var")
            .vars
            .get(name)
            .cloned()
            .unwrap_or(Val::Null)
    }

    /// Strict variable read: `None` when the top frame never bound `name`
    pub fn try_get_var(&self, name: &str) -> Option<&Val> {
        self.top("try_get_var").vars.get(name)
    }

    /* ===================== Stack operations ===================== */

    /// Push a new frame for an asynchronous sub-call
    ///
    /// The callee starts at position 0; when it completes via `ret`, its
    /// value binds under `res_name` in this frame's variables.
    pub fn call(&self, f: ResumeFn, res_name: impl Into<String>) -> Thread {
        let mut copy = self.clone();
        copy.tasks.push(Task::new(0, f, res_name));
        copy
    }

    /// Pop the top frame and hand `value` back to the caller
    ///
    /// The value binds under the popped frame's `res_name` in the parent's
    /// variables and becomes the parent's `res`. A bottom frame has no
    /// caller; its value is dropped and the thread completes.
    pub fn ret(&self, value: Val) -> Thread {
        let Some(finished) = self.tasks.last() else {
            panic!("ret on an empty task stack");
        };

        let mut copy = self.clone();
        copy.tasks.pop();

        if self.tasks.len() >= 2 {
            let parent_idx = self.tasks.len() - 2;
            let parent = self.tasks[parent_idx]
                .with_var(finished.res_name.clone(), value.clone())
                .with_res(value);
            copy.tasks[parent_idx] = parent;
        }
        copy
    }

    /// Pop the top frame, discarding its result
    pub fn ret_void(&self) -> Thread {
        if self.tasks.is_empty() {
            panic!("ret_void on an empty task stack");
        }
        let mut copy = self.clone();
        copy.tasks.pop();
        copy
    }

    /// Replace the top frame's resume position, variables intact
    pub fn jump(&self, pos: u32) -> Thread {
        self.map_last("jump", |task| task.with_pos(pos))
    }

    /// Functionally update a variable in the top frame
    pub fn set_var(&self, name: impl Into<String>, value: Val) -> Thread {
        self.map_last("set_var", |task| task.with_var(name, value))
    }

    /* ===================== Catch handlers ===================== */

    /// Register a catch handler anchored at the current top frame
    pub fn catch_push(&self, catch_pos: u32) -> Thread {
        if self.tasks.is_empty() {
            panic!("catch_push on an empty task stack");
        }
        let mut copy = self.clone();
        copy.handlers.push(Handler {
            catch_pos,
            depth: self.tasks.len() - 1,
        });
        copy
    }

    /// Remove the most recently registered handler
    pub fn catch_pop(&self) -> Thread {
        let mut copy = self.clone();
        if copy.handlers.pop().is_none() {
            panic!("catch_pop with no registered handler");
        }
        copy
    }

    /* ===================== Deferred resumption ===================== */

    /// Schedule `ret(value)` on a snapshot of this thread
    ///
    /// Returns immediately; the captured snapshot re-enters the driver from
    /// the timer queue after the thread's resolve delay. Later transitions on
    /// other copies do not affect the snapshot.
    pub fn resolve(&self, value: Val) {
        self.resolve_after(self.resolve_delay, value);
    }

    /// Schedule `ret(value)` on a snapshot after an explicit delay
    pub fn resolve_after(&self, delay: Duration, value: Val) {
        let snapshot = self.clone();
        tracing::debug!(
            thread = %self.id,
            delay_ms = delay.as_millis() as u64,
            "scheduling deferred resumption"
        );
        self.sched.schedule(delay, move || {
            super::exec_loop::run(snapshot.ret(value));
        });
    }

    /* ===================== Internals ===================== */

    fn top(&self, op: &str) -> &Task {
        match self.tasks.last() {
            Some(task) => task,
            None => panic!("{op} on a thread with no frames"),
        }
    }

    fn map_last(&self, op: &str, f: impl FnOnce(&Task) -> Task) -> Thread {
        if self.tasks.is_empty() {
            panic!("{op} on an empty task stack");
        }
        let mut copy = self.clone();
        let idx = copy.tasks.len() - 1;
        copy.tasks[idx] = f(&self.tasks[idx]);
        copy
    }
}

impl PartialEq for Thread {
    /// Structural equality over identity, frames and handlers; the scheduler
    /// handle does not participate
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.tasks == other.tasks && self.handlers == other.handlers
    }
}
