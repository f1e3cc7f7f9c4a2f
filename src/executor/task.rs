//! Suspended call frame record
//!
//! A `Task` is one frame of a logical call stack: the resume position, the
//! resume function, and the variable bindings captured across suspension
//! points. Tasks are immutable; every state change produces a new value, so a
//! `Thread` snapshot captured by a deferred continuation can never be
//! corrupted by later transitions.

use super::errors::ErrorInfo;
use super::thread::Thread;
use super::values::Val;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/* ===================== Resume contract ===================== */

/// What a resume function hands back to the driver
#[derive(Debug)]
pub enum Flow {
    /// Keep driving this thread
    Next(Thread),
    /// Control was handed to a scheduled continuation; the driver stops
    Suspend,
}

/// Outcome of one dispatch of a resume function
///
/// `Err` carries a modeled error. It never bypasses the driver: the `run`
/// loop catches it and routes it through the handler stack.
pub type ResumeResult = Result<Flow, ErrorInfo>;

/// The callable associated with a frame
///
/// Must be total over every `pos` it can be resumed at, and must not retain
/// mutable references to the Thread across invocations.
pub type ResumeFn = Arc<dyn Fn(Thread) -> ResumeResult + Send + Sync>;

/// Wrap a closure as a resume function
pub fn resume_fn<F>(f: F) -> ResumeFn
where
    F: Fn(Thread) -> ResumeResult + Send + Sync + 'static,
{
    Arc::new(f)
}

/* ===================== Task ===================== */

/// One suspended call frame
#[derive(Clone)]
pub struct Task {
    /// Resume position, understood only by `f`
    pub pos: u32,

    /// The resume function
    pub f: ResumeFn,

    /// Variable bindings captured across suspension points
    pub vars: HashMap<String, Val>,

    /// Value produced by the most recently completed sub-call
    pub res: Val,

    /// Variable name in the parent frame that this frame's result binds to
    pub res_name: String,

    /// Inbound error, present when resuming inside a catch block
    pub err: Option<Val>,
}

impl Task {
    /// Create a frame at the initial position with empty bindings
    pub fn new(pos: u32, f: ResumeFn, res_name: impl Into<String>) -> Self {
        Self {
            pos,
            f,
            vars: HashMap::new(),
            res: Val::Null,
            res_name: res_name.into(),
            err: None,
        }
    }

    /// Copy with `vars` functionally updated; the receiver is untouched
    pub fn with_var(&self, name: impl Into<String>, value: Val) -> Task {
        let mut copy = self.clone();
        copy.vars.insert(name.into(), value);
        copy
    }

    /// Copy with a new resume position
    pub fn with_pos(&self, pos: u32) -> Task {
        let mut copy = self.clone();
        copy.pos = pos;
        copy
    }

    /// Copy with a new last-sub-call result
    pub fn with_res(&self, res: Val) -> Task {
        let mut copy = self.clone();
        copy.res = res;
        copy
    }

    /// Copy carrying an inbound error for catch-block resumption
    pub fn with_err(&self, err: Val) -> Task {
        let mut copy = self.clone();
        copy.err = Some(err);
        copy
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("pos", &self.pos)
            .field("vars", &self.vars)
            .field("res", &self.res)
            .field("res_name", &self.res_name)
            .field("err", &self.err)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Task {
    /// Structural equality; resume functions compare by identity
    fn eq(&self, other: &Self) -> bool {
        self.pos == other.pos
            && Arc::ptr_eq(&self.f, &other.f)
            && self.vars == other.vars
            && self.res == other.res
            && self.res_name == other.res_name
            && self.err == other.err
    }
}
