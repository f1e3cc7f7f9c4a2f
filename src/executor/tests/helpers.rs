//! Test helpers for executor tests
//!
//! Common utilities for building threads and canned resume functions

use crate::executor::errors::ErrorInfo;
use crate::executor::{Flow, ResumeFn, Thread, Val, resume_fn};
use crate::scheduler::Scheduler;

/// Fresh empty thread on its own scheduler
pub fn thread() -> Thread {
    Thread::new(&Scheduler::new())
}

/// Resume function that immediately returns `value`
pub fn returns(value: Val) -> ResumeFn {
    resume_fn(move |thread: Thread| Ok(Flow::Next(thread.ret(value.clone()))))
}

/// Resume function that always raises
pub fn raises(code: &str, message: &str) -> ResumeFn {
    let err = ErrorInfo::new(code, message);
    resume_fn(move |_thread: Thread| Err(err.clone()))
}
