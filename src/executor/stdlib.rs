//! Library resume functions
//!
//! Factories for common leaf frames. Each returns a `ResumeFn` meant to be
//! pushed with `Thread::call`; the caller's frame receives the result under
//! its chosen `res_name`.

use super::errors::ErrorInfo;
use super::task::{resume_fn, Flow, ResumeFn};
use super::values::Val;
use std::time::Duration;

/// Completes immediately with `v`
pub fn value(v: Val) -> ResumeFn {
    resume_fn(move |thread| Ok(Flow::Next(thread.ret(v.clone()))))
}

/// Raises the modeled error `err` on first dispatch
pub fn fail(err: ErrorInfo) -> ResumeFn {
    resume_fn(move |_thread| Err(err.clone()))
}

/// Completes with `Null` after `ms` milliseconds
///
/// The first dispatch schedules the deferred resumption and suspends; the
/// timer re-enters the driver with `ret(Null)` applied to the captured
/// snapshot, which pops this frame and resumes the caller.
pub fn sleep(ms: u64) -> ResumeFn {
    resume_fn(move |thread| {
        thread.resolve_after(Duration::from_millis(ms), Val::Null);
        Ok(Flow::Suspend)
    })
}
