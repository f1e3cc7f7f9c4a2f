//! Core driver loop
//!
//! This module contains the `step()` function - the heart of the engine.
//! It dispatches the top frame's resume function, routes modeled errors
//! through the handler stack, and prunes handlers invalidated by normal
//! returns.
//!
//! ## Function Organization
//! Functions are ordered by importance/call hierarchy:
//! 1. run() - Top-level driver (calls step repeatedly)
//! 2. step() - One dispatch of the top frame
//! 3. unwind() / prune() - Handler-stack maintenance

use super::errors::ErrorInfo;
use super::task::Flow;
use super::thread::Thread;
use super::values::Val;

/* ===================== Public API ===================== */

/// Result of one driver step
#[derive(Debug)]
pub enum Step {
    /// The top frame advanced; keep driving this thread
    Continue(Thread),
    /// A resume function handed control to a scheduled continuation
    Suspended,
    /// The task stack drained; carries the finished thread
    Done(Thread),
    /// An unhandled fault terminated the thread (already reported)
    Faulted(ErrorInfo),
}

/// Terminal driver state
#[derive(Debug)]
pub enum RunResult {
    /// The task stack drained; carries the finished thread
    Completed(Thread),
    /// A deferred resumption will re-enter `run` later with its own snapshot
    Suspended,
    /// An unhandled fault terminated the thread (already reported)
    Faulted(ErrorInfo),
}

/// Drive a thread until it completes, suspends, or faults without a handler
pub fn run(mut thread: Thread) -> RunResult {
    loop {
        match step(thread) {
            Step::Continue(next) => thread = next,
            Step::Suspended => return RunResult::Suspended,
            Step::Done(finished) => return RunResult::Completed(finished),
            Step::Faulted(fault) => return RunResult::Faulted(fault),
        }
    }
}

/// Execute one step of the driver
///
/// Dispatches the top frame's resume function on a copy of the thread. A
/// modeled error from the dispatch never propagates past this function: it
/// either unwinds to the nearest handler or ends the thread.
pub fn step(thread: Thread) -> Step {
    let Some(task) = thread.tasks.last() else {
        tracing::debug!(thread = %thread.id, "thread complete");
        return Step::Done(thread);
    };

    tracing::trace!(
        thread = %thread.id,
        pos = task.pos,
        depth = thread.tasks.len(),
        "dispatch"
    );

    let f = task.f.clone();
    match f(thread.clone()) {
        Ok(Flow::Next(mut next)) => {
            prune(&mut next);
            Step::Continue(next)
        }

        Ok(Flow::Suspend) => {
            tracing::debug!(thread = %thread.id, "suspended");
            Step::Suspended
        }

        Err(fault) => unwind(thread, fault),
    }
}

/* ===================== Control Flow ===================== */

/// Route a modeled error through the handler stack
///
/// Pops the most recent handler, truncates the task stack to the frame that
/// installed it, and resumes that frame at the catch position with the fault
/// attached as its inbound error. With no handler registered, the fault is
/// fatal to the thread.
fn unwind(mut thread: Thread, fault: ErrorInfo) -> Step {
    let Some(handler) = thread.handlers.pop() else {
        tracing::error!(
            thread = %thread.id,
            code = %fault.code,
            message = %fault.message,
            "unhandled fault; abandoning thread"
        );
        return Step::Faulted(fault);
    };

    tracing::debug!(
        thread = %thread.id,
        code = %fault.code,
        catch_pos = handler.catch_pos,
        depth = handler.depth,
        "fault caught; unwinding"
    );

    thread.tasks.truncate(handler.depth + 1);
    let idx = thread.tasks.len() - 1;
    let caught = thread.tasks[idx]
        .with_pos(handler.catch_pos)
        .with_err(Val::Error(fault));
    thread.tasks[idx] = caught;

    Step::Continue(thread)
}

/// Discard handlers whose installing frame has already returned
fn prune(thread: &mut Thread) {
    while let Some(handler) = thread.handlers.last() {
        if handler.depth < thread.tasks.len() {
            break;
        }
        thread.handlers.pop();
    }
}
