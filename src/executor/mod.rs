//! # Async-task execution engine
//!
//! Continuation-passing execution of suspended call frames, without native
//! coroutines: logical functions are compiled into explicit resume-position +
//! captured-variables records, and the driver loop is the trampoline.
//!
//! ## Core Principles
//!
//! 1. **Stack-driven execution**: all state in `Thread { tasks, handlers }`,
//!    no recursion through the host stack
//! 2. **Immutable values**: every transition returns a new `Thread`, so
//!    deferred continuations resume safely from captured snapshots
//! 3. **Depth-keyed catch handlers**: `{catch_pos, depth}` registrations plus
//!    truncate-on-fault reimplement stack unwinding across suspension points
//! 4. **Pure driver**: no I/O, no async - runs until suspend, completion, or
//!    an unhandled fault

pub mod errors;
pub mod exec_loop;
pub mod json;
pub mod stdlib;
pub mod task;
pub mod thread;
pub mod values;

#[cfg(test)]
mod tests;

// Re-export commonly used items
pub use errors::ErrorInfo;
pub use exec_loop::{run, step, RunResult, Step};
pub use json::{json_to_val, val_to_json};
pub use task::{resume_fn, Flow, ResumeFn, ResumeResult, Task};
pub use thread::{Handler, Thread, DEFAULT_RESOLVE_DELAY};
pub use values::Val;
