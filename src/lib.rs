pub mod benchmark;
pub mod cli;
pub mod config;
pub mod executor;
pub mod init;
pub mod programs;
pub mod runtime;
pub mod scheduler;

// Re-export main types
pub use executor::{
    ErrorInfo, Flow, Handler, ResumeFn, ResumeResult, RunResult, Step, Task, Thread, Val,
    json_to_val, resume_fn, run, step, val_to_json,
};
pub use runtime::Runtime;
pub use scheduler::Scheduler;

// Re-export init API for convenience
pub use init::{InitBuilder, InitOptions, initialize};
