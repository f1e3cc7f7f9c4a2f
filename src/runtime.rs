//! Application runtime
//!
//! Owns the timer queue and drives root programs to completion. `execute`
//! wraps a program in a harvest frame so callers get a plain
//! `Result<Val, ErrorInfo>` back regardless of whether the program completed
//! synchronously, suspended and resumed later, or raised.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;

use crate::config::Config;
use crate::executor::errors::{self, ErrorInfo};
use crate::executor::{Flow, ResumeFn, Thread, Val, resume_fn, run};
use crate::scheduler::Scheduler;

type Outcome = Result<Val, ErrorInfo>;
type OutcomeSlot = Arc<Mutex<Option<oneshot::Sender<Outcome>>>>;

/// Application runtime: configuration plus the shared timer queue
#[derive(Debug, Clone)]
pub struct Runtime {
    config: Config,
    scheduler: Scheduler,
}

impl Runtime {
    /// Create a runtime; spawns the timer thread, no other side effects
    pub fn new(config: Config) -> Self {
        Self {
            config,
            scheduler: Scheduler::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Create an empty thread bound to this runtime's scheduler
    pub fn thread(&self) -> Thread {
        Thread::new(&self.scheduler)
            .with_resolve_delay(Duration::from_millis(self.config.engine.resolve_delay_ms))
    }

    /// Drive `program` to completion and return its result
    ///
    /// The program runs inside a root frame that registers a catch handler at
    /// the bottom of the stack, so a fault anywhere in the program is routed
    /// back here instead of abandoning the thread. The result (or the caught
    /// fault) is forwarded through a oneshot channel that this method awaits,
    /// which also covers programs that suspend and resume on the timer thread.
    pub async fn execute(&self, program: ResumeFn) -> Outcome {
        let (tx, rx) = oneshot::channel();
        let slot: OutcomeSlot = Arc::new(Mutex::new(Some(tx)));

        let root = harvest_frame(program, slot);
        let thread = self.thread().call(root, "_");
        run(thread);

        match rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(ErrorInfo::new(
                errors::RUNTIME_ERROR,
                "program finished without delivering a result",
            )),
        }
    }

    /// Stop the timer thread after queued work drains
    pub fn shutdown(&self) {
        self.scheduler.shutdown();
    }
}

/// Root frame that calls `program` and forwards its outcome into `slot`
fn harvest_frame(program: ResumeFn, slot: OutcomeSlot) -> ResumeFn {
    resume_fn(move |thread: Thread| match thread.pos() {
        0 => {
            let next = thread.catch_push(2).jump(1).call(program.clone(), "result");
            Ok(Flow::Next(next))
        }
        1 => {
            deliver(&slot, Ok(thread.get_var("result")));
            Ok(Flow::Next(thread.catch_pop().ret_void()))
        }
        2 => {
            let fault = match thread.error() {
                Some(Val::Error(err)) => err.clone(),
                Some(other) => ErrorInfo::new(
                    errors::RUNTIME_ERROR,
                    format!("program raised a non-error value: {:?}", other),
                ),
                None => ErrorInfo::new(
                    errors::RUNTIME_ERROR,
                    "catch position resumed without an inbound error",
                ),
            };
            deliver(&slot, Err(fault));
            Ok(Flow::Next(thread.ret_void()))
        }
        pos => Err(ErrorInfo::new(
            errors::UNKNOWN_POS,
            format!("root frame has no position {pos}"),
        )),
    })
}

/// Send the outcome if it has not been delivered yet
fn deliver(slot: &OutcomeSlot, outcome: Outcome) {
    let sender = slot
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
    if let Some(sender) = sender {
        let _ = sender.send(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::stdlib;
    use crate::programs;

    fn runtime() -> Runtime {
        Runtime::new(Config::default())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_execute_returns_program_value() {
        let rt = runtime();
        let result = rt.execute(programs::chain(3)).await.unwrap();
        assert_eq!(result, Val::Num(3.0));
        rt.shutdown();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_execute_reports_uncaught_fault() {
        let rt = runtime();
        let err = rt
            .execute(stdlib::fail(ErrorInfo::new(errors::RUNTIME_ERROR, "boom")))
            .await
            .unwrap_err();
        assert_eq!(err.code, errors::RUNTIME_ERROR);
        assert_eq!(err.message, "boom");
        rt.shutdown();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_execute_surfaces_recovered_value() {
        let rt = runtime();
        let result = rt.execute(programs::catch_demo()).await.unwrap();
        assert_eq!(
            result,
            Val::Str("recovered from RuntimeError".to_string())
        );
        rt.shutdown();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_execute_across_suspension() {
        let rt = runtime();
        let result = rt.execute(programs::sleepy(5)).await.unwrap();
        assert_eq!(result, Val::Str("slept 5ms".to_string()));
        rt.shutdown();
    }

    #[test]
    fn test_execute_inside_block_on() {
        let rt = runtime();
        let result = tokio_test::block_on(rt.execute(programs::yielding(3))).unwrap();
        assert_eq!(result, Val::Num(3.0));
        rt.shutdown();
    }
}
