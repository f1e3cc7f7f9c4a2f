//! Built-in programs
//!
//! Compiled-form resume functions shared by the CLI `run` command, the
//! benchmark, and the end-to-end tests. Each follows the generated calling
//! convention: a `match` over the frame's resume position, `jump` to the
//! continuation position before any `call`, results read back through the
//! caller's chosen variable name.

use crate::executor::errors::{self, ErrorInfo};
use crate::executor::{resume_fn, stdlib, Flow, ResumeFn, Thread, Val};

/// Nested sub-calls `depth` levels deep; completes with the level count
pub fn chain(depth: u32) -> ResumeFn {
    resume_fn(move |thread: Thread| match thread.pos() {
        0 => {
            if depth == 0 {
                return Ok(Flow::Next(thread.ret(Val::Num(0.0))));
            }
            let thread = thread.jump(1).call(chain(depth - 1), "sub");
            Ok(Flow::Next(thread))
        }
        1 => {
            let sub = thread.get_var("sub").as_num().unwrap_or(0.0);
            Ok(Flow::Next(thread.ret(Val::Num(sub + 1.0))))
        }
        pos => Err(unknown_pos("chain", pos)),
    })
}

/// Try/catch over a callee that always raises; completes with a recovery
/// message built from the caught error
pub fn catch_demo() -> ResumeFn {
    resume_fn(move |thread: Thread| match thread.pos() {
        0 => {
            let failing = stdlib::fail(ErrorInfo::new(
                errors::RUNTIME_ERROR,
                "deliberate failure",
            ));
            let thread = thread.catch_push(2).jump(1).call(failing, "x");
            Ok(Flow::Next(thread))
        }
        1 => {
            // Normal path; unreachable while the callee always raises
            let thread = thread.catch_pop();
            let x = thread.get_var("x");
            Ok(Flow::Next(thread.ret(x)))
        }
        2 => {
            let Some(Val::Error(err)) = thread.error() else {
                return Err(ErrorInfo::new(
                    errors::RUNTIME_ERROR,
                    "catch position resumed without an inbound error",
                ));
            };
            let message = format!("recovered from {}", err.code);
            Ok(Flow::Next(thread.ret(Val::Str(message))))
        }
        pos => Err(unknown_pos("catch_demo", pos)),
    })
}

/// Sleeps on the timer queue once, then completes
pub fn sleepy(ms: u64) -> ResumeFn {
    resume_fn(move |thread: Thread| match thread.pos() {
        0 => {
            let thread = thread.jump(1).call(stdlib::sleep(ms), "nap");
            Ok(Flow::Next(thread))
        }
        1 => Ok(Flow::Next(thread.ret(Val::Str(format!("slept {ms}ms"))))),
        pos => Err(unknown_pos("sleepy", pos)),
    })
}

/// Suspends `count` times through zero-delay timers, then completes with the
/// suspension count
pub fn yielding(count: u32) -> ResumeFn {
    resume_fn(move |thread: Thread| match thread.pos() {
        0 => {
            let thread = thread.set_var("left", Val::Num(count as f64)).jump(1);
            Ok(Flow::Next(thread))
        }
        1 => {
            let left = thread.get_var("left").as_num().unwrap_or(0.0);
            if left <= 0.0 {
                return Ok(Flow::Next(thread.ret(Val::Num(count as f64))));
            }
            let thread = thread
                .set_var("left", Val::Num(left - 1.0))
                .call(stdlib::sleep(0), "nap");
            Ok(Flow::Next(thread))
        }
        pos => Err(unknown_pos("yielding", pos)),
    })
}

fn unknown_pos(program: &str, pos: u32) -> ErrorInfo {
    ErrorInfo::new(
        errors::UNKNOWN_POS,
        format!("{program} has no position {pos}"),
    )
}
