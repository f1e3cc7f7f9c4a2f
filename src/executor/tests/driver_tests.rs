//! Tests for the driver loop: dispatch, unwind, pruning, suspension

use super::helpers::{raises, returns, thread};
use crate::executor::errors;
use crate::executor::{Flow, Handler, RunResult, Step, Thread, Val, resume_fn, run, step};
use std::sync::{Arc, Mutex};

/* ===================== Dispatch ===================== */

#[test]
fn test_run_completes_empty_thread() {
    let RunResult::Completed(finished) = run(thread()) else {
        unreachable!("an empty thread should complete immediately");
    };
    assert_eq!(finished.depth(), 0);
}

#[test]
fn test_step_dispatches_top_frame() {
    let program = resume_fn(|t: Thread| match t.pos() {
        0 => Ok(Flow::Next(t.set_var("hit", Val::Bool(true)).jump(1))),
        _ => Ok(Flow::Next(t.ret(Val::Null))),
    });

    let t = thread().call(program, "r");
    let Step::Continue(next) = step(t) else {
        unreachable!("first dispatch should continue");
    };

    assert_eq!(next.pos(), 1);
    assert_eq!(next.get_var("hit"), Val::Bool(true));
}

#[test]
fn test_run_call_return_round_trip() {
    let seen = Arc::new(Mutex::new(None));
    let seen_in = seen.clone();

    let parent = resume_fn(move |t: Thread| match t.pos() {
        0 => Ok(Flow::Next(t.jump(1).call(returns(Val::Num(7.0)), "x"))),
        1 => {
            *seen_in.lock().unwrap() = Some(t.get_var("x"));
            Ok(Flow::Next(t.ret_void()))
        }
        pos => unreachable!("parent resumed at {pos}"),
    });

    let result = run(thread().call(parent, "_"));

    assert!(matches!(result, RunResult::Completed(_)));
    assert_eq!(*seen.lock().unwrap(), Some(Val::Num(7.0)));
}

#[test]
fn test_suspension_stops_driver() {
    let program = resume_fn(|_t: Thread| Ok(Flow::Suspend));
    let t = thread().call(program, "_");

    assert!(matches!(step(t.clone()), Step::Suspended));
    assert!(matches!(run(t), RunResult::Suspended));
}

/* ===================== Faults and unwinding ===================== */

#[test]
fn test_run_reports_unhandled_fault() {
    let t = thread().call(raises(errors::RUNTIME_ERROR, "boom"), "_");

    let RunResult::Faulted(fault) = run(t) else {
        unreachable!("a fault with no handler should end the thread");
    };
    assert_eq!(fault.code, errors::RUNTIME_ERROR);
    assert_eq!(fault.message, "boom");
}

#[test]
fn test_unwind_truncates_to_handler_frame() {
    // a installs a handler then calls b; b calls c; c raises two frames deep
    let c = raises(errors::RUNTIME_ERROR, "deep fault");
    let b = resume_fn(move |t: Thread| match t.pos() {
        0 => Ok(Flow::Next(t.jump(1).call(c.clone(), "c"))),
        pos => unreachable!("b resumed at {pos}"),
    });
    let a = resume_fn(move |t: Thread| match t.pos() {
        0 => Ok(Flow::Next(t.catch_push(7).jump(1).call(b.clone(), "b"))),
        pos => unreachable!("a resumed at {pos}"),
    });

    let t0 = thread().call(a, "_");

    let Step::Continue(t1) = step(t0) else {
        unreachable!("a should continue");
    };
    assert_eq!(t1.depth(), 2);
    assert_eq!(
        t1.handlers,
        vec![Handler {
            catch_pos: 7,
            depth: 0
        }]
    );

    let Step::Continue(t2) = step(t1) else {
        unreachable!("b should continue");
    };
    assert_eq!(t2.depth(), 3);

    let Step::Continue(t3) = step(t2) else {
        unreachable!("the fault should unwind to the handler");
    };
    assert_eq!(t3.depth(), 1);
    assert_eq!(t3.pos(), 7);
    assert!(t3.handlers.is_empty());

    let Some(Val::Error(fault)) = t3.error() else {
        unreachable!("the catch frame should carry the fault");
    };
    assert_eq!(fault.message, "deep fault");
}

#[test]
fn test_try_catch_completes_cleanly() {
    let g = raises(errors::RUNTIME_ERROR, "always");
    let outer = resume_fn(move |t: Thread| match t.pos() {
        0 => Ok(Flow::Next(t.catch_push(2).jump(1).call(g.clone(), "g"))),
        2 => Ok(Flow::Next(t.ret_void())),
        pos => unreachable!("outer resumed at {pos}"),
    });

    let RunResult::Completed(finished) = run(thread().call(outer, "_")) else {
        unreachable!("the caught fault should not end the driver");
    };
    assert_eq!(finished.depth(), 0);
    assert!(finished.handlers.is_empty());
}

#[test]
fn test_nested_handlers_route_to_innermost() {
    let seen = Arc::new(Mutex::new(None));
    let seen_in = seen.clone();

    let failing = raises(errors::RUNTIME_ERROR, "inner fault");
    let mid = resume_fn(move |t: Thread| match t.pos() {
        0 => Ok(Flow::Next(t.catch_push(5).jump(1).call(failing.clone(), "r"))),
        5 => Ok(Flow::Next(t.ret(Val::Str("mid caught".to_string())))),
        pos => unreachable!("mid resumed at {pos}"),
    });
    let outer = resume_fn(move |t: Thread| match t.pos() {
        0 => Ok(Flow::Next(t.catch_push(8).jump(1).call(mid.clone(), "m"))),
        1 => {
            *seen_in.lock().unwrap() = Some(t.get_var("m"));
            Ok(Flow::Next(t.ret_void()))
        }
        pos => unreachable!("outer caught a fault meant for mid (pos {pos})"),
    });

    let result = run(thread().call(outer, "_"));

    assert!(matches!(result, RunResult::Completed(_)));
    assert_eq!(
        *seen.lock().unwrap(),
        Some(Val::Str("mid caught".to_string()))
    );
}

/* ===================== Handler pruning ===================== */

#[test]
fn test_handler_pruned_after_normal_return() {
    // inner registers a handler, then returns without popping it
    let inner = resume_fn(|t: Thread| Ok(Flow::Next(t.catch_push(9).ret(Val::Num(1.0)))));
    let outer = resume_fn(move |t: Thread| match t.pos() {
        0 => Ok(Flow::Next(t.jump(1).call(inner.clone(), "x"))),
        1 => Ok(Flow::Next(
            t.jump(2).call(raises(errors::RUNTIME_ERROR, "sibling"), "y"),
        )),
        pos => unreachable!("outer resumed at {pos}"),
    });

    let t0 = thread().call(outer, "_");

    let Step::Continue(t1) = step(t0) else {
        unreachable!("outer should continue");
    };
    let Step::Continue(t2) = step(t1) else {
        unreachable!("inner should return");
    };

    // inner's handler died with inner's frame
    assert_eq!(t2.depth(), 1);
    assert_eq!(t2.get_var("x"), Val::Num(1.0));
    assert!(t2.handlers.is_empty());

    // and a fault in a later sibling call is not routed to the stale target
    let Step::Continue(t3) = step(t2) else {
        unreachable!("outer should call the sibling");
    };
    assert!(matches!(step(t3), Step::Faulted(_)));
}
