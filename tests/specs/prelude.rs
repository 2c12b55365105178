// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for the scenario specs.

pub use rotor_core::{top, Event, FakeClock, Handler, Response, Signal, StateId};
pub use rotor_runtime::{Actor, Framework, TimeEvent};
pub use std::sync::{Arc, Mutex};
pub use std::time::Duration;

pub type SharedLog = Arc<Mutex<Vec<String>>>;

pub fn shared_log() -> SharedLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn log_line(log: &SharedLog, line: impl Into<String>) {
    log.lock().unwrap().push(line.into());
}

pub fn log_snapshot(log: &SharedLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Advance the fake clock and let the framework process whatever became due.
pub fn tick(framework: &Framework, clock: &FakeClock, by: Duration) {
    clock.advance(by);
    framework.fire_due_timers();
    framework.run_to_completion();
}

/// A single-state actor that records every delivered signal as
/// `{tag}:{signal}` and its entry/exit actions as `{tag}:enter`/`{tag}:exit`.
pub struct Recorder {
    tag: &'static str,
    log: SharedLog,
}

fn recorder_initial(_m: &mut Recorder, _event: &Event) -> Response<Recorder> {
    Response::Tran(recording)
}

fn recording(m: &mut Recorder, event: &Event) -> Response<Recorder> {
    let sig = event.signal();
    if sig == Signal::ENTRY {
        log_line(&m.log, format!("{}:enter", m.tag));
        return Response::Handled;
    }
    if sig == Signal::EXIT {
        log_line(&m.log, format!("{}:exit", m.tag));
        return Response::Handled;
    }
    if sig.is_reserved() || sig.is_shutdown() {
        return Response::Super(top);
    }
    log_line(&m.log, format!("{}:{}", m.tag, sig));
    Response::Handled
}

pub fn recorder(framework: &Framework, tag: &'static str, log: &SharedLog) -> Actor {
    let log = log.clone();
    framework.active_object("Recorder", recorder_initial, move |_| Recorder { tag, log })
}
