// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On/off switch: the smallest two-state actor, checked by its action trace.

use crate::prelude::*;

struct Switch {
    flick: Signal,
    log: SharedLog,
}

fn switch_initial(_m: &mut Switch, _event: &Event) -> Response<Switch> {
    Response::Tran(off)
}

fn off(m: &mut Switch, event: &Event) -> Response<Switch> {
    let sig = event.signal();
    if sig == Signal::ENTRY {
        log_line(&m.log, "ENTRY(off)");
        return Response::Handled;
    }
    if sig == Signal::EXIT {
        log_line(&m.log, "EXIT(off)");
        return Response::Handled;
    }
    if sig == m.flick {
        return Response::Tran(on);
    }
    Response::Super(top)
}

fn on(m: &mut Switch, event: &Event) -> Response<Switch> {
    let sig = event.signal();
    if sig == Signal::ENTRY {
        log_line(&m.log, "ENTRY(on)");
        return Response::Handled;
    }
    if sig == Signal::EXIT {
        log_line(&m.log, "EXIT(on)");
        return Response::Handled;
    }
    if sig == m.flick {
        return Response::Tran(off);
    }
    Response::Super(top)
}

#[test]
fn three_flicks_leave_the_switch_on() {
    let framework = Framework::new();
    let log = shared_log();
    let flick = framework.register_signal("FLICK");
    let switch = {
        let log = log.clone();
        framework.active_object("OnOffSwitch", switch_initial, move |_| Switch { flick, log })
    };
    switch.start(0);

    for _ in 0..3 {
        switch.post_fifo(Event::new(flick));
    }
    framework.run_to_completion();

    assert_eq!(
        log_snapshot(&log),
        [
            "ENTRY(off)",
            "EXIT(off)",
            "ENTRY(on)",
            "EXIT(on)",
            "ENTRY(off)",
            "EXIT(off)",
            "ENTRY(on)",
        ]
    );
    assert_eq!(switch.current_state(), StateId::of(on as Handler<Switch>));
}

#[test]
fn flicks_posted_lifo_jump_the_queue() {
    let framework = Framework::new();
    let log = shared_log();
    let flick = framework.register_signal("FLICK");
    let nudge = framework.register_signal("NUDGE");
    let switch = {
        let log = log.clone();
        framework.active_object("OnOffSwitch", switch_initial, move |_| Switch { flick, log })
    };
    switch.start(0);

    // NUDGE is unknown to the machine and bubbles to the root; the LIFO
    // flick is dispatched before it.
    switch.post_fifo(Event::new(nudge));
    switch.post_lifo(Event::new(flick));
    framework.run_to_completion();

    assert_eq!(log_snapshot(&log), ["ENTRY(off)", "EXIT(off)", "ENTRY(on)"]);
    assert_eq!(switch.current_state(), StateId::of(on as Handler<Switch>));
}
