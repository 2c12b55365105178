// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Countdown: a one-shot timer re-armed on every tick under a fake clock.

use crate::prelude::*;
use std::sync::atomic::{AtomicU32, Ordering};

struct Countdown {
    me: Actor,
    tick: TimeEvent,
    tick_sig: Signal,
    count: u32,
    ticks_seen: Arc<AtomicU32>,
}

fn countdown_initial(_m: &mut Countdown, _event: &Event) -> Response<Countdown> {
    Response::Tran(counting)
}

fn counting(m: &mut Countdown, event: &Event) -> Response<Countdown> {
    let sig = event.signal();
    if sig == Signal::ENTRY {
        m.tick.post_in(&m.me, Duration::from_secs(1));
        return Response::Handled;
    }
    if sig == m.tick_sig {
        m.ticks_seen.fetch_add(1, Ordering::SeqCst);
        m.count -= 1;
        if m.count == 0 {
            return Response::Tran(done);
        }
        m.tick.post_in(&m.me, Duration::from_secs(1));
        return Response::Handled;
    }
    Response::Super(top)
}

fn done(_m: &mut Countdown, event: &Event) -> Response<Countdown> {
    if event.signal() == Signal::ENTRY || event.signal() == Signal::EXIT {
        return Response::Handled;
    }
    Response::Super(top)
}

#[test]
fn ten_ticks_then_done() {
    let clock = FakeClock::new();
    let framework = Framework::with_clock(clock.clone());
    let ticks_seen = Arc::new(AtomicU32::new(0));

    let counter = {
        let ticks_seen = ticks_seen.clone();
        let tick = framework.time_event("TIME_TICK");
        let tick_sig = tick.signal();
        framework.active_object("Countdown", countdown_initial, move |me| Countdown {
            me,
            tick,
            tick_sig,
            count: 10,
            ticks_seen,
        })
    };
    counter.start(0);

    for _ in 0..11 {
        tick(&framework, &clock, Duration::from_secs(1));
    }

    assert_eq!(ticks_seen.load(Ordering::SeqCst), 10);
    assert_eq!(counter.current_state(), StateId::of(done as Handler<Countdown>));
}

#[test]
fn nothing_fires_before_the_deadline() {
    let clock = FakeClock::new();
    let framework = Framework::with_clock(clock.clone());
    let ticks_seen = Arc::new(AtomicU32::new(0));

    let counter = {
        let ticks_seen = ticks_seen.clone();
        let tick = framework.time_event("TIME_TICK");
        let tick_sig = tick.signal();
        framework.active_object("Countdown", countdown_initial, move |me| Countdown {
            me,
            tick,
            tick_sig,
            count: 10,
            ticks_seen,
        })
    };
    counter.start(0);

    tick(&framework, &clock, Duration::from_millis(999));
    assert_eq!(ticks_seen.load(Ordering::SeqCst), 0);

    tick(&framework, &clock, Duration::from_millis(1));
    assert_eq!(ticks_seen.load(Ordering::SeqCst), 1);
}
