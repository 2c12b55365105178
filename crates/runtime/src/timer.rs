// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Time events and the ordered timer table.
//!
//! The framework keeps armed time events in a map ordered by absolute
//! expiration. Identical expirations are nudged forward by one nanosecond
//! so that simultaneous timers fire in arming order. The table carries a
//! single next-fire deadline that always equals the minimum key; the event
//! loop sleeps on it and re-derives it whenever the table changes.

use crate::actor::Actor;
use crate::framework::FrameworkCore;
use parking_lot::Mutex;
use rotor_core::{Event, Signal};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

/// An event armed to fire at a future time, one-shot or periodic.
///
/// Created through [`crate::Framework::time_event`], which registers the
/// signal. Arming an already-armed time event is a programming error; a
/// fired one-shot may be re-armed.
#[derive(Clone)]
pub struct TimeEvent {
    shared: Arc<TimeEventShared>,
}

struct TimeEventShared {
    signal: Signal,
    value: Mutex<Option<Value>>,
    framework: Weak<FrameworkCore>,
    arm: Mutex<Option<Arming>>,
}

struct Arming {
    target: Actor,
    interval: Duration,
}

impl TimeEvent {
    pub(crate) fn new(core: &Arc<FrameworkCore>, signal: Signal) -> Self {
        Self {
            shared: Arc::new(TimeEventShared {
                signal,
                value: Mutex::new(None),
                framework: Arc::downgrade(core),
                arm: Mutex::new(None),
            }),
        }
    }

    pub fn signal(&self) -> Signal {
        self.shared.signal
    }

    /// Payload delivered with every fire.
    pub fn set_value(&self, value: Option<Value>) {
        *self.shared.value.lock() = value;
    }

    /// Fire once at the given absolute time.
    pub fn post_at(&self, target: &Actor, at: Instant) {
        self.arm(target, at, Duration::ZERO);
    }

    /// Fire once after the given delay.
    pub fn post_in(&self, target: &Actor, delay: Duration) {
        let Some(core) = self.shared.framework.upgrade() else { return };
        self.arm(target, core.now() + delay, Duration::ZERO);
    }

    /// Fire after the given period and every period thereafter until
    /// disarmed.
    pub fn post_every(&self, target: &Actor, period: Duration) {
        let Some(core) = self.shared.framework.upgrade() else { return };
        self.arm(target, core.now() + period, period);
    }

    /// Remove this time event from the active table. Events it already
    /// fired remain queued and will still be dispatched.
    pub fn disarm(&self) {
        let was_armed = self.shared.arm.lock().take().is_some();
        if !was_armed {
            return;
        }
        if let Some(core) = self.shared.framework.upgrade() {
            core.timers.lock().remove(self);
            core.request_pass();
            tracing::trace!(signal = %self.shared.signal, "time event disarmed");
        }
    }

    fn arm(&self, target: &Actor, at: Instant, interval: Duration) {
        let Some(core) = self.shared.framework.upgrade() else { return };
        {
            let mut arm = self.shared.arm.lock();
            assert!(arm.is_none(), "time event is already armed");
            *arm = Some(Arming { target: target.clone(), interval });
        }
        let now = core.now();
        if at < now {
            // Expired before it was armed: deliver right away.
            target.post_fifo(self.to_event());
            self.shared.arm.lock().take();
            return;
        }
        tracing::trace!(signal = %self.shared.signal, ?interval, "time event armed");
        core.timers.lock().insert(self.clone(), at);
        core.request_pass();
    }

    /// Consume one expiration: the target and the event to post. One-shot
    /// arms are cleared here so the event may be re-armed by its handler.
    pub(crate) fn fire(&self) -> Option<(Actor, Event)> {
        let mut arm = self.shared.arm.lock();
        let arming = arm.as_ref()?;
        let target = arming.target.clone();
        let one_shot = arming.interval.is_zero();
        if one_shot {
            *arm = None;
        }
        drop(arm);
        Some((target, self.to_event()))
    }

    /// The re-arm interval, when periodic and still armed.
    pub(crate) fn periodic_interval(&self) -> Option<Duration> {
        let arm = self.shared.arm.lock();
        arm.as_ref().map(|a| a.interval).filter(|i| !i.is_zero())
    }

    pub(crate) fn same(a: &TimeEvent, b: &TimeEvent) -> bool {
        Arc::ptr_eq(&a.shared, &b.shared)
    }

    fn to_event(&self) -> Event {
        match self.shared.value.lock().clone() {
            Some(value) => Event::with_value(self.shared.signal, value),
            None => Event::new(self.shared.signal),
        }
    }
}

/// Expiration-ordered table of armed time events.
pub(crate) struct TimerQueue {
    entries: BTreeMap<Instant, TimeEvent>,
    next_fire: Option<Instant>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self { entries: BTreeMap::new(), next_fire: None }
    }

    /// The single outstanding deadline; equals the minimum key whenever the
    /// table is non-empty.
    pub fn next_fire(&self) -> Option<Instant> {
        self.next_fire
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn insert(&mut self, te: TimeEvent, at: Instant) {
        let at = self.insert_bumped(te, at);
        match self.next_fire {
            Some(current) if current <= at => {}
            _ => self.next_fire = Some(at),
        }
    }

    pub fn remove(&mut self, te: &TimeEvent) {
        let key = self
            .entries
            .iter()
            .find(|(_, entry)| TimeEvent::same(entry, te))
            .map(|(key, _)| *key);
        if let Some(key) = key {
            self.entries.remove(&key);
            if self.next_fire == Some(key) {
                self.next_fire = self.entries.keys().next().copied();
            }
        }
    }

    /// Remove and return every entry due at `now`, re-inserting periodic
    /// events at `expiration + interval`. The deadline ends up at the new
    /// minimum key.
    pub fn pop_due(&mut self, now: Instant) -> Vec<TimeEvent> {
        let mut fired = Vec::new();
        while let Some((&key, _)) = self.entries.first_key_value() {
            if key > now {
                break;
            }
            if let Some(te) = self.entries.remove(&key) {
                if let Some(interval) = te.periodic_interval() {
                    self.insert_bumped(te.clone(), key + interval);
                }
                fired.push(te);
            }
        }
        self.next_fire = self.entries.keys().next().copied();
        fired
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.next_fire = None;
    }

    /// Insert under the first free key at or after `at`, bumping by the
    /// smallest representable increment on collision so simultaneous
    /// timers keep their arming order.
    fn insert_bumped(&mut self, te: TimeEvent, mut at: Instant) -> Instant {
        while self.entries.contains_key(&at) {
            at += Duration::from_nanos(1);
        }
        self.entries.insert(at, te);
        at
    }
}

#[cfg(test)]
#[path = "timer_tests.rs"]
mod tests;
