// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The framework: actor registry, publish/subscribe, timers, and the
//! run-to-completion scheduler.
//!
//! One framework instance is one cooperative world. The signal registry,
//! the priority table, the subscriber table, and the timer table all hang
//! off an explicit handle rather than process globals, so independent
//! frameworks can coexist (and tests never bleed signal ids into each
//! other).

use crate::actor::Actor;
use crate::error::FrameworkError;
use crate::timer::{TimeEvent, TimerQueue};
use parking_lot::{Mutex, RwLock};
use rotor_core::{Clock, Event, Handler, NullSpy, Signal, SignalRegistry, Spy, SystemClock};
use smol_str::SmolStr;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// Handle to a framework instance. Cheap to clone.
#[derive(Clone)]
pub struct Framework {
    pub(crate) core: Arc<FrameworkCore>,
}

pub(crate) struct FrameworkCore {
    clock: Arc<dyn Clock>,
    signals: Mutex<SignalRegistry>,
    actors: Mutex<BTreeMap<u32, Actor>>,
    subscribers: Mutex<HashMap<Signal, Vec<Actor>>>,
    pub(crate) timers: Mutex<TimerQueue>,
    wake: Notify,
    stop: CancellationToken,
    draining: AtomicBool,
    stop_reported: AtomicBool,
    spy: RwLock<Arc<dyn Spy>>,
}

impl FrameworkCore {
    pub(crate) fn spy(&self) -> Arc<dyn Spy> {
        self.spy.read().clone()
    }

    pub(crate) fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Ask the loop for a run-to-completion pass. Duplicate requests
    /// coalesce.
    pub(crate) fn request_pass(&self) {
        self.wake.notify_one();
    }

    pub(crate) fn add_actor(&self, actor: Actor, priority: u32) {
        {
            let mut actors = self.actors.lock();
            assert!(!actors.contains_key(&priority), "actor priority {priority} is already taken");
            actors.insert(priority, actor.clone());
        }
        self.spy().on_framework_add(actor.name(), priority);
    }
}

impl Framework {
    /// A framework on the real system clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    /// A framework on the given clock (a `FakeClock` in tests).
    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self {
            core: Arc::new(FrameworkCore {
                clock: Arc::new(clock),
                signals: Mutex::new(SignalRegistry::new()),
                actors: Mutex::new(BTreeMap::new()),
                subscribers: Mutex::new(HashMap::new()),
                timers: Mutex::new(TimerQueue::new()),
                wake: Notify::new(),
                stop: CancellationToken::new(),
                draining: AtomicBool::new(false),
                stop_reported: AtomicBool::new(false),
                spy: RwLock::new(Arc::new(NullSpy)),
            }),
        }
    }

    /// Install an observer. Replaces the inert default.
    pub fn enable_spy(&self, spy: impl Spy + 'static) {
        *self.core.spy.write() = Arc::new(spy);
    }

    /// The framework's monotonic clock reading, for `post_at` deadlines.
    pub fn now(&self) -> Instant {
        self.core.now()
    }

    // -- signals ----------------------------------------------------------

    /// Register a signal name, returning its id. Idempotent.
    pub fn register_signal(&self, name: &str) -> Signal {
        let mut signals = self.core.signals.lock();
        let fresh = !signals.exists(name);
        let id = signals.register(name);
        drop(signals);
        if fresh {
            self.core.spy().on_signal_register(name, id);
        }
        id
    }

    pub fn signal_exists(&self, name: &str) -> bool {
        self.core.signals.lock().exists(name)
    }

    /// Reverse lookup for diagnostics.
    pub fn signal_name(&self, id: Signal) -> Option<SmolStr> {
        self.core.signals.lock().name_of(id).map(SmolStr::new)
    }

    // -- actors -----------------------------------------------------------

    /// Create an active object. `make` receives the actor's own handle so
    /// the machine can post to itself or arm timers targeting itself; call
    /// [`Actor::start`] to register and run the initial transition.
    pub fn active_object<M, F>(&self, name: &str, initial: Handler<M>, make: F) -> Actor
    where
        M: Send + 'static,
        F: FnOnce(Actor) -> M,
    {
        Actor::build(&self.core, name, initial, make)
    }

    /// Registered actors in priority order.
    pub fn actors(&self) -> Vec<Actor> {
        self.core.actors.lock().values().cloned().collect()
    }

    // -- posting ----------------------------------------------------------

    /// Direct FIFO enqueue on one actor.
    pub fn post(&self, event: &Event, actor: &Actor) {
        actor.post_fifo(event.clone());
    }

    /// FIFO enqueue on every actor with the given class name. No-op when
    /// none match.
    pub fn post_by_name(&self, event: &Event, name: &str) {
        let targets: Vec<Actor> = self
            .core
            .actors
            .lock()
            .values()
            .filter(|actor| actor.name() == name)
            .cloned()
            .collect();
        for target in targets {
            target.post_fifo(event.clone());
        }
    }

    /// Enqueue on every subscriber of the event's signal, in subscription
    /// order, then request a pass. An actor subscribed twice is delivered
    /// twice.
    pub fn publish(&self, event: &Event) {
        let subscribers: Vec<Actor> = self
            .core
            .subscribers
            .lock()
            .get(&event.signal())
            .cloned()
            .unwrap_or_default();
        for subscriber in subscribers {
            subscriber.post_fifo(event.clone());
        }
        self.core.request_pass();
    }

    /// Subscribe an actor to a signal by name, registering the name if it
    /// is new.
    pub fn subscribe(&self, signal_name: &str, actor: &Actor) {
        let id = self.register_signal(signal_name);
        self.core.subscribers.lock().entry(id).or_default().push(actor.clone());
    }

    // -- timers -----------------------------------------------------------

    /// Create a time event firing the named signal; the name is registered
    /// if new.
    pub fn time_event(&self, signal_name: &str) -> TimeEvent {
        let id = self.register_signal(signal_name);
        TimeEvent::new(&self.core, id)
    }

    /// Deliver every timer due at the current clock reading into its
    /// target's mailbox. Periodic timers re-arm themselves. Tests drive
    /// this directly with a `FakeClock`; `run` calls it when the deadline
    /// sleep elapses.
    pub fn fire_due_timers(&self) {
        let now = self.core.now();
        let due = self.core.timers.lock().pop_due(now);
        for te in due {
            if let Some((target, event)) = te.fire() {
                tracing::trace!(signal = %event.signal(), "time event fired");
                target.post_fifo(event);
            }
        }
        self.core.request_pass();
    }

    // -- scheduling -------------------------------------------------------

    /// One run-to-completion pass: keep dispatching one event to the
    /// lowest-priority-number actor with pending messages until every
    /// mailbox is empty.
    pub fn run_to_completion(&self) {
        loop {
            self.drain_shutdown();
            let next = self
                .core
                .actors
                .lock()
                .values()
                .find(|actor| actor.has_messages())
                .cloned();
            let Some(actor) = next else { break };
            let Some(event) = actor.pop() else { continue };
            actor.dispatch_one(&event, &*self.core.spy());
        }
        if self.core.draining.load(Ordering::SeqCst)
            && !self.core.stop_reported.swap(true, Ordering::SeqCst)
        {
            self.core.spy().on_framework_stop();
        }
    }

    /// Request shutdown. Safe to call from inside a state handler or from
    /// another thread: the timer table is cleared here, but the shutdown
    /// events are posted and drained by the scheduling loop.
    pub fn stop(&self) {
        if self.core.stop.is_cancelled() {
            return;
        }
        tracing::debug!("framework stopping");
        self.core.timers.lock().clear();
        self.core.stop.cancel();
        self.core.request_pass();
    }

    pub fn is_stopped(&self) -> bool {
        self.core.stop.is_cancelled()
    }

    /// The cooperative loop: drain mailboxes, then wait for a wakeup, the
    /// next timer deadline, or a stop request. Returns once a stop request
    /// has been fully drained.
    pub async fn run(&self) {
        loop {
            self.run_to_completion();
            if self.core.draining.load(Ordering::SeqCst) {
                break;
            }
            let deadline = self.core.timers.lock().next_fire();
            tokio::select! {
                _ = self.core.wake.notified() => {}
                _ = self.core.stop.cancelled() => {}
                _ = Self::sleep_until(deadline) => self.fire_due_timers(),
            }
        }
    }

    /// `run`, with the host OS interrupt/terminate signals bound to
    /// [`Framework::stop`].
    pub async fn run_forever(&self) -> Result<(), FrameworkError> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut interrupt = signal(SignalKind::interrupt())?;
            let mut terminate = signal(SignalKind::terminate())?;
            let framework = self.clone();
            let watcher = tokio::spawn(async move {
                tokio::select! {
                    _ = interrupt.recv() => {}
                    _ = terminate.recv() => {}
                }
                framework.stop();
            });
            self.run().await;
            watcher.abort();
        }
        #[cfg(not(unix))]
        self.run().await;
        Ok(())
    }

    /// Post the shutdown event to every actor, once, after `stop` was
    /// requested. Runs inside the pass so that a handler calling `stop`
    /// mid-pass gets its shutdown events drained by the same pass.
    fn drain_shutdown(&self) {
        if !self.core.stop.is_cancelled() || self.core.draining.swap(true, Ordering::SeqCst) {
            return;
        }
        let actors = self.actors();
        tracing::debug!(actors = actors.len(), "posting shutdown events");
        for actor in actors {
            actor.post_fifo(Event::sigterm());
        }
    }

    async fn sleep_until(deadline: Option<Instant>) {
        match deadline {
            Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
            None => std::future::pending::<()>().await,
        }
    }
}

impl Default for Framework {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "framework_tests.rs"]
mod tests;
