// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Active objects: a state machine bundled with a priority and a mailbox.
//!
//! The machine data type is erased behind a cell trait so the framework can
//! schedule heterogeneous actors. Mailbox and machine sit behind separate
//! locks: a handler running inside a dispatch may post to any mailbox,
//! including its own.

use crate::framework::FrameworkCore;
use parking_lot::Mutex;
use rotor_core::{Event, Handler, Hsm, Spy, StateId};
use smol_str::SmolStr;
use std::collections::VecDeque;
use std::sync::{Arc, OnceLock, Weak};

/// Object-safe view of one actor's state machine.
pub(crate) trait MachineCell: Send {
    fn init(&mut self, event: Option<&Event>, spy: &dyn Spy);
    fn dispatch(&mut self, event: &Event, spy: &dyn Spy);
    fn current_state(&self) -> StateId;
}

struct Cell<M> {
    hsm: Hsm<M>,
    machine: M,
}

impl<M: Send> MachineCell for Cell<M> {
    fn init(&mut self, event: Option<&Event>, spy: &dyn Spy) {
        self.hsm.init(&mut self.machine, event, spy);
    }

    fn dispatch(&mut self, event: &Event, spy: &dyn Spy) {
        self.hsm.dispatch(&mut self.machine, event, spy);
    }

    fn current_state(&self) -> StateId {
        self.hsm.current_id()
    }
}

/// Handle to an active object. Cheap to clone; all clones address the same
/// actor.
#[derive(Clone)]
pub struct Actor {
    shared: Arc<ActorShared>,
}

struct ActorShared {
    name: SmolStr,
    framework: Weak<FrameworkCore>,
    priority: OnceLock<u32>,
    mailbox: Mutex<VecDeque<Event>>,
    cell: Mutex<Option<Box<dyn MachineCell>>>,
}

impl Actor {
    pub(crate) fn build<M, F>(
        core: &Arc<FrameworkCore>,
        name: &str,
        initial: Handler<M>,
        make: F,
    ) -> Actor
    where
        M: Send + 'static,
        F: FnOnce(Actor) -> M,
    {
        let actor = Actor {
            shared: Arc::new(ActorShared {
                name: SmolStr::new(name),
                framework: Arc::downgrade(core),
                priority: OnceLock::new(),
                mailbox: Mutex::new(VecDeque::new()),
                cell: Mutex::new(None),
            }),
        };
        // The machine may keep a handle to its own actor, so it is built
        // after the handle exists and slotted in afterwards.
        let machine = make(actor.clone());
        *actor.shared.cell.lock() = Some(Box::new(Cell { hsm: Hsm::new(initial), machine }));
        actor
    }

    /// Class name used by post-by-name addressing. Not necessarily unique.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// The priority fixed by `start`, if started.
    pub fn priority(&self) -> Option<u32> {
        self.shared.priority.get().copied()
    }

    /// Register with the framework under the given priority and run the
    /// machine's initial transition. Lower numbers dispatch first; the
    /// priority must be unique and an actor can only be started once.
    pub fn start(&self, priority: u32) {
        let Some(core) = self.shared.framework.upgrade() else {
            unreachable!("framework dropped before actor start")
        };
        assert!(
            self.shared.priority.set(priority).is_ok(),
            "actor {} is already started",
            self.shared.name
        );
        core.add_actor(self.clone(), priority);
        tracing::debug!(actor = %self.shared.name, priority, "actor started");
        let spy = core.spy();
        self.with_cell(|cell| cell.init(None, &*spy));
        core.request_pass();
    }

    /// Enqueue behind everything already queued.
    pub fn post_fifo(&self, event: Event) {
        self.shared.mailbox.lock().push_back(event);
        self.request_pass();
    }

    /// Enqueue ahead of everything already queued.
    pub fn post_lifo(&self, event: Event) {
        self.shared.mailbox.lock().push_front(event);
        self.request_pass();
    }

    pub fn has_messages(&self) -> bool {
        !self.shared.mailbox.lock().is_empty()
    }

    pub fn queued(&self) -> usize {
        self.shared.mailbox.lock().len()
    }

    /// Identity of the machine's current state, for diagnostics.
    pub fn current_state(&self) -> StateId {
        self.with_cell(|cell| cell.current_state())
    }

    pub(crate) fn pop(&self) -> Option<Event> {
        self.shared.mailbox.lock().pop_front()
    }

    pub(crate) fn dispatch_one(&self, event: &Event, spy: &dyn Spy) {
        self.with_cell(|cell| cell.dispatch(event, spy));
    }

    fn with_cell<R>(&self, f: impl FnOnce(&mut dyn MachineCell) -> R) -> R {
        let mut guard = self.shared.cell.lock();
        match guard.as_mut() {
            Some(cell) => f(cell.as_mut()),
            None => unreachable!("actor cell is set at construction"),
        }
    }

    fn request_pass(&self) {
        if let Some(core) = self.shared.framework.upgrade() {
            core.request_pass();
        }
    }
}

#[cfg(test)]
#[path = "actor_tests.rs"]
mod tests;
