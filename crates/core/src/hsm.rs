// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The hierarchical state machine dispatcher.
//!
//! States are plain functions over the machine data. The tree is encoded by
//! each handler's `Super` answer to the reserved EMPTY event; [`top`] is the
//! distinguished root. Handlers return a [`Response`] directive and never
//! touch the state cursor themselves — the dispatcher owns all cursor
//! mutation, so the bubble phase needs nothing restored afterwards.
//!
//! `init` performs the nested initial drill-in; `dispatch` bubbles an event
//! up the tree and, on a transition, exits up to the least common ancestor
//! of source and target and enters down to the target, then follows any INIT
//! chain rooted there.

use crate::event::Event;
use crate::signal::Signal;
use crate::spy::{Spy, StateId};
use std::ptr::fn_addr_eq;

/// Maximum supported depth of state nesting.
pub const MAX_NEST_DEPTH: usize = 32;

/// A state handler: examines an event against the machine data and answers
/// with a directive.
pub type Handler<M> = fn(&mut M, &Event) -> Response<M>;

/// Directive returned by a state handler.
pub enum Response<M> {
    /// The event was consumed here.
    Handled,
    /// Nobody wants this event; only meaningful from the root.
    Ignored,
    /// Transition to the given state.
    Tran(Handler<M>),
    /// Not handled here; the given state is this state's parent.
    Super(Handler<M>),
}

impl<M> Clone for Response<M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M> Copy for Response<M> {}

/// The default root handler.
///
/// Consumes the shutdown signals so that dispatch runs the exit path from
/// the active leaf all the way up; quietly ignores everything else,
/// including the EMPTY parent query — which is how the dispatcher
/// recognizes the root without comparing handler addresses.
pub fn top<M>(_machine: &mut M, event: &Event) -> Response<M> {
    if event.signal().is_shutdown() {
        return Response::Handled;
    }
    Response::Ignored
}

/// State cursor for one machine: the current leaf and the initial
/// pseudostate handler.
pub struct Hsm<M> {
    current: Handler<M>,
    initial: Handler<M>,
}

impl<M> Hsm<M> {
    /// A machine parked at the root; call [`Hsm::init`] before dispatching.
    pub fn new(initial: Handler<M>) -> Self {
        Self { current: top::<M>, initial }
    }

    pub fn current(&self) -> Handler<M> {
        self.current
    }

    pub fn current_id(&self) -> StateId {
        StateId::of(self.current)
    }

    /// Perform the initial transition.
    ///
    /// Invokes the initial pseudostate with `event` (or the reserved INIT
    /// event), which must answer `Tran`; then enters every state from just
    /// below the root down to the target and follows INIT chains until a
    /// leaf is reached.
    pub fn init(&mut self, machine: &mut M, event: Option<&Event>, spy: &dyn Spy) {
        let init_event = Event::init();
        let first = match Self::invoke(machine, self.initial, event.unwrap_or(&init_event), spy) {
            Response::Tran(target) => target,
            _ => unreachable!("initial pseudostate must return a transition"),
        };
        let mut chain = Self::parent_chain(machine, first, spy);
        chain.pop(); // the root itself is not entered
        for state in chain.iter().rev() {
            Self::enter(machine, *state, spy);
        }
        self.current = first;
        self.drill(machine, first, spy);
    }

    /// Dispatch one event to the machine.
    ///
    /// Bubbles the event from the current leaf toward the root until some
    /// handler answers with other than `Super`, then acts on the directive.
    pub fn dispatch(&mut self, machine: &mut M, event: &Event, spy: &dyn Spy) {
        spy.on_hsm_dispatch_event(event);
        tracing::trace!(signal = %event.signal(), state = %self.current_id(), "dispatch");

        let mut bubble: Vec<Handler<M>> = Vec::new();
        let mut state = self.current;
        let outcome = loop {
            assert!(bubble.len() < MAX_NEST_DEPTH, "state nesting exceeds MAX_NEST_DEPTH");
            bubble.push(state);
            spy.on_hsm_dispatch_pre(StateId::of(state));
            match Self::invoke(machine, state, event, spy) {
                Response::Super(parent) => state = parent,
                other => break other,
            }
        };
        let visited: Vec<StateId> = bubble.iter().map(|s| StateId::of(*s)).collect();
        spy.on_hsm_dispatch_post(&visited);

        match outcome {
            Response::Tran(target) => {
                let source = bubble[bubble.len() - 1];
                // Exit the states the event bubbled through; the handling
                // state itself is exited (or not) by the transition.
                for st in &bubble[..bubble.len() - 1] {
                    Self::exit_state(machine, *st, spy);
                }
                self.transition(machine, source, target, spy);
                self.drill(machine, target, spy);
            }
            Response::Handled => {
                if event.signal().is_shutdown() && Self::is_root(machine, state, spy) {
                    // Shutdown consumed at the root: run the exit chain from
                    // the pre-dispatch leaf and park the machine.
                    for st in &bubble[..bubble.len() - 1] {
                        Self::exit_state(machine, *st, spy);
                    }
                    self.current = top::<M>;
                }
            }
            Response::Ignored => {}
            Response::Super(_) => unreachable!("bubble loop only breaks on non-Super"),
        }
    }

    /// Transition between two states that both answered within this
    /// machine's tree. Exits up the source side to the least common
    /// ancestor, enters down the target side.
    fn transition(&mut self, machine: &mut M, source: Handler<M>, target: Handler<M>, spy: &dyn Spy) {
        if fn_addr_eq(source, target) {
            // Self-transition: leave and re-enter.
            Self::exit_state(machine, source, spy);
            Self::enter(machine, target, spy);
            self.current = target;
            return;
        }
        let src_chain = Self::parent_chain(machine, source, spy);
        let tgt_chain = Self::parent_chain(machine, target, spy);

        // Strip the common ancestry from the top end; what remains on each
        // side is strictly below the LCA.
        let mut i = src_chain.len();
        let mut j = tgt_chain.len();
        while i > 0 && j > 0 && fn_addr_eq(src_chain[i - 1], tgt_chain[j - 1]) {
            i -= 1;
            j -= 1;
        }
        for st in &src_chain[..i] {
            Self::exit_state(machine, *st, spy);
        }
        for st in tgt_chain[..j].iter().rev() {
            Self::enter(machine, *st, spy);
        }
        tracing::trace!(
            from = %StateId::of(source),
            to = %StateId::of(target),
            exited = i,
            entered = j,
            "transition"
        );
        self.current = target;
    }

    /// Follow INIT transitions from `leaf` until a state answers with
    /// something other than `Tran`, entering each intermediate state
    /// top-down.
    fn drill(&mut self, machine: &mut M, mut leaf: Handler<M>, spy: &dyn Spy) {
        loop {
            self.current = leaf;
            match Self::invoke(machine, leaf, &Event::init(), spy) {
                Response::Tran(target) => {
                    let path = Self::chain_to_ancestor(machine, target, leaf, spy);
                    for st in path.iter().rev() {
                        Self::enter(machine, *st, spy);
                    }
                    leaf = target;
                }
                _ => break,
            }
        }
    }

    /// `[from, parent, ..., root]`, discovered with EMPTY queries.
    fn parent_chain(machine: &mut M, from: Handler<M>, spy: &dyn Spy) -> Vec<Handler<M>> {
        let mut chain = vec![from];
        let mut cursor = from;
        while let Some(parent) = Self::parent(machine, cursor, spy) {
            assert!(chain.len() < MAX_NEST_DEPTH, "state nesting exceeds MAX_NEST_DEPTH");
            chain.push(parent);
            cursor = parent;
        }
        chain
    }

    /// `[from, ..., child-of-ancestor]`; `from` must be nested inside
    /// `ancestor`.
    fn chain_to_ancestor(
        machine: &mut M,
        from: Handler<M>,
        ancestor: Handler<M>,
        spy: &dyn Spy,
    ) -> Vec<Handler<M>> {
        let mut chain = vec![from];
        let mut cursor = from;
        loop {
            match Self::parent(machine, cursor, spy) {
                Some(parent) if fn_addr_eq(parent, ancestor) => break,
                Some(parent) => {
                    assert!(chain.len() < MAX_NEST_DEPTH, "state nesting exceeds MAX_NEST_DEPTH");
                    chain.push(parent);
                    cursor = parent;
                }
                None => unreachable!("INIT transition target must be a substate of its source"),
            }
        }
        chain
    }

    /// Parent query. `None` means `state` is the root.
    fn parent(machine: &mut M, state: Handler<M>, spy: &dyn Spy) -> Option<Handler<M>> {
        match Self::invoke(machine, state, &Event::empty(), spy) {
            Response::Super(parent) => Some(parent),
            _ => None,
        }
    }

    fn is_root(machine: &mut M, state: Handler<M>, spy: &dyn Spy) -> bool {
        Self::parent(machine, state, spy).is_none()
    }

    fn enter(machine: &mut M, state: Handler<M>, spy: &dyn Spy) {
        let response = Self::invoke(machine, state, &Event::entry(), spy);
        assert!(
            matches!(response, Response::Handled),
            "ENTRY must return Handled (state {})",
            StateId::of(state)
        );
    }

    fn exit_state(machine: &mut M, state: Handler<M>, spy: &dyn Spy) {
        let response = Self::invoke(machine, state, &Event::exit(), spy);
        assert!(
            matches!(response, Response::Handled | Response::Super(_)),
            "EXIT must return Handled or Super (state {})",
            StateId::of(state)
        );
    }

    fn invoke(machine: &mut M, state: Handler<M>, event: &Event, spy: &dyn Spy) -> Response<M> {
        let response = state(machine, event);
        spy.on_state_handler_called(StateId::of(state), event, response.kind());
        response
    }
}

#[cfg(test)]
#[path = "hsm_tests.rs"]
mod tests;
