// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Passive observation hooks for tracing and debugging.
//!
//! The dispatcher and the framework call into a [`Spy`] at useful points.
//! Every hook has a no-op default, so an implementation overrides only what
//! it needs. The default spy is inert.

use crate::event::Event;
use crate::hsm::{Handler, Response};
use crate::signal::Signal;
use std::fmt;

/// Opaque identity of a state handler, for diagnostics.
///
/// Derived from the handler's address; stable for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateId(usize);

impl StateId {
    pub fn of<M>(handler: Handler<M>) -> Self {
        StateId(handler as usize)
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "state@{:#x}", self.0)
    }
}

/// The directive a state handler returned, stripped of its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnKind {
    Handled,
    Ignored,
    Tran,
    Super,
}

impl<M> Response<M> {
    pub fn kind(&self) -> ReturnKind {
        match self {
            Response::Handled => ReturnKind::Handled,
            Response::Ignored => ReturnKind::Ignored,
            Response::Tran(_) => ReturnKind::Tran,
            Response::Super(_) => ReturnKind::Super,
        }
    }
}

impl fmt::Display for ReturnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReturnKind::Handled => "handled",
            ReturnKind::Ignored => "ignored",
            ReturnKind::Tran => "tran",
            ReturnKind::Super => "super",
        })
    }
}

/// Observer of dispatcher and framework activity.
///
/// `on_state_handler_called` fires for every handler invocation the
/// dispatcher makes, including EMPTY parent queries and ENTRY/EXIT/INIT
/// deliveries.
pub trait Spy: Send + Sync {
    fn on_signal_register(&self, _name: &str, _id: Signal) {}
    fn on_framework_add(&self, _actor: &str, _priority: u32) {}
    fn on_framework_stop(&self) {}
    fn on_hsm_dispatch_event(&self, _event: &Event) {}
    fn on_hsm_dispatch_pre(&self, _state: StateId) {}
    fn on_hsm_dispatch_post(&self, _states: &[StateId]) {}
    fn on_state_handler_called(&self, _state: StateId, _event: &Event, _returned: ReturnKind) {}
}

/// Shared spies delegate, so callers can keep a handle to an installed spy.
impl<T: Spy + ?Sized> Spy for std::sync::Arc<T> {
    fn on_signal_register(&self, name: &str, id: Signal) {
        (**self).on_signal_register(name, id);
    }

    fn on_framework_add(&self, actor: &str, priority: u32) {
        (**self).on_framework_add(actor, priority);
    }

    fn on_framework_stop(&self) {
        (**self).on_framework_stop();
    }

    fn on_hsm_dispatch_event(&self, event: &Event) {
        (**self).on_hsm_dispatch_event(event);
    }

    fn on_hsm_dispatch_pre(&self, state: StateId) {
        (**self).on_hsm_dispatch_pre(state);
    }

    fn on_hsm_dispatch_post(&self, states: &[StateId]) {
        (**self).on_hsm_dispatch_post(states);
    }

    fn on_state_handler_called(&self, state: StateId, event: &Event, returned: ReturnKind) {
        (**self).on_state_handler_called(state, event, returned);
    }
}

/// The do-nothing spy installed by default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSpy;

impl Spy for NullSpy {}
