// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Signal identifiers and the name-interning registry.
//!
//! A signal is a dense small integer assigned at registration time. The
//! first six ids are reserved: four for the dispatcher's internal events
//! and two that mirror POSIX shutdown signals.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::HashMap;
use std::fmt;

/// An asynchronous stimulus that triggers reactions.
///
/// Signals are registered by name and resolve to a unique dense id that is
/// stable for the life of the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signal(u16);

impl Signal {
    /// Parent-link query; never delivered to applications.
    pub const EMPTY: Signal = Signal(0);
    /// State entry action.
    pub const ENTRY: Signal = Signal(1);
    /// State exit action.
    pub const EXIT: Signal = Signal(2);
    /// Initial-transition request.
    pub const INIT: Signal = Signal(3);
    /// Interrupt-style shutdown (Ctrl+C equivalent).
    pub const SIGINT: Signal = Signal(4);
    /// Terminate-style shutdown (kill equivalent).
    pub const SIGTERM: Signal = Signal(5);

    pub fn as_u16(self) -> u16 {
        self.0
    }

    /// True for the four dispatcher-internal signals.
    pub fn is_reserved(self) -> bool {
        self <= Signal::INIT
    }

    /// True for the POSIX-mirroring shutdown signals.
    pub fn is_shutdown(self) -> bool {
        self == Signal::SIGINT || self == Signal::SIGTERM
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Names of the pre-registered signals, in id order.
const RESERVED_NAMES: [&str; 6] = ["EMPTY", "ENTRY", "EXIT", "INIT", "SIGINT", "SIGTERM"];

/// Bijection between signal names and dense ids.
///
/// Not a process global: the framework owns one and all registration goes
/// through it. Registration of an existing name is idempotent.
#[derive(Debug)]
pub struct SignalRegistry {
    ids: HashMap<SmolStr, Signal>,
    names: Vec<SmolStr>,
}

impl SignalRegistry {
    /// Create a registry with the reserved signals already assigned.
    pub fn new() -> Self {
        let mut registry = Self { ids: HashMap::new(), names: Vec::new() };
        for name in RESERVED_NAMES {
            registry.register(name);
        }
        registry
    }

    /// Register `name`, returning its id. Existing names return their
    /// original id.
    pub fn register(&mut self, name: &str) -> Signal {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        assert!(self.names.len() < usize::from(u16::MAX), "signal registry is full");
        let id = Signal(self.names.len() as u16);
        let name = SmolStr::new(name);
        self.ids.insert(name.clone(), id);
        self.names.push(name);
        tracing::trace!(%id, name = %self.names[usize::from(id.0)], "signal registered");
        id
    }

    pub fn exists(&self, name: &str) -> bool {
        self.ids.contains_key(name)
    }

    /// Reverse lookup for diagnostics.
    pub fn name_of(&self, id: Signal) -> Option<&str> {
        self.names.get(usize::from(id.0)).map(SmolStr::as_str)
    }

    /// Number of registered signals (reserved ones included).
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for SignalRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "signal_tests.rs"]
mod tests;
