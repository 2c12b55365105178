// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events: an immutable pairing of a signal and an optional payload.
//!
//! Payloads are shared JSON values. Handlers only ever see `&Event`, so a
//! delivered payload cannot be mutated in place; an actor that wants to
//! derive a new value clones it first.

use crate::signal::Signal;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Failure to convert an application payload into an event value.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("payload is not serializable: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A `(signal, value)` pair passed between active objects.
///
/// Events compare by signal and payload content, and clone cheaply (the
/// payload is behind an `Arc`).
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    signal: Signal,
    value: Option<Arc<Value>>,
}

impl Event {
    /// An event carrying no payload.
    pub fn new(signal: Signal) -> Self {
        Self { signal, value: None }
    }

    /// An event carrying the given JSON value.
    pub fn with_value(signal: Signal, value: Value) -> Self {
        Self { signal, value: Some(Arc::new(value)) }
    }

    /// An event carrying any serializable payload, converted to an owned
    /// JSON value at construction so later changes to the source cannot
    /// leak into the queue.
    pub fn with_payload<T: Serialize>(signal: Signal, payload: &T) -> Result<Self, PayloadError> {
        Ok(Self::with_value(signal, serde_json::to_value(payload)?))
    }

    pub fn signal(&self) -> Signal {
        self.signal
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_deref()
    }

    // Reserved events, all payload-free.
    pub fn empty() -> Self {
        Self::new(Signal::EMPTY)
    }

    pub fn entry() -> Self {
        Self::new(Signal::ENTRY)
    }

    pub fn exit() -> Self {
        Self::new(Signal::EXIT)
    }

    pub fn init() -> Self {
        Self::new(Signal::INIT)
    }

    pub fn sigint() -> Self {
        Self::new(Signal::SIGINT)
    }

    pub fn sigterm() -> Self {
        Self::new(Signal::SIGTERM)
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
