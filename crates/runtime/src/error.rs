// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime error types

use thiserror::Error;

/// Failures integrating with the host event loop.
#[derive(Debug, Error)]
pub enum FrameworkError {
    #[error("failed to install OS signal handler: {0}")]
    SignalHandler(#[from] std::io::Error),
}
