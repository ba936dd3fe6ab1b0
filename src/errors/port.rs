// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Failures of push and pull at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortError {
    #[error("marker protocol violation on {port}: {reason}")]
    MarkerProtocolViolation { port: String, reason: String },

    /// The network was stopped while the call was blocked.
    #[error("network stopped")]
    Stopped,

    #[error("port {port} expected {expected}, got {found}")]
    UnexpectedValue {
        port: String,
        expected: String,
        found: String,
    },

    #[error("port {port} is an input inside the graph and cannot be pushed to")]
    WrongDirection { port: String },
}

impl PortError {
    pub fn is_stopped(&self) -> bool {
        matches!(self, PortError::Stopped)
    }
}
