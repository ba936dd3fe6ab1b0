// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for network and worker lifecycle events.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Workers for every leaf operator were spawned.
///
/// # Log Level
/// `info!` - Important operational event
pub struct NetworkStarted<'a> {
    pub root: &'a str,
    pub workers: usize,
}

impl Display for NetworkStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Started network '{}' with {} workers",
            self.root, self.workers
        )
    }
}

impl StructuredLog for NetworkStarted<'_> {
    fn log(&self) {
        tracing::info!(root = self.root, workers = self.workers, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "network",
            span_name = name,
            root = self.root,
            workers = self.workers,
        )
    }
}

/// The network was stopped and all workers joined.
///
/// # Log Level
/// `info!` - Important operational event
pub struct NetworkStopped<'a> {
    pub root: &'a str,
    pub failures: usize,
    pub uptime: std::time::Duration,
}

impl Display for NetworkStopped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stopped network '{}' after {:?} ({} worker failures)",
            self.root, self.uptime, self.failures
        )
    }
}

impl StructuredLog for NetworkStopped<'_> {
    fn log(&self) {
        tracing::info!(
            root = self.root,
            failures = self.failures,
            uptime_ms = self.uptime.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "network_stopped",
            span_name = name,
            root = self.root,
            uptime = ?self.uptime,
        )
    }
}

/// A worker thread entered its operator's run loop.
///
/// # Log Level
/// `debug!`
pub struct WorkerStarted<'a> {
    pub operator: &'a str,
}

impl Display for WorkerStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Worker for '{}' started", self.operator)
    }
}

impl StructuredLog for WorkerStarted<'_> {
    fn log(&self) {
        tracing::debug!(operator = self.operator, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("worker", span_name = name, operator = self.operator)
    }
}

/// A worker observed the stop signal and exited cleanly.
///
/// # Log Level
/// `debug!`
pub struct WorkerStopped<'a> {
    pub operator: &'a str,
}

impl Display for WorkerStopped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Worker for '{}' stopped", self.operator)
    }
}

impl StructuredLog for WorkerStopped<'_> {
    fn log(&self) {
        tracing::debug!(operator = self.operator, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("worker_stopped", span_name = name, operator = self.operator)
    }
}

/// A worker's run loop returned an error.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct WorkerFailed<'a> {
    pub operator: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for WorkerFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Worker for '{}' failed: {}", self.operator, self.error)
    }
}

impl StructuredLog for WorkerFailed<'_> {
    fn log(&self) {
        tracing::error!(
            operator = self.operator,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "worker_failed",
            span_name = name,
            operator = self.operator,
            error = %self.error,
        )
    }
}

/// A worker thread panicked.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct WorkerPanicked<'a> {
    pub operator: &'a str,
    pub message: &'a str,
}

impl Display for WorkerPanicked<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Worker for '{}' panicked: {}", self.operator, self.message)
    }
}

impl StructuredLog for WorkerPanicked<'_> {
    fn log(&self) {
        tracing::error!(operator = self.operator, message = self.message, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("worker_panicked", span_name = name, operator = self.operator)
    }
}
