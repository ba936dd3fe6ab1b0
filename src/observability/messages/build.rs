// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for network assembly events.
//!
//! This module contains message types for logging events related to:
//! * Operator instantiation from the registry
//! * Port connections and rejected connections
//! * Flattening of composite operators

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// An operator was instantiated into a network.
///
/// # Log Level
/// `debug!` - Assembly detail
pub struct OperatorInstantiated<'a> {
    pub operator: &'a str,
    pub definition: &'a str,
    pub leaf: bool,
}

impl Display for OperatorInstantiated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let kind = if self.leaf { "builtin" } else { "blueprint" };
        write!(
            f,
            "Instantiated operator '{}' from {} '{}'",
            self.operator, kind, self.definition
        )
    }
}

impl StructuredLog for OperatorInstantiated<'_> {
    fn log(&self) {
        tracing::debug!(
            operator = self.operator,
            definition = self.definition,
            leaf = self.leaf,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "instantiate",
            span_name = name,
            operator = self.operator,
            definition = self.definition,
        )
    }
}

/// Two ports were connected.
///
/// # Log Level
/// `trace!` - One event per connection
pub struct ConnectionEstablished<'a> {
    pub src: &'a str,
    pub dst: &'a str,
    pub links: usize,
}

impl Display for ConnectionEstablished<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Connected {} -> {} ({} scalar links)",
            self.src, self.dst, self.links
        )
    }
}

impl StructuredLog for ConnectionEstablished<'_> {
    fn log(&self) {
        tracing::trace!(src = self.src, dst = self.dst, links = self.links, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!("connect", span_name = name, src = self.src, dst = self.dst)
    }
}

/// A builtin's connect hook refused a connection, which was rolled back.
///
/// # Log Level
/// `warn!` - Build will fail
pub struct ConnectionRefused<'a> {
    pub operator: &'a str,
    pub src: &'a str,
    pub dst: &'a str,
    pub reason: &'a str,
}

impl Display for ConnectionRefused<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Operator '{}' refused connection {} -> {}: {}",
            self.operator, self.src, self.dst, self.reason
        )
    }
}

impl StructuredLog for ConnectionRefused<'_> {
    fn log(&self) {
        tracing::warn!(
            operator = self.operator,
            src = self.src,
            dst = self.dst,
            reason = self.reason,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("connect_refused", span_name = name, operator = self.operator)
    }
}

/// Composite operators under a root were flattened.
///
/// # Log Level
/// `info!` - Once per compilation
pub struct CompileCompleted<'a> {
    pub root: &'a str,
    pub merged: usize,
    pub leaves: usize,
}

impl Display for CompileCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Compiled '{}': lifted {} leaf operators, {} leaves total",
            self.root, self.merged, self.leaves
        )
    }
}

impl StructuredLog for CompileCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            root = self.root,
            merged = self.merged,
            leaves = self.leaves,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "compile",
            span_name = name,
            root = self.root,
            merged = self.merged,
        )
    }
}

/// An output port has no consumer; whatever is pushed there will block.
///
/// # Log Level
/// `warn!` - Likely wiring mistake
pub struct DanglingOutput<'a> {
    pub operator: &'a str,
    pub port: &'a str,
}

impl Display for DanglingOutput<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Output {} of operator '{}' is not connected, items pushed on it are dropped",
            self.port, self.operator
        )
    }
}

impl StructuredLog for DanglingOutput<'_> {
    fn log(&self) {
        tracing::warn!(operator = self.operator, port = self.port, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("dangling_output", span_name = name, port = self.port)
    }
}

/// A registry entry was replaced by a later registration with the same id.
///
/// # Log Level
/// `warn!` - Possibly unintended shadowing
pub struct DefinitionReplaced<'a> {
    pub id: &'a str,
}

impl Display for DefinitionReplaced<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Definition '{}' replaced by a later registration", self.id)
    }
}

impl StructuredLog for DefinitionReplaced<'_> {
    fn log(&self) {
        tracing::warn!(id = self.id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("definition_replaced", span_name = name, id = self.id)
    }
}

/// A blueprint file was parsed.
///
/// # Log Level
/// `debug!`
pub struct BlueprintLoaded<'a> {
    pub path: &'a str,
    pub id: &'a str,
}

impl Display for BlueprintLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Loaded blueprint '{}' from {}", self.id, self.path)
    }
}

impl StructuredLog for BlueprintLoaded<'_> {
    fn log(&self) {
        tracing::debug!(path = self.path, id = self.id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("blueprint_loaded", span_name = name, id = self.id)
    }
}
