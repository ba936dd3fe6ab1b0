// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message picks its own level inside [`StructuredLog::log`] and adds
//! its fields as structured tracing fields alongside the `Display` text.
//!
//! # Usage Pattern
//!
//! ```rust
//! use portflow::observability::messages::build::CompileCompleted;
//! use portflow::observability::messages::StructuredLog;
//!
//! let msg = CompileCompleted {
//!     root: "sum",
//!     merged: 2,
//!     leaves: 3,
//! };
//!
//! msg.log();
//! let _span = msg.span("compile").entered();
//! ```

use tracing::Span;

pub mod build;
pub mod runtime;
pub mod validation;

/// Emits a message at its own level with structured fields.
pub trait StructuredLog {
    fn log(&self);

    fn span(&self, name: &str) -> Span;
}
