// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Every diagnostic event in portflow is a small message struct implementing
//! `Display` and [`messages::StructuredLog`], so log text lives in one place
//! and call sites carry no format strings.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::build` - instantiation, wiring and compilation events
//! * `messages::runtime` - worker and network lifecycle events
//! * `messages::validation` - static blueprint validation findings
//!
//! # Usage
//!
//! ```rust
//! use portflow::observability::messages::runtime::WorkerStarted;
//! use portflow::observability::messages::StructuredLog;
//!
//! WorkerStarted { operator: "sum.agg" }.log();
//! ```

pub mod messages;
