// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::OperatorDef;
use crate::engine::{Operator, Port};
use crate::errors::PortError;

/// An operator implemented in Rust.
///
/// A builtin is a leaf of every network it appears in. After compilation
/// each builtin instance gets its own worker thread, which calls [`run`]
/// once; `run` loops over rounds of pulling inputs and pushing outputs until
/// a port call reports [`PortError::Stopped`] or [`Operator::check_stop`]
/// turns true.
///
/// [`run`]: Builtin::run
pub trait Builtin: Send + Sync {
    /// Registry id, also the `id` of [`Builtin::definition`].
    fn name(&self) -> &'static str;

    /// Interface of the builtin. Types may mention generics that instances
    /// specify.
    fn definition(&self) -> OperatorDef;

    fn run(&self, op: &Operator<'_>) -> Result<(), PortError>;

    /// Called after `own`, a port of `op`, was connected to `other`.
    /// Returning an error undoes the connection.
    fn on_connect(&self, _op: &Operator<'_>, _own: Port<'_>, _other: Port<'_>) -> Result<(), String> {
        Ok(())
    }
}
