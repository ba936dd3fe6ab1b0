// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::{OperatorDef, Registry};
use crate::engine::{build, Item, Operator, Port, Runtime};
use crate::errors::PortError;
use crate::traits::Builtin;
use crate::types::{Generics, Properties, TypeDescriptor};

/// A builtin forwarding numbers from input to output unchanged.
pub struct PassThrough;

pub const PASS_THROUGH: &str = "test.pass";

impl Builtin for PassThrough {
    fn name(&self) -> &'static str {
        PASS_THROUGH
    }

    fn definition(&self) -> OperatorDef {
        OperatorDef::new(PASS_THROUGH).with_service(
            "main",
            TypeDescriptor::Number,
            TypeDescriptor::Number,
        )
    }

    fn run(&self, op: &Operator<'_>) -> Result<(), PortError> {
        let main = op.main();
        while !op.check_stop() {
            let item = main.input().pull()?;
            main.output().push(item)?;
        }
        Ok(())
    }
}

/// A builtin that breaks the marker protocol: every input number becomes a
/// stream element sent without an opening BOS.
pub struct Unbalanced;

pub const UNBALANCED: &str = "test.unbalanced";

impl Builtin for Unbalanced {
    fn name(&self) -> &'static str {
        UNBALANCED
    }

    fn definition(&self) -> OperatorDef {
        OperatorDef::new(UNBALANCED).with_service(
            "main",
            TypeDescriptor::Number,
            TypeDescriptor::stream(TypeDescriptor::Number),
        )
    }

    fn run(&self, op: &Operator<'_>) -> Result<(), PortError> {
        let main = op.main();
        while !op.check_stop() {
            if let Item::Value(value) = main.input().pull()? {
                main.output().stream().push(value)?;
            }
        }
        Ok(())
    }
}

/// A builtin whose connect hook refuses every connection.
pub struct Picky;

pub const PICKY: &str = "test.picky";

impl Builtin for Picky {
    fn name(&self) -> &'static str {
        PICKY
    }

    fn definition(&self) -> OperatorDef {
        OperatorDef::new(PICKY).with_service("main", TypeDescriptor::Number, TypeDescriptor::Number)
    }

    fn run(&self, _op: &Operator<'_>) -> Result<(), PortError> {
        Ok(())
    }

    fn on_connect(&self, _op: &Operator<'_>, _own: Port<'_>, _other: Port<'_>) -> Result<(), String> {
        Err("refuses every connection".to_string())
    }
}

/// Builds builtin `id` as the root of its own network, gives every boundary
/// port an unbounded mailbox so a test can drive it from one thread, and
/// starts it.
pub fn start_leaf(id: &str, generics: Generics, properties: Properties) -> Runtime {
    let registry = Registry::with_builtins();
    let mut built = build(&registry, id, &generics, &properties)
        .unwrap_or_else(|e| panic!("building {} failed: {}", id, e));
    for port in built.network.boundary_scalars(built.root) {
        built.network.bufferize(port);
    }
    Runtime::start(built.network, built.root).unwrap()
}
