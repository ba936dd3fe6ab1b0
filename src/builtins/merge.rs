// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::Value;

use super::MERGE;
use crate::config::OperatorDef;
use crate::engine::{Item, Marker, Operator, Port};
use crate::errors::PortError;
use crate::traits::Builtin;
use crate::types::TypeDescriptor;

/// Interleaves the `true` and `false` streams back into one, taking the next
/// item from the side named by each element of `select`.
///
/// The inverse of `stream.fork` when given the same `select` sequence.
pub struct Merge;

impl Builtin for Merge {
    fn name(&self) -> &'static str {
        MERGE
    }

    fn definition(&self) -> OperatorDef {
        let item = TypeDescriptor::generic("itemType");
        OperatorDef::new(MERGE).with_service(
            "main",
            TypeDescriptor::map([
                ("true", TypeDescriptor::stream(item.clone())),
                ("false", TypeDescriptor::stream(item.clone())),
                ("select", TypeDescriptor::stream(TypeDescriptor::Boolean)),
            ]),
            TypeDescriptor::stream(item),
        )
    }

    fn run(&self, op: &Operator<'_>) -> Result<(), PortError> {
        let main = op.main();
        let input = main.input();
        let (chosen, rest, select) = (input.map("true"), input.map("false"), input.map("select"));
        let output = main.output();

        while !op.check_stop() {
            if let Some(outer) = select.try_pull_bos()? {
                expect_marker(&chosen, outer)?;
                expect_marker(&rest, outer)?;
                output.push(outer)?;
                continue;
            }
            chosen.pull_bos()?;
            rest.pull_bos()?;
            output.push_bos()?;

            loop {
                let flag = select.stream().pull()?;
                if select.own_eos(&flag) {
                    break;
                }
                let side = match &flag {
                    Item::Value(Value::Bool(true)) => chosen,
                    Item::Value(Value::Bool(false)) => rest,
                    Item::Value(other) => return Err(select.stream().unexpected("a boolean", other)),
                    Item::Marker(marker) => {
                        return Err(select.violation(format!("{marker} inside open stream")))
                    }
                };
                match side.stream().pull()? {
                    Item::Value(value) => output.stream().push(value)?,
                    Item::Marker(marker) => {
                        return Err(side.violation(format!("select asked for an item, got {marker}")))
                    }
                }
            }

            chosen.pull_eos()?;
            rest.pull_eos()?;
            output.push_eos()?;
        }
        Ok(())
    }
}

/// Pulls from `side` and requires the enclosing marker `expected`.
fn expect_marker(side: &Port<'_>, expected: Marker) -> Result<(), PortError> {
    match side.try_pull_bos()? {
        Some(marker) if marker == expected => Ok(()),
        Some(marker) => Err(side.violation(format!("expected {expected}, got {marker}"))),
        None => Err(side.violation(format!("BOS arrived while select carried {expected}"))),
    }
}
