// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::Value;

use super::FORK;
use crate::config::OperatorDef;
use crate::engine::{Item, Operator};
use crate::errors::PortError;
use crate::traits::Builtin;
use crate::types::TypeDescriptor;

/// Splits a stream of `{item, select}` records into the `true` and `false`
/// output streams by the value of `select`.
///
/// Both outputs open and close together, so every input stream yields
/// exactly one stream on each side, possibly empty.
pub struct Fork;

impl Builtin for Fork {
    fn name(&self) -> &'static str {
        FORK
    }

    fn definition(&self) -> OperatorDef {
        let item = TypeDescriptor::generic("itemType");
        OperatorDef::new(FORK).with_service(
            "main",
            TypeDescriptor::stream(TypeDescriptor::map([
                ("item", item.clone()),
                ("select", TypeDescriptor::Boolean),
            ])),
            TypeDescriptor::map([
                ("true", TypeDescriptor::stream(item.clone())),
                ("false", TypeDescriptor::stream(item)),
            ]),
        )
    }

    fn run(&self, op: &Operator<'_>) -> Result<(), PortError> {
        let main = op.main();
        let input = main.input();
        let (chosen, rest) = (main.output().map("true"), main.output().map("false"));

        while !op.check_stop() {
            if let Some(outer) = input.try_pull_bos()? {
                main.output().push(outer)?;
                continue;
            }
            chosen.push_bos()?;
            rest.push_bos()?;

            loop {
                let element = input.stream().pull()?;
                if input.own_eos(&element) {
                    break;
                }
                let mut record = match element {
                    Item::Value(Value::Object(record)) => record,
                    Item::Value(other) => return Err(input.stream().unexpected("a record", &other)),
                    Item::Marker(marker) => {
                        return Err(input.violation(format!("{marker} inside open stream")))
                    }
                };
                let item = record.remove("item").unwrap_or(Value::Null);
                match record.get("select") {
                    Some(Value::Bool(true)) => chosen.stream().push(item)?,
                    Some(Value::Bool(false)) => rest.stream().push(item)?,
                    other => {
                        return Err(input
                            .stream()
                            .map("select")
                            .unexpected("a boolean", other.unwrap_or(&Value::Null)))
                    }
                }
            }

            chosen.push_eos()?;
            rest.push_eos()?;
        }
        Ok(())
    }
}
