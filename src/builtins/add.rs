// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::{Number, Value};

use super::ADD;
use crate::config::OperatorDef;
use crate::engine::{Item, Operator};
use crate::errors::PortError;
use crate::traits::Builtin;
use crate::types::TypeDescriptor;

/// Adds the numbers `a` and `b`.
///
/// The sum is an integer when both operands are integers and it fits,
/// otherwise a float. Markers arriving on the input are forwarded.
pub struct Add;

impl Builtin for Add {
    fn name(&self) -> &'static str {
        ADD
    }

    fn definition(&self) -> OperatorDef {
        OperatorDef::new(ADD).with_service(
            "main",
            TypeDescriptor::map([("a", TypeDescriptor::Number), ("b", TypeDescriptor::Number)]),
            TypeDescriptor::Number,
        )
    }

    fn run(&self, op: &Operator<'_>) -> Result<(), PortError> {
        let main = op.main();
        let input = main.input();
        while !op.check_stop() {
            let operands = match input.pull()? {
                Item::Value(value) => value,
                marker => {
                    main.output().push(marker)?;
                    continue;
                }
            };
            let a = operand(op, "a", &operands)?;
            let b = operand(op, "b", &operands)?;
            let total = sum(a, b).ok_or_else(|| input.unexpected("a finite sum", &operands))?;
            main.output().push(total)?;
        }
        Ok(())
    }
}

fn operand<'v>(op: &Operator<'_>, field: &str, operands: &'v Value) -> Result<&'v Value, PortError> {
    match operands.get(field) {
        Some(value @ Value::Number(_)) => Ok(value),
        other => Err(op
            .main()
            .input()
            .map(field)
            .unexpected("a number", other.unwrap_or(&Value::Null))),
    }
}

fn sum(a: &Value, b: &Value) -> Option<Value> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        if let Some(total) = x.checked_add(y) {
            return Some(Value::from(total));
        }
    }
    let total = a.as_f64()? + b.as_f64()?;
    Number::from_f64(total).map(Value::Number)
}
