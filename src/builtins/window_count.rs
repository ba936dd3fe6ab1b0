// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::VecDeque;

use serde_json::Value;

use super::WINDOW_COUNT;
use crate::config::OperatorDef;
use crate::engine::{Item, Operator, Port};
use crate::errors::PortError;
use crate::traits::Builtin;
use crate::types::TypeDescriptor;

/// Cuts a stream into count-based windows.
///
/// Properties:
/// * `size` - Most items a window holds
/// * `slide` - Items between two window emissions
/// * `start` - Items to receive before the first window is emitted
/// * `end` - Shortest window emitted once the input stream closes
///
/// Every input stream becomes one stream of windows. While the input is
/// open, the last `size` items are emitted after `start` items and then
/// every `slide` items. Each window starts `slide` items after the previous
/// one, so once the input closes the windows still due are emitted, shortest
/// last, for as long as they hold at least `end` items.
pub struct WindowCount;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Window {
    size: usize,
    slide: usize,
    start: usize,
    end: usize,
}

impl Window {
    fn from_operator(op: &Operator<'_>) -> Result<Self, String> {
        let window = Window {
            size: count(op, "size")?,
            slide: count(op, "slide")?,
            start: count(op, "start")?,
            end: count(op, "end")?,
        };
        if window.size == 0 {
            return Err("size must be at least 1".to_string());
        }
        if window.slide == 0 {
            return Err("slide must be at least 1".to_string());
        }
        Ok(window)
    }

    fn due(&self, received: usize) -> bool {
        received >= self.start && (received - self.start) % self.slide == 0
    }
}

fn count(op: &Operator<'_>, name: &str) -> Result<usize, String> {
    let value = op
        .property(name)
        .ok_or_else(|| format!("missing property '{name}'"))?;
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64))
        .map(|n| n as usize)
        .ok_or_else(|| format!("property '{name}' = {value} is not a count"))
}

fn emit<'v>(output: &Port<'_>, items: impl Iterator<Item = &'v Value>) -> Result<(), PortError> {
    output.stream().push(Value::Array(items.cloned().collect()))
}

impl Builtin for WindowCount {
    fn name(&self) -> &'static str {
        WINDOW_COUNT
    }

    fn definition(&self) -> OperatorDef {
        let item = TypeDescriptor::generic("itemType");
        OperatorDef::new(WINDOW_COUNT)
            .with_service(
                "main",
                TypeDescriptor::stream(item.clone()),
                TypeDescriptor::stream(TypeDescriptor::stream(item)),
            )
            .with_property("size", TypeDescriptor::Number)
            .with_property("slide", TypeDescriptor::Number)
            .with_property("start", TypeDescriptor::Number)
            .with_property("end", TypeDescriptor::Number)
    }

    fn run(&self, op: &Operator<'_>) -> Result<(), PortError> {
        let main = op.main();
        let (input, output) = (main.input(), main.output());
        let window = Window::from_operator(op)
            .map_err(|reason| input.unexpected("valid window properties", &Value::String(reason)))?;

        while !op.check_stop() {
            if let Some(outer) = input.try_pull_bos()? {
                output.push(outer)?;
                continue;
            }
            output.push_bos()?;

            let mut buffer = VecDeque::with_capacity(window.size);
            let (mut received, mut next_start) = (0, 0);
            loop {
                let element = input.stream().pull()?;
                if input.own_eos(&element) {
                    break;
                }
                let Item::Value(value) = element else {
                    return Err(input.violation(format!("{element} inside open stream")));
                };
                if buffer.len() == window.size {
                    buffer.pop_front();
                }
                buffer.push_back(value);
                received += 1;
                if window.due(received) {
                    emit(&output, buffer.iter())?;
                    next_start = received - buffer.len() + window.slide;
                }
            }

            // buffer holds items oldest..received
            let oldest = received - buffer.len();
            let shortest = window.end.max(1);
            next_start = next_start.max(oldest);
            while received.saturating_sub(next_start) >= shortest {
                emit(&output, buffer.iter().skip(next_start - oldest))?;
                next_start += window.slide;
            }

            output.push_eos()?;
        }
        Ok(())
    }

    fn on_connect(&self, op: &Operator<'_>, _own: Port<'_>, _other: Port<'_>) -> Result<(), String> {
        Window::from_operator(op).map(|_| ())
    }
}
