// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::{json, Value};

use super::AGGREGATE;
use crate::config::OperatorDef;
use crate::engine::{Item, Operator, Port};
use crate::errors::PortError;
use crate::traits::Builtin;
use crate::types::TypeDescriptor;

/// Name of the delegate computing the next state.
pub const ITERATION: &str = "iteration";

/// Folds a stream into a single state.
///
/// For every input `{init, items}` the state starts at `init`. Each item is
/// sent as `{item, state}` through the `iteration` delegate, whose answer is
/// the new state. After the last item the state is pushed to the output.
///
/// ```text
///             +----------------------+
/// {init, ---> |  stream.aggregate    | ---> state
///  items}     +----------------------+
///               | iteration    ^
///               v {item,state} | state
/// ```
pub struct Aggregate;

impl Builtin for Aggregate {
    fn name(&self) -> &'static str {
        AGGREGATE
    }

    fn definition(&self) -> OperatorDef {
        let item = TypeDescriptor::generic("itemType");
        let state = TypeDescriptor::generic("stateType");
        OperatorDef::new(AGGREGATE)
            .with_service(
                "main",
                TypeDescriptor::map([
                    ("init", state.clone()),
                    ("items", TypeDescriptor::stream(item.clone())),
                ]),
                state.clone(),
            )
            .with_delegate(
                ITERATION,
                TypeDescriptor::stream(TypeDescriptor::map([
                    ("item", item),
                    ("state", state.clone()),
                ])),
                TypeDescriptor::stream(state),
            )
    }

    fn run(&self, op: &Operator<'_>) -> Result<(), PortError> {
        let main = op.main();
        let iteration = op.require_delegate(ITERATION);
        let (init, items) = (main.input().map("init"), main.input().map("items"));
        let (requests, replies) = (iteration.output(), iteration.input());

        while !op.check_stop() {
            let mut state = match init.pull()? {
                Item::Value(value) => value,
                Item::Marker(marker) => {
                    match items.try_pull_bos()? {
                        Some(other) if other == marker => {}
                        Some(other) => {
                            return Err(items.violation(format!("expected {marker}, got {other}")))
                        }
                        None => {
                            return Err(items.violation(format!("BOS arrived while init carried {marker}")))
                        }
                    }
                    main.output().push(marker)?;
                    continue;
                }
            };

            if let Some(outer) = items.try_pull_bos()? {
                return Err(items.violation(format!("init carried a value but items carried {outer}")));
            }
            requests.push_bos()?;
            replies.pull_bos()?;

            loop {
                let element = items.stream().pull()?;
                if items.own_eos(&element) {
                    break;
                }
                let Item::Value(item) = element else {
                    return Err(items.violation(format!("{element} inside open stream")));
                };
                requests.stream().push(json!({ "item": item, "state": state }))?;
                state = next_state(replies.stream().pull()?, &replies)?;
            }

            requests.push_eos()?;
            replies.pull_eos()?;
            main.output().push(state)?;
        }
        Ok(())
    }
}

fn next_state(reply: Item, replies: &Port<'_>) -> Result<Value, PortError> {
    match reply {
        Item::Value(value) => Ok(value),
        Item::Marker(marker) => Err(replies.violation(format!("expected the next state, got {marker}"))),
    }
}
