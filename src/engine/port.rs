// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Push and pull on ports, including the stream marker protocol.
//!
//! Values are pushed at any level of a port tree and travel as scalars:
//! a map value is split into its fields (in field-name order), a stream value
//! becomes `BOS`, its elements, `EOS`. Pulling reassembles the value on the
//! receiving side. A marker seen where a value was expected belongs to an
//! enclosing stream and is handed back up unchanged, so operators that do
//! not care about stream boundaries pass them along by pushing whatever they
//! pull.

use super::marker::{Item, Marker, MarkerKind, StreamId};
use super::network::{Boundary, Direction, Network, PortId, Shape, StreamState};
use super::operator::Operator;
use crate::errors::PortError;
use crate::types::TypeDescriptor;
use serde_json::Value;
use std::sync::atomic::Ordering;
use std::sync::{MutexGuard, PoisonError};

/// Borrowed handle to one port of a [`Network`].
#[derive(Clone, Copy)]
pub struct Port<'n> {
    net: &'n Network,
    id: PortId,
}

impl<'n> Port<'n> {
    pub(crate) fn new(net: &'n Network, id: PortId) -> Self {
        Port { net, id }
    }

    pub fn id(&self) -> PortId {
        self.id
    }

    pub fn name(&self) -> String {
        self.net.port_name(self.id)
    }

    pub fn direction(&self) -> Direction {
        self.net.ports[self.id.0].direction
    }

    pub fn type_descriptor(&self) -> &'n TypeDescriptor {
        &self.net.ports[self.id.0].ty
    }

    pub fn boundary(&self) -> &'n Boundary {
        &self.net.ports[self.id.0].boundary
    }

    pub fn operator(&self) -> Operator<'n> {
        Operator::new(self.net, self.net.ports[self.id.0].operator)
    }

    pub fn parent(&self) -> Option<Port<'n>> {
        self.net.ports[self.id.0]
            .parent
            .map(|id| Port::new(self.net, id))
    }

    pub fn is_stream(&self) -> bool {
        matches!(self.shape(), Shape::Stream(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self.shape(), Shape::Map(_))
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self.shape(), Shape::Scalar)
    }

    /// Field `name` of a map port.
    ///
    /// # Panics
    /// If this is not a map port or has no such field.
    pub fn map(&self, name: &str) -> Port<'n> {
        self.try_map(name)
            .unwrap_or_else(|| panic!("{} has no map field '{}'", self.name(), name))
    }

    pub fn try_map(&self, name: &str) -> Option<Port<'n>> {
        match self.shape() {
            Shape::Map(fields) => fields.get(name).map(|id| Port::new(self.net, *id)),
            _ => None,
        }
    }

    /// Element port of a stream port.
    ///
    /// # Panics
    /// If this is not a stream port.
    pub fn stream(&self) -> Port<'n> {
        self.try_stream()
            .unwrap_or_else(|| panic!("{} is not a stream port", self.name()))
    }

    pub fn try_stream(&self) -> Option<Port<'n>> {
        match self.shape() {
            Shape::Stream(element) => Some(Port::new(self.net, *element)),
            _ => None,
        }
    }

    pub fn connected_to(&self, other: &Port<'_>) -> bool {
        self.net.connected(self.id, other.id)
    }

    fn shape(&self) -> &'n Shape {
        &self.net.ports[self.id.0].shape
    }

    fn state(&self) -> MutexGuard<'n, StreamState> {
        self.net.ports[self.id.0]
            .stream
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn violation(&self, reason: String) -> PortError {
        PortError::MarkerProtocolViolation {
            port: self.name(),
            reason,
        }
    }

    pub(crate) fn unexpected(&self, expected: &str, found: &Value) -> PortError {
        PortError::UnexpectedValue {
            port: self.name(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// Pushes a value or marker. Blocks until every receiver took it, unless
    /// the receiving mailboxes are buffered.
    ///
    /// Inputs can only be pushed on an operator that has no parent; inside a
    /// graph they are fed by their source.
    pub fn push(&self, item: impl Into<Item>) -> Result<(), PortError> {
        if self.direction() == Direction::In && self.operator().parent().is_some() {
            return Err(PortError::WrongDirection { port: self.name() });
        }
        self.push_item(item.into())
    }

    fn push_item(&self, item: Item) -> Result<(), PortError> {
        match self.shape() {
            Shape::Scalar => self.deliver(item),
            Shape::Stream(element) => {
                let element = Port::new(self.net, *element);
                match item {
                    Item::Marker(marker) => element.push_item(Item::Marker(marker.descend())),
                    Item::Value(Value::Array(values)) => {
                        self.push_bos()?;
                        for value in values {
                            element.push_item(Item::Value(value))?;
                        }
                        self.push_eos()
                    }
                    Item::Value(other) => Err(self.unexpected("an array", &other)),
                }
            }
            Shape::Map(fields) => match item {
                Item::Marker(marker) => {
                    for id in fields.values() {
                        Port::new(self.net, *id).push_item(Item::Marker(marker))?;
                    }
                    Ok(())
                }
                Item::Value(Value::Object(mut object)) => {
                    for (name, id) in fields {
                        let value = object.remove(name).unwrap_or(Value::Null);
                        Port::new(self.net, *id).push_item(Item::Value(value))?;
                    }
                    Ok(())
                }
                Item::Value(other) => Err(self.unexpected("an object", &other)),
            },
        }
    }

    /// Sends `item` to every destination. A port without destinations keeps
    /// the item in its own mailbox when its operator is the root; inside a
    /// graph nothing reads that mailbox, so the item is dropped.
    fn deliver(&self, item: Item) -> Result<(), PortError> {
        let dests = &self.net.ports[self.id.0].dests;
        if dests.is_empty() {
            if self.operator().parent().is_some() {
                return Ok(());
            }
            return self.net.send_to(self.id, item);
        }
        for dest in dests {
            self.net.send_to(*dest, item.clone())?;
        }
        Ok(())
    }

    /// Pulls one complete item: a scalar, a whole map, a whole stream
    /// instance, or a marker belonging to an enclosing stream.
    pub fn pull(&self) -> Result<Item, PortError> {
        match self.shape() {
            Shape::Scalar => self.net.receive(self.id),
            Shape::Stream(element) => self.pull_stream(Port::new(self.net, *element)),
            Shape::Map(fields) => {
                let mut values = serde_json::Map::new();
                let mut markers: Vec<(&String, Marker)> = Vec::new();
                for (name, id) in fields {
                    match Port::new(self.net, *id).pull()? {
                        Item::Value(value) => {
                            values.insert(name.clone(), value);
                        }
                        Item::Marker(marker) => markers.push((name, marker)),
                    }
                }

                let Some(&(_, first)) = markers.first() else {
                    return Ok(Item::Value(Value::Object(values)));
                };
                if !values.is_empty() {
                    return Err(self.violation(format!(
                        "fields [{}] carry values while [{}] carry markers",
                        values.keys().cloned().collect::<Vec<_>>().join(", "),
                        markers.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>().join(", ")
                    )));
                }
                if let Some((name, other)) = markers.iter().find(|(_, m)| *m != first) {
                    return Err(self.violation(format!(
                        "field '{}' carries {} while '{}' carries {}",
                        markers[0].0, first, name, other
                    )));
                }
                Ok(Item::Marker(first))
            }
        }
    }

    fn pull_stream(&self, element: Port<'n>) -> Result<Item, PortError> {
        let opening = match element.pull()? {
            Item::Marker(marker) => marker,
            Item::Value(value) => {
                return Err(self.violation(format!("expected BOS, got value {value}")))
            }
        };
        if opening.depth() != 1 {
            return Ok(Item::Marker(opening.ascend()));
        }
        if opening.is_eos() {
            return Err(self.violation(format!("{opening} arrived without an open stream")));
        }

        self.state().receiving = Some(opening.stream());
        let mut values = Vec::new();
        loop {
            match element.pull()? {
                Item::Value(value) => values.push(value),
                Item::Marker(closing) if closing.depth() == 1 && closing.is_eos() => {
                    if !closing.same_instance(&opening) {
                        return Err(self.violation(format!(
                            "stream {} closed by {}",
                            opening.stream(),
                            closing
                        )));
                    }
                    self.state().receiving = None;
                    return Ok(Item::Value(Value::Array(values)));
                }
                Item::Marker(other) => {
                    return Err(self.violation(format!(
                        "{} inside open stream {}",
                        other,
                        opening.stream()
                    )))
                }
            }
        }
    }

    /// Pulls one item and reports whether it is a marker.
    pub fn pull_marked(&self) -> Result<(Item, bool), PortError> {
        let item = self.pull()?;
        let marked = item.is_marker();
        Ok((item, marked))
    }

    /// Opens a new stream instance on this stream port.
    ///
    /// # Panics
    /// If this is not a stream port.
    pub fn push_bos(&self) -> Result<(), PortError> {
        let element = self.stream();
        let stream = {
            let mut state = self.state();
            if let Some(open) = state.sending {
                return Err(self.violation(format!("BOS pushed while {open} is open")));
            }
            let stream = StreamId {
                source: self.id,
                seq: self.net.ports[self.id.0]
                    .sequence
                    .fetch_add(1, Ordering::Relaxed),
            };
            state.sending = Some(stream);
            stream
        };
        element.push_item(Item::Marker(Marker::new(MarkerKind::Bos, stream).descend()))
    }

    /// Closes the instance opened by the last [`Port::push_bos`].
    pub fn push_eos(&self) -> Result<(), PortError> {
        let element = self.stream();
        let Some(stream) = self.state().sending.take() else {
            return Err(self.violation("EOS pushed without an open stream".to_string()));
        };
        element.push_item(Item::Marker(Marker::new(MarkerKind::Eos, stream).descend()))
    }

    /// Pulls the next item from the element port and requires it to be this
    /// port's BOS.
    pub fn pull_bos(&self) -> Result<(), PortError> {
        match self.try_pull_bos()? {
            None => Ok(()),
            Some(outer) => Err(self.violation(format!("expected BOS, got enclosing {outer}"))),
        }
    }

    /// Like [`Port::pull_bos`], but a marker of an enclosing stream is
    /// returned (already lifted to this port's level) instead of failing.
    pub fn try_pull_bos(&self) -> Result<Option<Marker>, PortError> {
        match self.stream().pull()? {
            Item::Marker(marker) if marker.depth() == 1 && marker.is_bos() => {
                self.state().receiving = Some(marker.stream());
                Ok(None)
            }
            Item::Marker(marker) if marker.depth() > 1 => Ok(Some(marker.ascend())),
            other => Err(self.violation(format!("expected BOS, got {other}"))),
        }
    }

    /// Pulls the next item from the element port and requires it to be the
    /// EOS of the open instance.
    pub fn pull_eos(&self) -> Result<(), PortError> {
        let item = self.stream().pull()?;
        if self.own_eos(&item) {
            self.state().receiving = None;
            return Ok(());
        }
        let open = self.state().receiving;
        Err(match open {
            Some(open) => self.violation(format!("expected EOS of {open}, got {item}")),
            None => self.violation(format!("expected EOS, got {item}")),
        })
    }

    /// True when `item`, pulled from this port's element port, opens one of
    /// this port's stream instances.
    pub fn own_bos(&self, item: &Item) -> bool {
        self.is_stream()
            && matches!(item, Item::Marker(m) if m.is_bos() && m.depth() == 1)
    }

    /// True when `item`, pulled from this port's element port, closes this
    /// port's stream instance. When an instance was opened through
    /// [`Port::pull_bos`] the ids must also agree.
    pub fn own_eos(&self, item: &Item) -> bool {
        if !self.is_stream() {
            return false;
        }
        match item {
            Item::Marker(m) if m.is_eos() && m.depth() == 1 => self
                .state()
                .receiving
                .map_or(true, |open| open == m.stream()),
            _ => false,
        }
    }
}

impl std::fmt::Debug for Port<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Port")
            .field("id", &self.id)
            .field("name", &self.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::network::OperatorKind;
    use crate::types::TypeDescriptor as T;
    use serde_json::json;
    use std::thread;

    /// Two unparented operators with `ty` flowing from a's output to b's input.
    fn wired(ty: &T) -> (Network, PortId, PortId) {
        let mut net = Network::new();
        let a = net.add_operator("a", "test", OperatorKind::composite());
        let b = net.add_operator("b", "test", OperatorKind::composite());
        let out = net.add_service(a, "main", &T::Trigger, ty).output;
        let input = net.add_service(b, "main", ty, &T::Trigger).input;
        net.connect(out, input).unwrap();
        (net, out, input)
    }

    #[test]
    fn scalar_value_passes_through() {
        let (net, out, input) = wired(&T::Number);
        thread::scope(|s| {
            s.spawn(|| net.port(out).push(json!(42)).unwrap());
            assert_eq!(net.port(input).pull().unwrap(), Item::Value(json!(42)));
        });
    }

    #[test]
    fn stream_push_is_delimited() {
        let (net, out, input) = wired(&T::stream(T::Number));
        thread::scope(|s| {
            s.spawn(|| net.port(out).push(json!([1, 2, 3])).unwrap());

            let consumer = net.port(input);
            let element = consumer.stream();
            let bos = element.pull().unwrap();
            assert!(consumer.own_bos(&bos));
            for expected in [1, 2, 3] {
                assert_eq!(element.pull().unwrap(), Item::Value(json!(expected)));
            }
            let eos = element.pull().unwrap();
            assert!(consumer.own_eos(&eos));
            assert!(eos.as_marker().unwrap().same_instance(bos.as_marker().unwrap()));
        });
    }

    #[test]
    fn stream_pull_reassembles_array() {
        let (net, out, input) = wired(&T::stream(T::String));
        thread::scope(|s| {
            s.spawn(|| {
                let port = net.port(out);
                port.push(json!(["x", "y"])).unwrap();
                port.push(json!([])).unwrap();
            });
            let port = net.port(input);
            assert_eq!(port.pull().unwrap(), Item::Value(json!(["x", "y"])));
            assert_eq!(port.pull().unwrap(), Item::Value(json!([])));
        });
    }

    #[test]
    fn map_value_splits_and_rejoins() {
        let ty = T::map([("a", T::Number), ("b", T::String)]);
        let (net, out, input) = wired(&ty);
        thread::scope(|s| {
            s.spawn(|| net.port(out).push(json!({"a": 1, "b": "two"})).unwrap());
            assert_eq!(
                net.port(input).pull().unwrap(),
                Item::Value(json!({"a": 1, "b": "two"}))
            );
        });
    }

    #[test]
    fn missing_map_fields_become_null() {
        let ty = T::map([("a", T::Primitive), ("b", T::Primitive)]);
        let (net, out, input) = wired(&ty);
        thread::scope(|s| {
            s.spawn(|| net.port(out).push(json!({"b": true})).unwrap());
            assert_eq!(
                net.port(input).pull().unwrap(),
                Item::Value(json!({"a": null, "b": true}))
            );
        });
    }

    #[test]
    fn stream_of_maps_round_trips() {
        let ty = T::stream(T::map([("item", T::String), ("select", T::Boolean)]));
        let (net, out, input) = wired(&ty);
        let value = json!([{"item": "a", "select": true}, {"item": "b", "select": false}]);
        let net = &net;
        thread::scope(|s| {
            let sent = value.clone();
            s.spawn(move || net.port(out).push(sent).unwrap());
            assert_eq!(net.port(input).pull().unwrap(), Item::Value(value));
        });
    }

    #[test]
    fn enclosing_markers_pass_through_inner_stream() {
        let ty = T::stream(T::stream(T::Number));
        let (net, out, input) = wired(&ty);
        thread::scope(|s| {
            s.spawn(|| {
                let port = net.port(out);
                port.push_bos().unwrap();
                port.stream().push(json!([7])).unwrap();
                port.push_eos().unwrap();
            });

            let outer = net.port(input);
            let inner = outer.stream();
            // The outer BOS is foreign to the inner port and comes back lifted.
            let bos = inner.pull().unwrap();
            assert!(outer.own_bos(&bos));
            assert_eq!(inner.pull().unwrap(), Item::Value(json!([7])));
            let eos = inner.pull().unwrap();
            assert!(outer.own_eos(&eos));
        });
    }

    #[test]
    fn pull_bos_and_pull_eos_track_instances() {
        let (net, out, input) = wired(&T::stream(T::Number));
        thread::scope(|s| {
            s.spawn(|| {
                let port = net.port(out);
                port.push_bos().unwrap();
                port.stream().push(json!(5)).unwrap();
                port.push_eos().unwrap();
            });
            let port = net.port(input);
            port.pull_bos().unwrap();
            assert_eq!(port.stream().pull().unwrap(), Item::Value(json!(5)));
            port.pull_eos().unwrap();
        });
    }

    #[test]
    fn double_bos_is_a_violation() {
        let (mut net, out, input) = wired(&T::stream(T::Number));
        net.bufferize(input);

        let port = net.port(out);
        port.push_bos().unwrap();
        let err = port.push_bos().unwrap_err();
        assert!(matches!(err, PortError::MarkerProtocolViolation { .. }));
    }

    #[test]
    fn eos_without_bos_is_a_violation() {
        let (net, out, _) = wired(&T::stream(T::Number));
        let err = net.port(out).push_eos().unwrap_err();
        assert!(matches!(err, PortError::MarkerProtocolViolation { .. }));
    }

    #[test]
    fn value_before_bos_is_a_violation() {
        let (net, out, input) = wired(&T::stream(T::Number));
        thread::scope(|s| {
            s.spawn(|| net.port(out).stream().push(json!(1)).unwrap());
            let err = net.port(input).pull().unwrap_err();
            assert!(matches!(err, PortError::MarkerProtocolViolation { .. }));
        });
    }

    #[test]
    fn mixed_map_fields_are_a_violation() {
        let ty = T::stream(T::map([("a", T::Number), ("b", T::Number)]));
        let (mut net, out, input) = wired(&ty);
        net.bufferize(input);

        let producer = net.port(out);
        producer.push_bos().unwrap();
        producer.stream().push(json!({"a": 1, "b": 2})).unwrap();
        // Field a gets one more value than b before the EOS.
        producer.stream().map("a").push(json!(3)).unwrap();
        producer.push_eos().unwrap();

        let consumer = net.port(input);
        consumer.pull_bos().unwrap();
        let element = consumer.stream();
        assert_eq!(element.pull().unwrap(), Item::Value(json!({"a": 1, "b": 2})));
        let err = element.pull().unwrap_err();
        assert!(matches!(err, PortError::MarkerProtocolViolation { .. }));
    }

    #[test]
    fn wrong_shape_is_rejected() {
        let (net, out, _) = wired(&T::stream(T::Number));
        let err = net.port(out).push(json!(3)).unwrap_err();
        assert!(matches!(err, PortError::UnexpectedValue { .. }));
    }

    #[test]
    fn inner_inputs_cannot_be_pushed() {
        let mut net = Network::new();
        let root = net.add_operator("root", "test", OperatorKind::composite());
        let child = net.add_operator("child", "test", OperatorKind::composite());
        net.set_parent(child, root).unwrap();
        let pair = net.add_service(child, "main", &T::Number, &T::Number);

        let err = net.port(pair.input).push(json!(1)).unwrap_err();
        assert!(matches!(err, PortError::WrongDirection { .. }));
    }

    #[test]
    fn unconnected_port_sends_to_own_mailbox() {
        let mut net = Network::new();
        let op = net.add_operator("op", "test", OperatorKind::composite());
        let pair = net.add_service(op, "main", &T::Number, &T::stream(T::Number));
        net.bufferize(pair.output);

        let out = net.port(pair.output);
        out.push(json!([1, 2])).unwrap();
        assert_eq!(out.pull().unwrap(), Item::Value(json!([1, 2])));
    }

    #[test]
    fn pull_marked_flags_markers() {
        let (net, out, input) = wired(&T::stream(T::Number));
        let outer = Marker::new(MarkerKind::Bos, StreamId { source: out, seq: 7 }).descend();
        thread::scope(|s| {
            s.spawn(|| {
                net.port(out).push(json!([1, 2])).unwrap();
                net.port(out).push(Item::Marker(outer)).unwrap();
            });
            let port = net.port(input);
            assert_eq!(port.pull_marked().unwrap(), (Item::Value(json!([1, 2])), false));
            assert_eq!(port.pull_marked().unwrap(), (Item::Marker(outer), true));
        });
    }

    #[test]
    fn dangling_inner_output_drops_items() {
        let mut net = Network::new();
        let root = net.add_operator("root", "test", OperatorKind::composite());
        let child = net.add_operator("child", "test", OperatorKind::composite());
        net.set_parent(child, root).unwrap();
        let pair = net.add_service(child, "main", &T::Number, &T::stream(T::Number));

        // rendezvous mailboxes: a send into one would block this thread
        assert!(!net.is_buffered(pair.output));
        let out = net.port(pair.output);
        out.push(json!([1, 2])).unwrap();
        out.push(json!([])).unwrap();
        out.push_bos().unwrap();
        out.push_eos().unwrap();
    }

    #[test]
    fn stop_unblocks_pull() {
        let (net, _, input) = wired(&T::Number);
        thread::scope(|s| {
            let handle = s.spawn(|| net.port(input).pull());
            net.stop();
            assert_eq!(handle.join().unwrap().unwrap_err(), PortError::Stopped);
        });
    }

    #[test]
    #[should_panic(expected = "is not a stream port")]
    fn stream_on_scalar_panics() {
        let (net, out, _) = wired(&T::Number);
        net.port(out).stream();
    }
}
