// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Arena holding every operator and port of one network.
//!
//! Ports and operators form a tree (operators own services and delegates,
//! which own ports, which own sub-ports) plus a connection graph between
//! scalar ports. Both live in flat vectors addressed by [`PortId`] and
//! [`OperatorId`]. The network is mutated through `&mut self` while it is
//! assembled and compiled, then frozen behind an `Arc` once workers start;
//! from then on only channel traffic and per-port stream bookkeeping change.
//!
//! Every scalar port owns a mailbox. A connection from `a` to `b` means that
//! pushing on `a` sends into `b`'s mailbox. A scalar port of the root without
//! outgoing connections sends into its own mailbox, which is how the outputs
//! of a root operator are observed from outside; unconnected ports further
//! down drop what is pushed on them.

use super::marker::Item;
use super::operator::Operator;
use super::port::Port;
use crate::errors::{BuildError, PortError};
use crate::observability::messages::build::{ConnectionEstablished, ConnectionRefused};
use crate::observability::messages::StructuredLog;
use crate::traits::Builtin;
use crate::types::{Generics, Properties, TypeDescriptor};
use crossbeam_channel::{bounded, select, unbounded, Receiver, Sender, TryRecvError};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::AtomicU64;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperatorId(pub(crate) usize);

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "port#{}", self.0)
    }
}

impl fmt::Display for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

/// The service or delegate a port belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Boundary {
    Service(String),
    Delegate(String),
}

impl Boundary {
    pub fn name(&self) -> &str {
        match self {
            Boundary::Service(name) | Boundary::Delegate(name) => name,
        }
    }
}

#[derive(Debug)]
pub(crate) enum Shape {
    Scalar,
    Stream(PortId),
    Map(BTreeMap<String, PortId>),
}

pub(crate) struct Mailbox {
    tx: Sender<Item>,
    rx: Receiver<Item>,
    buffered: bool,
}

impl Mailbox {
    fn rendezvous() -> Self {
        let (tx, rx) = bounded(0);
        Mailbox {
            tx,
            rx,
            buffered: false,
        }
    }

    fn buffered() -> Self {
        let (tx, rx) = unbounded();
        Mailbox {
            tx,
            rx,
            buffered: true,
        }
    }
}

/// Open stream instances of a stream port, one slot per side.
#[derive(Debug, Default)]
pub(crate) struct StreamState {
    pub(crate) sending: Option<super::marker::StreamId>,
    pub(crate) receiving: Option<super::marker::StreamId>,
}

pub(crate) struct PortNode {
    pub(crate) direction: Direction,
    pub(crate) ty: TypeDescriptor,
    pub(crate) operator: OperatorId,
    pub(crate) boundary: Boundary,
    pub(crate) parent: Option<PortId>,
    pub(crate) label: String,
    pub(crate) shape: Shape,
    pub(crate) src: Option<PortId>,
    pub(crate) dests: Vec<PortId>,
    pub(crate) mailbox: Mailbox,
    pub(crate) stream: Mutex<StreamState>,
    pub(crate) sequence: AtomicU64,
}

/// What runs an operator: a builtin, or a blueprint's child operators.
#[derive(Clone)]
pub enum OperatorKind {
    Leaf(Arc<dyn Builtin>),
    Composite { children: BTreeMap<String, OperatorId> },
}

impl OperatorKind {
    pub fn composite() -> Self {
        OperatorKind::Composite {
            children: BTreeMap::new(),
        }
    }
}

/// Input and output port of one service or delegate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortPair {
    pub input: PortId,
    pub output: PortId,
}

pub(crate) struct OperatorNode {
    pub(crate) name: String,
    pub(crate) definition: String,
    pub(crate) parent: Option<OperatorId>,
    pub(crate) kind: OperatorKind,
    pub(crate) services: BTreeMap<String, PortPair>,
    pub(crate) delegates: BTreeMap<String, PortPair>,
    pub(crate) properties: Properties,
    pub(crate) generics: Generics,
}

impl OperatorNode {
    pub(crate) fn is_leaf(&self) -> bool {
        matches!(self.kind, OperatorKind::Leaf(_))
    }

    pub(crate) fn children(&self) -> Vec<OperatorId> {
        match &self.kind {
            OperatorKind::Composite { children } => children.values().copied().collect(),
            OperatorKind::Leaf(_) => Vec::new(),
        }
    }

    /// Service ports first, then delegate ports, each in name order.
    pub(crate) fn boundary_pairs(&self) -> impl Iterator<Item = &PortPair> {
        self.services.values().chain(self.delegates.values())
    }
}

pub struct Network {
    pub(crate) ports: Vec<PortNode>,
    pub(crate) operators: Vec<OperatorNode>,
    stop_tx: Mutex<Option<Sender<()>>>,
    stop_rx: Receiver<()>,
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

impl Network {
    pub fn new() -> Self {
        let (stop_tx, stop_rx) = bounded(0);
        Network {
            ports: Vec::new(),
            operators: Vec::new(),
            stop_tx: Mutex::new(Some(stop_tx)),
            stop_rx,
        }
    }

    pub fn add_operator(
        &mut self,
        name: impl Into<String>,
        definition: impl Into<String>,
        kind: OperatorKind,
    ) -> OperatorId {
        let id = OperatorId(self.operators.len());
        self.operators.push(OperatorNode {
            name: name.into(),
            definition: definition.into(),
            parent: None,
            kind,
            services: BTreeMap::new(),
            delegates: BTreeMap::new(),
            properties: Properties::new(),
            generics: Generics::new(),
        });
        id
    }

    /// Creates the port trees of a service. An existing service of the same
    /// name is replaced.
    pub fn add_service(
        &mut self,
        operator: OperatorId,
        name: &str,
        input: &TypeDescriptor,
        output: &TypeDescriptor,
    ) -> PortPair {
        let pair = self.add_pair(operator, Boundary::Service(name.to_string()), input, output);
        self.operators[operator.0]
            .services
            .insert(name.to_string(), pair);
        pair
    }

    /// Creates the port trees of a delegate. From the owner's point of view
    /// the delegate's output leaves the operator and its input comes back.
    pub fn add_delegate(
        &mut self,
        operator: OperatorId,
        name: &str,
        output: &TypeDescriptor,
        input: &TypeDescriptor,
    ) -> PortPair {
        let pair = self.add_pair(operator, Boundary::Delegate(name.to_string()), input, output);
        self.operators[operator.0]
            .delegates
            .insert(name.to_string(), pair);
        pair
    }

    fn add_pair(
        &mut self,
        operator: OperatorId,
        boundary: Boundary,
        input: &TypeDescriptor,
        output: &TypeDescriptor,
    ) -> PortPair {
        PortPair {
            input: self.add_port(operator, &boundary, Direction::In, input, None, String::new()),
            output: self.add_port(operator, &boundary, Direction::Out, output, None, String::new()),
        }
    }

    fn add_port(
        &mut self,
        operator: OperatorId,
        boundary: &Boundary,
        direction: Direction,
        ty: &TypeDescriptor,
        parent: Option<PortId>,
        label: String,
    ) -> PortId {
        let id = PortId(self.ports.len());
        self.ports.push(PortNode {
            direction,
            ty: ty.clone(),
            operator,
            boundary: boundary.clone(),
            parent,
            label: label.clone(),
            shape: Shape::Scalar,
            src: None,
            dests: Vec::new(),
            mailbox: Mailbox::rendezvous(),
            stream: Mutex::new(StreamState::default()),
            sequence: AtomicU64::new(0),
        });

        let shape = match ty {
            TypeDescriptor::Stream(element) => Shape::Stream(self.add_port(
                operator,
                boundary,
                direction,
                element,
                Some(id),
                format!("{label}~"),
            )),
            TypeDescriptor::Map(fields) if !fields.is_empty() => Shape::Map(
                fields
                    .iter()
                    .map(|(name, field)| {
                        let sub = self.add_port(
                            operator,
                            boundary,
                            direction,
                            field,
                            Some(id),
                            format!("{label}.{name}"),
                        );
                        (name.clone(), sub)
                    })
                    .collect(),
            ),
            _ => Shape::Scalar,
        };
        self.ports[id.0].shape = shape;
        id
    }

    /// Attaches `child` under the composite `parent`. The parent link is set
    /// once; the child's name must be unique among its siblings.
    pub fn set_parent(&mut self, child: OperatorId, parent: OperatorId) -> Result<(), BuildError> {
        let name = self.operators[child.0].name.clone();
        if self.operators[child.0].parent.is_some() {
            return Err(BuildError::Hierarchy {
                operator: name,
                reason: "operator already has a parent".to_string(),
            });
        }
        match &mut self.operators[parent.0].kind {
            OperatorKind::Leaf(_) => {
                return Err(BuildError::Hierarchy {
                    operator: name,
                    reason: format!("'{}' is a builtin", self.operators[parent.0].name),
                })
            }
            OperatorKind::Composite { children } => {
                if children.contains_key(&name) {
                    return Err(BuildError::Hierarchy {
                        operator: name,
                        reason: "a sibling with this name exists".to_string(),
                    });
                }
                children.insert(name, child);
            }
        }
        self.operators[child.0].parent = Some(parent);
        Ok(())
    }

    pub fn operator(&self, id: OperatorId) -> Operator<'_> {
        Operator::new(self, id)
    }

    pub fn port(&self, id: PortId) -> Port<'_> {
        Port::new(self, id)
    }

    /// Connects `src` to `dst`, recursing through stream and map structure
    /// down to scalar pairs.
    ///
    /// The whole structure is checked before anything is linked, so a failed
    /// connect leaves the network unchanged. Afterwards the connect hooks of
    /// the builtins owning either end run; a refusal undoes the connection.
    pub fn connect(&mut self, src: PortId, dst: PortId) -> Result<(), BuildError> {
        if src == dst {
            return Err(BuildError::TypeMismatch {
                src: self.port_name(src),
                dst: self.port_name(dst),
                reason: "a port cannot be connected to itself".to_string(),
            });
        }

        let mut links = Vec::new();
        self.plan_links(src, dst, &mut links)?;
        for &(s, d) in &links {
            self.link(s, d);
        }

        if let Err(e) = self.run_connect_hooks(src, dst) {
            for &(s, d) in &links {
                self.unlink(s, d);
            }
            return Err(e);
        }

        ConnectionEstablished {
            src: &self.port_name(src),
            dst: &self.port_name(dst),
            links: links.len(),
        }
        .log();
        Ok(())
    }

    fn plan_links(
        &self,
        src: PortId,
        dst: PortId,
        links: &mut Vec<(PortId, PortId)>,
    ) -> Result<(), BuildError> {
        let (s, d) = (&self.ports[src.0], &self.ports[dst.0]);
        let mismatch = |reason: String| BuildError::TypeMismatch {
            src: self.port_name(src),
            dst: self.port_name(dst),
            reason,
        };

        s.ty.compatible_with(&d.ty).map_err(mismatch)?;

        match (&s.shape, &d.shape) {
            (Shape::Scalar, Shape::Scalar) => {
                if let Some(existing) = d.src {
                    return Err(BuildError::AlreadyConnected {
                        port: self.port_name(dst),
                        existing: self.port_name(existing),
                    });
                }
                links.push((src, dst));
                Ok(())
            }
            (Shape::Stream(a), Shape::Stream(b)) => self.plan_links(*a, *b, links),
            (Shape::Map(a), Shape::Map(b)) => {
                for (name, sub) in a {
                    let other = b
                        .get(name)
                        .ok_or_else(|| mismatch(format!("missing field '{name}'")))?;
                    self.plan_links(*sub, *other, links)?;
                }
                Ok(())
            }
            _ => Err(mismatch(format!("{} and {} differ in shape", s.ty, d.ty))),
        }
    }

    pub(crate) fn link(&mut self, src: PortId, dst: PortId) {
        self.ports[src.0].dests.push(dst);
        self.ports[dst.0].src = Some(src);
    }

    pub(crate) fn unlink(&mut self, src: PortId, dst: PortId) {
        self.ports[src.0].dests.retain(|d| *d != dst);
        if self.ports[dst.0].src == Some(src) {
            self.ports[dst.0].src = None;
        }
    }

    fn run_connect_hooks(&self, src: PortId, dst: PortId) -> Result<(), BuildError> {
        for (own, other) in [(src, dst), (dst, src)] {
            let owner = self.ports[own.0].operator;
            if let OperatorKind::Leaf(builtin) = &self.operators[owner.0].kind {
                let operator = self.operator(owner);
                if let Err(reason) = builtin.on_connect(&operator, self.port(own), self.port(other)) {
                    let (operator, src, dst) =
                        (operator.path(), self.port_name(src), self.port_name(dst));
                    ConnectionRefused {
                        operator: &operator,
                        src: &src,
                        dst: &dst,
                        reason: &reason,
                    }
                    .log();
                    return Err(BuildError::ConnectionRejected {
                        operator,
                        src,
                        dst,
                        reason,
                    });
                }
            }
        }
        Ok(())
    }

    /// True when `a` feeds `b`. Streams are connected as a whole when every
    /// scalar below their elements is; a map pair is never reported as
    /// connected, only its fields are.
    pub fn connected(&self, a: PortId, b: PortId) -> bool {
        match (&self.ports[a.0].shape, &self.ports[b.0].shape) {
            (Shape::Scalar, Shape::Scalar) => self.ports[a.0].dests.contains(&b),
            (Shape::Stream(x), Shape::Stream(y)) => {
                let (xs, ys) = (self.scalar_ports(*x), self.scalar_ports(*y));
                xs.len() == ys.len()
                    && xs
                        .iter()
                        .zip(ys.iter())
                        .all(|(s, d)| self.ports[s.0].dests.contains(d))
            }
            _ => false,
        }
    }

    /// Gives every scalar port below `port` an unbounded mailbox, so pushes
    /// into it never wait for a reader.
    pub fn bufferize(&mut self, port: PortId) {
        for scalar in self.scalar_ports(port) {
            self.ports[scalar.0].mailbox = Mailbox::buffered();
        }
    }

    pub fn is_buffered(&self, port: PortId) -> bool {
        self.scalar_ports(port)
            .iter()
            .all(|p| self.ports[p.0].mailbox.buffered)
    }

    /// Scalar ports of the subtree rooted at `port`, in field order.
    pub(crate) fn scalar_ports(&self, port: PortId) -> Vec<PortId> {
        let mut out = Vec::new();
        self.collect_scalars(port, &mut out);
        out
    }

    fn collect_scalars(&self, port: PortId, out: &mut Vec<PortId>) {
        match &self.ports[port.0].shape {
            Shape::Scalar => out.push(port),
            Shape::Stream(element) => self.collect_scalars(*element, out),
            Shape::Map(fields) => {
                for sub in fields.values() {
                    self.collect_scalars(*sub, out);
                }
            }
        }
    }

    /// Scalar ports of every service and delegate of `operator`.
    pub(crate) fn boundary_scalars(&self, operator: OperatorId) -> Vec<PortId> {
        self.operators[operator.0]
            .boundary_pairs()
            .flat_map(|pair| {
                let mut scalars = self.scalar_ports(pair.input);
                scalars.extend(self.scalar_ports(pair.output));
                scalars
            })
            .collect()
    }

    /// Leaf operators that run as workers under `root`.
    pub fn leaves(&self, root: OperatorId) -> Vec<OperatorId> {
        let node = &self.operators[root.0];
        if node.is_leaf() {
            return vec![root];
        }
        node.children()
            .into_iter()
            .flat_map(|child| self.leaves(child))
            .collect()
    }

    pub fn operator_path(&self, id: OperatorId) -> String {
        let node = &self.operators[id.0];
        match node.parent {
            Some(parent) => format!("{}.{}", self.operator_path(parent), node.name),
            None => node.name.clone(),
        }
    }

    /// Readable port name such as `sum.agg#iteration.out~.item`.
    pub fn port_name(&self, id: PortId) -> String {
        let node = &self.ports[id.0];
        let (sigil, boundary) = match &node.boundary {
            Boundary::Service(name) => ('@', name),
            Boundary::Delegate(name) => ('#', name),
        };
        let side = match node.direction {
            Direction::In => "in",
            Direction::Out => "out",
        };
        format!(
            "{}{}{}.{}{}",
            self.operator_path(node.operator),
            sigil,
            boundary,
            side,
            node.label
        )
    }

    pub(crate) fn send_to(&self, port: PortId, item: Item) -> Result<(), PortError> {
        let mailbox = &self.ports[port.0].mailbox;
        select! {
            send(mailbox.tx, item) -> sent => sent.map_err(|_| PortError::Stopped),
            recv(self.stop_rx) -> _ => Err(PortError::Stopped),
        }
    }

    pub(crate) fn receive(&self, port: PortId) -> Result<Item, PortError> {
        let mailbox = &self.ports[port.0].mailbox;
        select! {
            recv(mailbox.rx) -> item => item.map_err(|_| PortError::Stopped),
            recv(self.stop_rx) -> _ => Err(PortError::Stopped),
        }
    }

    /// Raises the stop signal. Every blocked and future push or pull returns
    /// [`PortError::Stopped`].
    pub fn stop(&self) {
        self.stop_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self.stop_rx.try_recv(), Err(TryRecvError::Disconnected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeDescriptor as T;

    fn pair_of_ops(net: &mut Network, out: &T, input: &T) -> (PortId, PortId) {
        let a = net.add_operator("a", "test", OperatorKind::composite());
        let b = net.add_operator("b", "test", OperatorKind::composite());
        let pa = net.add_service(a, "main", &T::Trigger, out);
        let pb = net.add_service(b, "main", input, &T::Trigger);
        (pa.output, pb.input)
    }

    #[test]
    fn ports_mirror_type_structure() {
        let mut net = Network::new();
        let op = net.add_operator("op", "test", OperatorKind::composite());
        let ty = T::map([
            ("init", T::Number),
            ("items", T::stream(T::map([("a", T::String), ("b", T::Number)]))),
        ]);
        let pair = net.add_service(op, "main", &ty, &T::Number);

        assert_eq!(net.scalar_ports(pair.input).len(), 3);
        let names: Vec<String> = net
            .scalar_ports(pair.input)
            .into_iter()
            .map(|p| net.port_name(p))
            .collect();
        assert_eq!(
            names,
            vec!["op@main.in.init", "op@main.in.items~.a", "op@main.in.items~.b"]
        );
    }

    #[test]
    fn connect_links_every_scalar() {
        let mut net = Network::new();
        let ty = T::stream(T::map([("x", T::Number), ("y", T::Boolean)]));
        let (src, dst) = pair_of_ops(&mut net, &ty, &ty);

        net.connect(src, dst).unwrap();

        assert!(net.connected(src, dst));
        let srcs = net.scalar_ports(src);
        let dsts = net.scalar_ports(dst);
        for (s, d) in srcs.iter().zip(dsts.iter()) {
            assert!(net.connected(*s, *d));
        }
    }

    #[test]
    fn streams_of_maps_connect_as_a_whole() {
        let mut net = Network::new();
        let ty = T::stream(T::map([("x", T::Number), ("y", T::Boolean)]));
        let (src, dst) = pair_of_ops(&mut net, &ty, &ty);
        assert!(!net.connected(src, dst));

        net.connect(src, dst).unwrap();
        assert!(net.connected(src, dst));

        let (src_elem, dst_elem) = (net.port(src).stream().id(), net.port(dst).stream().id());
        assert!(!net.connected(src_elem, dst_elem));
    }

    #[test]
    fn half_wired_stream_is_not_connected() {
        let mut net = Network::new();
        let out = T::stream(T::map([("x", T::Number), ("y", T::Number)]));
        let (src, dst) = pair_of_ops(&mut net, &out, &out);
        let x_src = net.port(src).stream().map("x").id();
        let x_dst = net.port(dst).stream().map("x").id();
        net.connect(x_src, x_dst).unwrap();

        assert!(net.connected(x_src, x_dst));
        assert!(!net.connected(src, dst));
    }

    #[test]
    fn maps_are_never_connected_as_a_whole() {
        let mut net = Network::new();
        let ty = T::map([("x", T::Number)]);
        let (src, dst) = pair_of_ops(&mut net, &ty, &ty);
        net.connect(src, dst).unwrap();

        assert!(!net.connected(src, dst));
        let x_src = net.port(src).map("x").id();
        let x_dst = net.port(dst).map("x").id();
        assert!(net.connected(x_src, x_dst));
    }

    #[test]
    fn mismatched_connect_changes_nothing() {
        let mut net = Network::new();
        let out = T::map([("x", T::Number), ("y", T::Number)]);
        let input = T::map([("x", T::Number), ("z", T::Number)]);
        let (src, dst) = pair_of_ops(&mut net, &out, &input);

        let err = net.connect(src, dst).unwrap_err();
        assert!(matches!(err, BuildError::TypeMismatch { .. }));
        for port in net.scalar_ports(src) {
            assert!(net.ports[port.0].dests.is_empty());
        }
        for port in net.scalar_ports(dst) {
            assert!(net.ports[port.0].src.is_none());
        }
    }

    #[test]
    fn fan_in_is_rejected_fan_out_is_not() {
        let mut net = Network::new();
        let (src, dst) = pair_of_ops(&mut net, &T::Number, &T::Number);
        let c = net.add_operator("c", "test", OperatorKind::composite());
        let pc = net.add_service(c, "main", &T::Number, &T::Number);

        net.connect(src, dst).unwrap();
        net.connect(src, pc.input).unwrap();
        assert_eq!(net.ports[src.0].dests, vec![dst, pc.input]);

        let err = net.connect(pc.output, dst).unwrap_err();
        assert!(matches!(err, BuildError::AlreadyConnected { .. }));
    }

    #[test]
    fn trigger_and_empty_map_connect() {
        let mut net = Network::new();
        let (src, dst) = pair_of_ops(&mut net, &T::Trigger, &T::Map(BTreeMap::new()));
        net.connect(src, dst).unwrap();
        assert!(net.connected(src, dst));
    }

    #[test]
    fn refused_connection_is_undone() {
        use crate::builtins::stub::Picky;

        let mut net = Network::new();
        let a = net.add_operator("a", "test", OperatorKind::composite());
        let pa = net.add_service(a, "main", &T::Trigger, &T::Number);
        let picky = net.add_operator("picky", "test.picky", OperatorKind::Leaf(Arc::new(Picky)));
        let pp = net.add_service(picky, "main", &T::Number, &T::Number);

        match net.connect(pa.output, pp.input) {
            Err(BuildError::ConnectionRejected { operator, reason, .. }) => {
                assert_eq!(operator, "picky");
                assert_eq!(reason, "refuses every connection");
            }
            other => panic!("unexpected result {:?}", other),
        }
        assert!(!net.connected(pa.output, pp.input));
        assert!(net.ports[pa.output.0].dests.is_empty());
        assert!(net.ports[pp.input.0].src.is_none());
    }

    #[test]
    fn self_connection_is_rejected() {
        let mut net = Network::new();
        let (src, _) = pair_of_ops(&mut net, &T::Number, &T::Number);
        assert!(net.connect(src, src).is_err());
    }

    #[test]
    fn set_parent_rules() {
        let mut net = Network::new();
        let root = net.add_operator("root", "test", OperatorKind::composite());
        let a = net.add_operator("a", "test", OperatorKind::composite());
        let dup = net.add_operator("a", "test", OperatorKind::composite());

        net.set_parent(a, root).unwrap();
        assert_eq!(net.operator_path(a), "root.a");
        assert!(net.set_parent(a, root).is_err());
        assert!(net.set_parent(dup, root).is_err());
    }

    #[test]
    fn bufferize_marks_every_scalar() {
        let mut net = Network::new();
        let ty = T::map([("x", T::Number), ("y", T::stream(T::Number))]);
        let (src, _) = pair_of_ops(&mut net, &ty, &ty);
        assert!(!net.is_buffered(src));
        net.bufferize(src);
        assert!(net.is_buffered(src));
    }

    #[test]
    fn stop_is_observable() {
        let net = Network::new();
        assert!(!net.is_stopped());
        net.stop();
        assert!(net.is_stopped());
        net.stop();
        assert!(net.is_stopped());
    }
}
