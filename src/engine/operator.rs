// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::network::{Network, OperatorId, PortPair};
use super::port::Port;
use crate::config::consts::MAIN_SERVICE;
use crate::types::{Generics, Properties};
use serde_json::Value;

/// Borrowed handle to one operator of a [`Network`].
#[derive(Clone, Copy)]
pub struct Operator<'n> {
    net: &'n Network,
    id: OperatorId,
}

/// Input and output of a service, seen from its owner: values arrive on
/// `input` and results leave on `output`.
#[derive(Clone, Copy, Debug)]
pub struct Service<'n> {
    input: Port<'n>,
    output: Port<'n>,
}

impl<'n> Service<'n> {
    pub fn input(&self) -> Port<'n> {
        self.input
    }

    pub fn output(&self) -> Port<'n> {
        self.output
    }
}

/// A delegate seen from its owner: requests leave on `output` and the
/// answers come back on `input`.
#[derive(Clone, Copy, Debug)]
pub struct Delegate<'n> {
    input: Port<'n>,
    output: Port<'n>,
}

impl<'n> Delegate<'n> {
    pub fn input(&self) -> Port<'n> {
        self.input
    }

    pub fn output(&self) -> Port<'n> {
        self.output
    }
}

impl<'n> Operator<'n> {
    pub(crate) fn new(net: &'n Network, id: OperatorId) -> Self {
        Operator { net, id }
    }

    pub fn id(&self) -> OperatorId {
        self.id
    }

    pub fn name(&self) -> &'n str {
        &self.net.operators[self.id.0].name
    }

    /// Dotted names from the outermost ancestor down to this operator.
    pub fn path(&self) -> String {
        self.net.operator_path(self.id)
    }

    /// Id of the builtin or blueprint this operator was built from.
    pub fn definition_id(&self) -> &'n str {
        &self.net.operators[self.id.0].definition
    }

    pub fn is_leaf(&self) -> bool {
        self.net.operators[self.id.0].is_leaf()
    }

    pub fn parent(&self) -> Option<Operator<'n>> {
        self.net.operators[self.id.0]
            .parent
            .map(|id| Operator::new(self.net, id))
    }

    pub fn children(&self) -> Vec<Operator<'n>> {
        self.net.operators[self.id.0]
            .children()
            .into_iter()
            .map(|id| Operator::new(self.net, id))
            .collect()
    }

    pub fn child(&self, name: &str) -> Option<Operator<'n>> {
        match &self.net.operators[self.id.0].kind {
            super::network::OperatorKind::Composite { children } => {
                children.get(name).map(|id| Operator::new(self.net, *id))
            }
            super::network::OperatorKind::Leaf(_) => None,
        }
    }

    pub fn service(&self, name: &str) -> Option<Service<'n>> {
        self.net.operators[self.id.0]
            .services
            .get(name)
            .map(|pair| Service {
                input: self.port(pair, true),
                output: self.port(pair, false),
            })
    }

    /// The `main` service.
    ///
    /// # Panics
    /// If the operator was defined without one.
    pub fn main(&self) -> Service<'n> {
        self.service(MAIN_SERVICE)
            .unwrap_or_else(|| panic!("operator '{}' has no main service", self.path()))
    }

    pub fn delegate(&self, name: &str) -> Option<Delegate<'n>> {
        self.net.operators[self.id.0]
            .delegates
            .get(name)
            .map(|pair| Delegate {
                input: self.port(pair, true),
                output: self.port(pair, false),
            })
    }

    /// The delegate `name`.
    ///
    /// # Panics
    /// If the operator was defined without it.
    pub fn require_delegate(&self, name: &str) -> Delegate<'n> {
        self.delegate(name)
            .unwrap_or_else(|| panic!("operator '{}' has no delegate '{}'", self.path(), name))
    }

    pub fn service_names(&self) -> Vec<&'n str> {
        self.net.operators[self.id.0]
            .services
            .keys()
            .map(String::as_str)
            .collect()
    }

    fn port(&self, pair: &PortPair, input: bool) -> Port<'n> {
        Port::new(self.net, if input { pair.input } else { pair.output })
    }

    pub fn properties(&self) -> &'n Properties {
        &self.net.operators[self.id.0].properties
    }

    pub fn property(&self, name: &str) -> Option<&'n Value> {
        self.properties().get(name)
    }

    pub fn generics(&self) -> &'n Generics {
        &self.net.operators[self.id.0].generics
    }

    /// True once the network's stop signal was raised. Worker loops check
    /// this between rounds.
    pub fn check_stop(&self) -> bool {
        self.net.is_stopped()
    }
}

impl std::fmt::Debug for Operator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operator")
            .field("id", &self.id)
            .field("path", &self.path())
            .finish()
    }
}
