// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Flattening of composite operators.
//!
//! A blueprint instance only forwards values between its boundary ports and
//! its children. Compiling splices those boundary ports out of every
//! connection (the source of a boundary port is linked straight to each of
//! its destinations) and lifts the children into the root, until only
//! builtins remain under it. Leaves are renamed `<composite>.<child>` on the
//! way up so their paths stay unique and readable.

use super::network::{Direction, Network, OperatorId, OperatorKind, PortId};
use crate::errors::BuildError;
use crate::observability::messages::build::{CompileCompleted, DanglingOutput};
use crate::observability::messages::StructuredLog;

impl Network {
    /// Flattens every composite under `root`. Returns how many builtin
    /// operators were lifted into the root; a flat network is left untouched
    /// and yields 0.
    pub fn compile(&mut self, root: OperatorId) -> usize {
        let mut lifted = 0;
        loop {
            let composites: Vec<OperatorId> = self.operators[root.0]
                .children()
                .into_iter()
                .filter(|child| !self.operators[child.0].is_leaf())
                .collect();
            if composites.is_empty() {
                break;
            }
            for composite in composites {
                lifted += self.dissolve(root, composite);
            }
        }

        if lifted > 0 {
            CompileCompleted {
                root: &self.operator_path(root),
                merged: lifted,
                leaves: self.leaves(root).len(),
            }
            .log();
        }
        lifted
    }

    fn dissolve(&mut self, root: OperatorId, composite: OperatorId) -> usize {
        for port in self.boundary_scalars(composite) {
            self.bypass(port);
        }

        let prefix = self.operators[composite.0].name.clone();
        let children = match std::mem::replace(
            &mut self.operators[composite.0].kind,
            OperatorKind::composite(),
        ) {
            OperatorKind::Composite { children } => children,
            leaf => {
                self.operators[composite.0].kind = leaf;
                return 0;
            }
        };

        if let OperatorKind::Composite { children: siblings } = &mut self.operators[root.0].kind {
            siblings.remove(&prefix);
        }
        self.operators[composite.0].parent = None;

        let mut lifted = 0;
        for (name, child) in children {
            let name = self.unique_child_name(root, format!("{prefix}.{name}"));
            self.operators[child.0].name = name.clone();
            self.operators[child.0].parent = Some(root);
            if let OperatorKind::Composite { children: siblings } = &mut self.operators[root.0].kind
            {
                siblings.insert(name, child);
            }
            if self.operators[child.0].is_leaf() {
                lifted += 1;
            }
        }
        lifted
    }

    fn unique_child_name(&self, root: OperatorId, base: String) -> String {
        let OperatorKind::Composite { children } = &self.operators[root.0].kind else {
            return base;
        };
        if !children.contains_key(&base) {
            return base;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{base}#{n}");
            if !children.contains_key(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Removes `port` from the connection graph, linking its source directly
    /// to each of its destinations at the position `port` held.
    fn bypass(&mut self, port: PortId) {
        let src = self.ports[port.0].src.take();
        let dests = std::mem::take(&mut self.ports[port.0].dests);
        for dest in &dests {
            self.ports[dest.0].src = None;
        }

        let Some(src) = src else {
            return;
        };
        let upstream = &mut self.ports[src.0].dests;
        let at = upstream
            .iter()
            .position(|d| *d == port)
            .unwrap_or(upstream.len());
        upstream.retain(|d| *d != port);
        let at = at.min(upstream.len());
        upstream.splice(at..at, dests.iter().copied());
        for dest in dests {
            self.ports[dest.0].src = Some(src);
        }
    }

    /// Verifies that `root` is ready to run: every child is a builtin and
    /// every input of every child has a source. Outputs nobody consumes are
    /// only reported.
    pub fn check_compiled(&self, root: OperatorId) -> Result<(), BuildError> {
        let node = &self.operators[root.0];
        if node.is_leaf() {
            return Ok(());
        }

        for child in node.children() {
            let child_node = &self.operators[child.0];
            let operator = self.operator_path(child);
            if !child_node.is_leaf() {
                return Err(BuildError::NotFlat { operator });
            }
            for port in self.boundary_scalars(child) {
                let port_node = &self.ports[port.0];
                match port_node.direction {
                    Direction::In if port_node.src.is_none() => {
                        return Err(BuildError::IncompleteWiring {
                            operator,
                            port: self.port_name(port),
                        });
                    }
                    Direction::Out if port_node.dests.is_empty() => {
                        DanglingOutput {
                            operator: &operator,
                            port: &self.port_name(port),
                        }
                        .log();
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }
}
