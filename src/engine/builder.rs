// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Instantiation of operator definitions into a [`Network`].
//!
//! Building an operator:
//! 1. looks its id up in the registry and guards against recursion,
//! 2. validates instance properties against the declared property types,
//! 3. expands `{property}` placeholders and resolves generics in every
//!    service and delegate, then creates their ports,
//! 4. for blueprints, builds each child (with the child's generics resolved
//!    against the parent's and `$name` property values taken from the
//!    parent) and wires the declared connections.

use super::network::{Network, OperatorId, OperatorKind, PortId};
use super::port::Port;
use crate::config::consts::PROPERTY_REFERENCE_PREFIX;
use crate::config::port_ref::{PortRef, Role, Segment, Target};
use crate::config::{Definition, OperatorDef, Registry, ServiceDef};
use crate::errors::BuildError;
use crate::observability::messages::build::OperatorInstantiated;
use crate::observability::messages::StructuredLog;
use crate::types::{expand_template, Bindings, Generics, Properties, TypeDescriptor};
use serde_json::Value;
use std::fmt;

/// A freshly built network and the operator it was built for.
pub struct Built {
    pub network: Network,
    pub root: OperatorId,
}

impl fmt::Debug for Built {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Built")
            .field("root", &self.network.operator_path(self.root))
            .field("operators", &self.network.operators.len())
            .field("ports", &self.network.ports.len())
            .finish()
    }
}

/// Builds operator `id` with the given generics and property values.
pub fn build(
    registry: &Registry,
    id: &str,
    generics: &Generics,
    properties: &Properties,
) -> Result<Built, BuildError> {
    let mut builder = Builder {
        registry,
        network: Network::new(),
        stack: Vec::new(),
    };
    let root = builder.instantiate(id, id, generics, properties, None)?;
    Ok(Built {
        network: builder.network,
        root,
    })
}

struct Builder<'r> {
    registry: &'r Registry,
    network: Network,
    /// Blueprint ids currently being instantiated, outermost first.
    stack: Vec<String>,
}

#[derive(Clone, Copy)]
enum BoundaryKind {
    Service,
    Delegate,
}

impl Builder<'_> {
    fn instantiate(
        &mut self,
        id: &str,
        name: &str,
        generics: &Generics,
        properties: &Properties,
        parent: Option<OperatorId>,
    ) -> Result<OperatorId, BuildError> {
        let definition = self.registry.lookup(id)?.clone();
        if !definition.is_builtin() && self.stack.iter().any(|s| s == id) {
            let mut chain = self.stack.clone();
            chain.push(id.to_string());
            return Err(BuildError::Recursion {
                id: id.to_string(),
                chain,
            });
        }

        let def = definition.def().clone();
        let kind = match &definition {
            Definition::Builtin { builtin, .. } => OperatorKind::Leaf(builtin.clone()),
            Definition::Blueprint(_) => OperatorKind::composite(),
        };

        let op = self.network.add_operator(name, &def.id, kind);
        if let Some(parent) = parent {
            self.network.set_parent(op, parent)?;
        }
        let path = self.network.operator_path(op);
        self.check_properties(&path, &def, generics, properties)?;
        self.network.operators[op.0].properties = properties.clone();
        self.network.operators[op.0].generics = generics.clone();

        for (template, service) in &def.services {
            self.add_boundary(op, &path, BoundaryKind::Service, template, service, generics, properties)?;
        }
        for (template, delegate) in &def.delegates {
            self.add_boundary(op, &path, BoundaryKind::Delegate, template, delegate, generics, properties)?;
        }

        if !definition.is_builtin() {
            self.stack.push(id.to_string());
            let result = self
                .instantiate_children(op, &path, &def, generics, properties)
                .and_then(|_| self.wire(op, &path, &def, properties));
            self.stack.pop();
            result?;
        }

        OperatorInstantiated {
            operator: &path,
            definition: &def.id,
            leaf: definition.is_builtin(),
        }
        .log();
        Ok(op)
    }

    fn check_properties(
        &self,
        path: &str,
        def: &OperatorDef,
        generics: &Generics,
        properties: &Properties,
    ) -> Result<(), BuildError> {
        for (name, declared) in &def.properties {
            let ty = declared.resolve(generics);
            let value = properties.get(name).ok_or_else(|| BuildError::Property {
                operator: path.to_string(),
                reason: format!("missing property '{name}'"),
            })?;
            if !ty.accepts(value) {
                return Err(BuildError::Property {
                    operator: path.to_string(),
                    reason: format!("property '{name}' = {value} is not a {ty}"),
                });
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn add_boundary(
        &mut self,
        op: OperatorId,
        path: &str,
        kind: BoundaryKind,
        template: &str,
        interface: &ServiceDef,
        generics: &Generics,
        properties: &Properties,
    ) -> Result<(), BuildError> {
        let expansion_error = |source| BuildError::Expansion {
            operator: path.to_string(),
            source,
        };

        for (name, bindings) in
            expand_template(template, properties, &Bindings::new()).map_err(expansion_error)?
        {
            let label = match kind {
                BoundaryKind::Service => format!("service '{name}'"),
                BoundaryKind::Delegate => format!("delegate '{name}'"),
            };
            let input = self.concrete(path, &label, &interface.input, generics, properties, &bindings)?;
            let output = self.concrete(path, &label, &interface.output, generics, properties, &bindings)?;
            match kind {
                BoundaryKind::Service => self.network.add_service(op, &name, &input, &output),
                BoundaryKind::Delegate => self.network.add_delegate(op, &name, &output, &input),
            };
        }
        Ok(())
    }

    fn concrete(
        &self,
        path: &str,
        label: &str,
        ty: &TypeDescriptor,
        generics: &Generics,
        properties: &Properties,
        bindings: &Bindings,
    ) -> Result<TypeDescriptor, BuildError> {
        let ty = ty
            .expand_properties(properties, bindings)
            .map_err(|source| BuildError::Expansion {
                operator: path.to_string(),
                source,
            })?
            .resolve(generics);
        ty.generics_specified()
            .map_err(|unresolved| BuildError::UnresolvedGeneric {
                name: unresolved.name,
                location: format!("{label} of '{path}'"),
            })?;
        Ok(ty)
    }

    fn instantiate_children(
        &mut self,
        op: OperatorId,
        path: &str,
        def: &OperatorDef,
        generics: &Generics,
        properties: &Properties,
    ) -> Result<(), BuildError> {
        for (name, instance) in &def.operators {
            let child_generics: Generics = instance
                .generics
                .iter()
                .map(|(k, t)| (k.clone(), t.resolve(generics)))
                .collect();
            let child_properties = inherit_properties(path, name, &instance.properties, properties)?;
            self.instantiate(&instance.operator, name, &child_generics, &child_properties, Some(op))?;
        }
        Ok(())
    }

    fn wire(
        &mut self,
        op: OperatorId,
        path: &str,
        def: &OperatorDef,
        properties: &Properties,
    ) -> Result<(), BuildError> {
        let expansion_error = |source| BuildError::Expansion {
            operator: path.to_string(),
            source,
        };

        for (src_template, destinations) in &def.connections {
            for (src_text, bindings) in
                expand_template(src_template, properties, &Bindings::new()).map_err(expansion_error)?
            {
                let src = self.resolve(op, &src_text, Role::Source)?;
                for dst_template in destinations {
                    for (dst_text, _) in expand_template(dst_template, properties, &bindings)
                        .map_err(expansion_error)?
                    {
                        let dst = self.resolve(op, &dst_text, Role::Destination)?;
                        self.network.connect(src, dst)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Finds the port a reference denotes inside operator `op`.
    fn resolve(&self, op: OperatorId, text: &str, role: Role) -> Result<PortId, BuildError> {
        let invalid = |reason: String| BuildError::InvalidPortReference {
            reference: text.to_string(),
            reason,
        };

        let reference: PortRef = text.parse().map_err(invalid)?;
        reference.check_role(role).map_err(invalid)?;

        let owner = self.network.operator(op);
        let target = if reference.is_own() {
            owner
        } else {
            owner
                .child(&reference.instance)
                .ok_or_else(|| invalid(format!("no instance named '{}'", reference.instance)))?
        };

        let (input, output) = match &reference.target {
            Target::Service(name) => target
                .service(name)
                .map(|s| (s.input(), s.output()))
                .ok_or_else(|| invalid(format!("no service named '{name}'")))?,
            Target::Delegate(name) => target
                .delegate(name)
                .map(|d| (d.input(), d.output()))
                .ok_or_else(|| invalid(format!("no delegate named '{name}'")))?,
        };
        let mut port: Port<'_> = match reference.direction {
            super::network::Direction::In => input,
            super::network::Direction::Out => output,
        };

        for segment in &reference.path {
            port = match segment {
                Segment::Stream => port
                    .try_stream()
                    .ok_or_else(|| invalid(format!("{} is not a stream", port.name())))?,
                Segment::Field(name) => port
                    .try_map(name)
                    .ok_or_else(|| invalid(format!("{} has no field '{name}'", port.name())))?,
            };
        }
        Ok(port.id())
    }
}

/// Instance property values with `$name` references replaced by the
/// parent's property `name`.
fn inherit_properties(
    path: &str,
    instance: &str,
    declared: &Properties,
    parent: &Properties,
) -> Result<Properties, BuildError> {
    declared
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(text) if text.starts_with(PROPERTY_REFERENCE_PREFIX) => {
                    let name = &text[PROPERTY_REFERENCE_PREFIX.len_utf8()..];
                    parent.get(name).cloned().ok_or_else(|| BuildError::Property {
                        operator: format!("{path}.{instance}"),
                        reason: format!("property '{key}' refers to missing parent property '{name}'"),
                    })?
                }
                other => other.clone(),
            };
            Ok((key.clone(), value))
        })
        .collect()
}
