// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Static validation of registered blueprints.
//!
//! Validation looks at definitions only; nothing is instantiated. It finds
//! the problems a build would otherwise report one at a time, so a whole
//! directory of blueprints can be checked at once.
//!
//! # Checks
//!
//! 1. **Operator references**: every instance names an id the registry knows
//! 2. **Connection references**: every reference parses, is used in a valid
//!    role (source or destination) and names a declared instance
//! 3. **Recursion**: no blueprint instantiates itself, directly or through
//!    other blueprints
//!
//! References containing `{property}` placeholders are only resolved when a
//! blueprint is built, so they are skipped here.
//!
//! ## Recursion detection
//! Blueprints form a graph with an edge from each blueprint to the blueprint
//! ids its instances use. A depth-first search with a recursion stack finds
//! a back edge and reports the path around the loop.
//!
//! # Example
//! ```rust
//! use portflow::config::{parse_blueprint, validate_blueprints, Registry};
//! use portflow::errors::ValidationError;
//!
//! let mut registry = Registry::with_builtins();
//! registry.register_blueprint(
//!     parse_blueprint("{\"id\": \"a\", \"operators\": {\"x\": {\"operator\": \"a\"}}}", true).unwrap(),
//! );
//!
//! match validate_blueprints(&registry) {
//!     Err(errors) => assert_eq!(
//!         errors,
//!         vec![ValidationError::RecursiveDefinition { cycle: vec!["a".into(), "a".into()] }]
//!     ),
//!     Ok(()) => unreachable!(),
//! }
//! ```

use std::collections::{BTreeMap, HashSet};

use crate::config::port_ref::{PortRef, Role};
use crate::config::{OperatorDef, Registry};
use crate::errors::ValidationError;
use crate::observability::messages::validation::{RecursiveDefinitionDetected, ValidationCompleted};
use crate::observability::messages::StructuredLog;
use crate::types::expansion::has_placeholder;

/// Validates every blueprint in `registry`.
///
/// All problems found are returned together.
pub fn validate_blueprints(registry: &Registry) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut count = 0;

    for def in registry.blueprints() {
        count += 1;
        errors.extend(validate_operator_references(def, registry));
        errors.extend(validate_connection_references(def));
    }
    errors.extend(validate_not_recursive(registry));

    ValidationCompleted {
        blueprints: count,
        problems: errors.len(),
    }
    .log();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_operator_references(def: &OperatorDef, registry: &Registry) -> Vec<ValidationError> {
    def.operators
        .iter()
        .filter(|(_, instance)| !registry.contains(&instance.operator))
        .map(|(name, instance)| ValidationError::UnknownOperator {
            blueprint: def.id.clone(),
            instance: name.clone(),
            operator: instance.operator.clone(),
        })
        .collect()
}

fn validate_connection_references(def: &OperatorDef) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for (source, destinations) in &def.connections {
        let references = std::iter::once((source, Role::Source))
            .chain(destinations.iter().map(|d| (d, Role::Destination)));
        for (reference, role) in references {
            if has_placeholder(reference) {
                continue;
            }
            if let Err(error) = check_reference(def, reference, role) {
                errors.push(error);
            }
        }
    }
    errors
}

fn check_reference(def: &OperatorDef, reference: &str, role: Role) -> Result<(), ValidationError> {
    let invalid = |reason: String| ValidationError::InvalidReference {
        blueprint: def.id.clone(),
        reference: reference.to_string(),
        reason,
    };
    let parsed: PortRef = reference.parse().map_err(invalid)?;
    parsed.check_role(role).map_err(invalid)?;
    if !parsed.is_own() && !def.operators.contains_key(&parsed.instance) {
        return Err(ValidationError::UnknownInstance {
            blueprint: def.id.clone(),
            reference: reference.to_string(),
            instance: parsed.instance,
        });
    }
    Ok(())
}

/// Finds blueprints that instantiate themselves.
///
/// Builtins never have children, so only blueprint to blueprint edges are
/// followed. Reports the first loop found.
fn validate_not_recursive(registry: &Registry) -> Vec<ValidationError> {
    let graph: BTreeMap<&str, Vec<&str>> = registry
        .blueprints()
        .map(|def| {
            let uses = def
                .operators
                .values()
                .map(|instance| instance.operator.as_str())
                .filter(|id| registry.get(id).is_some_and(|d| !d.is_builtin()))
                .collect();
            (def.id.as_str(), uses)
        })
        .collect();

    let mut visited = HashSet::new();
    let mut rec_stack = HashSet::new();
    let mut path = Vec::new();

    for id in graph.keys() {
        if visited.contains(id) {
            continue;
        }
        if let Some(cycle) = dfs_cycle_detection(id, &graph, &mut visited, &mut rec_stack, &mut path) {
            RecursiveDefinitionDetected { cycle: &cycle }.log();
            return vec![ValidationError::RecursiveDefinition {
                cycle: cycle.iter().map(|s| s.to_string()).collect(),
            }];
        }
    }
    Vec::new()
}

/// Three colour DFS: `visited` holds black and gray nodes, `rec_stack` only
/// gray ones. Meeting a gray node closes a loop, which is cut out of `path`.
fn dfs_cycle_detection<'a>(
    node: &'a str,
    graph: &BTreeMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    rec_stack: &mut HashSet<&'a str>,
    path: &mut Vec<&'a str>,
) -> Option<Vec<&'a str>> {
    visited.insert(node);
    rec_stack.insert(node);
    path.push(node);

    for &neighbor in graph.get(node).into_iter().flatten() {
        if !visited.contains(neighbor) {
            if let Some(cycle) = dfs_cycle_detection(neighbor, graph, visited, rec_stack, path) {
                return Some(cycle);
            }
        } else if rec_stack.contains(neighbor) {
            if let Some(start) = path.iter().position(|x| *x == neighbor) {
                let mut cycle = path[start..].to_vec();
                cycle.push(neighbor);
                return Some(cycle);
            }
        }
    }

    rec_stack.remove(node);
    path.pop();
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InstanceDef;
    use crate::types::{Generics, Properties};

    fn blueprint(id: &str, instances: &[(&str, &str)], connections: &[(&str, &[&str])]) -> OperatorDef {
        let mut def = OperatorDef::new(id);
        for (name, operator) in instances {
            def.operators.insert(
                name.to_string(),
                InstanceDef {
                    operator: operator.to_string(),
                    generics: Generics::new(),
                    properties: Properties::new(),
                },
            );
        }
        for (source, destinations) in connections {
            def.connections.insert(
                source.to_string(),
                destinations.iter().map(|d| d.to_string()).collect(),
            );
        }
        def
    }

    fn registry(defs: Vec<OperatorDef>) -> Registry {
        let mut registry = Registry::with_builtins();
        for def in defs {
            registry.register_blueprint(def);
        }
        registry
    }

    #[test]
    fn test_valid_blueprints() {
        let registry = registry(vec![
            blueprint("a", &[("add", "math.add")], &[("(", &["(add"]), ("add)", &[")"])]),
            blueprint("b", &[("first", "a"), ("second", "a")], &[("first)", &["(second"])]),
        ]);
        assert!(validate_blueprints(&registry).is_ok());
    }

    #[test]
    fn test_empty_registry() {
        assert!(validate_blueprints(&Registry::new()).is_ok());
    }

    #[test]
    fn test_unknown_operator() {
        let registry = registry(vec![blueprint("a", &[("x", "nope.missing")], &[])]);
        let errors = validate_blueprints(&registry).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::UnknownOperator {
                blueprint: "a".into(),
                instance: "x".into(),
                operator: "nope.missing".into(),
            }]
        );
    }

    #[test]
    fn test_connection_problems_accumulate() {
        let registry = registry(vec![blueprint(
            "a",
            &[("add", "math.add")],
            &[
                ("add", &["(add"]),
                (")", &["(add"]),
                ("(", &["(ghost", "(add.{lane}"]),
            ],
        )]);
        let errors = validate_blueprints(&registry).unwrap_err();
        assert_eq!(errors.len(), 3, "{:?}", errors);

        assert!(errors.iter().any(|e| matches!(e,
            ValidationError::InvalidReference { reference, .. } if reference == "add")));
        assert!(errors.iter().any(|e| matches!(e,
            ValidationError::InvalidReference { reference, reason, .. }
                if reference == ")" && reason.contains("source"))));
        assert!(errors.iter().any(|e| matches!(e,
            ValidationError::UnknownInstance { instance, .. } if instance == "ghost")));
    }

    #[test]
    fn test_self_recursion() {
        let registry = registry(vec![blueprint("a", &[("inner", "a")], &[])]);
        assert_eq!(
            validate_blueprints(&registry).unwrap_err(),
            vec![ValidationError::RecursiveDefinition {
                cycle: vec!["a".into(), "a".into()]
            }]
        );
    }

    #[test]
    fn test_indirect_recursion_reports_the_loop() {
        let registry = registry(vec![
            blueprint("a", &[("next", "b")], &[]),
            blueprint("b", &[("next", "c")], &[]),
            blueprint("c", &[("next", "b"), ("sum", "math.add")], &[]),
        ]);
        assert_eq!(
            validate_blueprints(&registry).unwrap_err(),
            vec![ValidationError::RecursiveDefinition {
                cycle: vec!["b".into(), "c".into(), "b".into()]
            }]
        );
    }

    #[test]
    fn test_diamond_is_not_recursion() {
        let registry = registry(vec![
            blueprint("top", &[("l", "left"), ("r", "right")], &[]),
            blueprint("left", &[("x", "leaf")], &[]),
            blueprint("right", &[("x", "leaf")], &[]),
            blueprint("leaf", &[], &[]),
        ]);
        assert!(validate_blueprints(&registry).is_ok());
    }
}
