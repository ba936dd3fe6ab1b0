// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Property placeholder expansion.
//!
//! Service names, delegate names, map field names and connection references
//! may contain `{name}` placeholders. A scalar property replaces the
//! placeholder with its value; an array property multiplies the template into
//! one copy per element. Several array placeholders in one template produce
//! their cross product.
//!
//! A placeholder bound once stays bound for the rest of the template, and
//! callers may pass bindings fixed earlier (a connection destination sees the
//! values chosen while expanding its source).

use super::TypeDescriptor;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Instance property values.
pub type Properties = serde_json::Map<String, Value>;

/// Placeholder values fixed during one expansion.
pub type Bindings = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpansionError {
    #[error("placeholder '{{{0}}}' names no property")]
    MissingProperty(String),
    #[error("property '{0}' expands to an empty list")]
    EmptyList(String),
    #[error("property '{0}' must be a scalar or a list of scalars")]
    NonScalar(String),
    #[error("unterminated placeholder in '{0}'")]
    Unterminated(String),
    #[error("expansion of '{template}' produces '{name}' more than once")]
    Duplicate { template: String, name: String },
}

enum Segment<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

fn segments(template: &str) -> Result<Vec<Segment<'_>>, ExpansionError> {
    let mut out = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        if open > 0 {
            out.push(Segment::Literal(&rest[..open]));
        }
        let after = &rest[open + 1..];
        let close = after
            .find('}')
            .ok_or_else(|| ExpansionError::Unterminated(template.to_string()))?;
        out.push(Segment::Placeholder(&after[..close]));
        rest = &after[close + 1..];
    }
    if !rest.is_empty() {
        out.push(Segment::Literal(rest));
    }
    Ok(out)
}

fn scalar_text(name: &str, value: &Value) -> Result<String, ExpansionError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(ExpansionError::NonScalar(name.to_string())),
    }
}

fn property_values(name: &str, properties: &Properties) -> Result<Vec<String>, ExpansionError> {
    match properties.get(name) {
        None => Err(ExpansionError::MissingProperty(name.to_string())),
        Some(Value::Array(items)) if items.is_empty() => {
            Err(ExpansionError::EmptyList(name.to_string()))
        }
        Some(Value::Array(items)) => items.iter().map(|v| scalar_text(name, v)).collect(),
        Some(value) => Ok(vec![scalar_text(name, value)?]),
    }
}

/// True when `template` still needs expanding against properties.
pub fn has_placeholder(template: &str) -> bool {
    template.contains('{')
}

/// Expands `template` against `properties`, returning every produced name
/// together with the bindings that produced it.
pub fn expand_template(
    template: &str,
    properties: &Properties,
    fixed: &Bindings,
) -> Result<Vec<(String, Bindings)>, ExpansionError> {
    let mut partial = vec![(String::new(), fixed.clone())];

    for segment in segments(template)? {
        match segment {
            Segment::Literal(text) => {
                for (name, _) in partial.iter_mut() {
                    name.push_str(text);
                }
            }
            Segment::Placeholder(key) => {
                let mut next = Vec::with_capacity(partial.len());
                for (name, bindings) in partial {
                    if let Some(value) = bindings.get(key) {
                        next.push((format!("{name}{value}"), bindings));
                        continue;
                    }
                    for value in property_values(key, properties)? {
                        let mut bound = bindings.clone();
                        bound.insert(key.to_string(), value.clone());
                        next.push((format!("{name}{value}"), bound));
                    }
                }
                partial = next;
            }
        }
    }

    let mut seen = BTreeSet::new();
    for (name, _) in &partial {
        if !seen.insert(name.as_str()) {
            return Err(ExpansionError::Duplicate {
                template: template.to_string(),
                name: name.clone(),
            });
        }
    }
    Ok(partial)
}

impl TypeDescriptor {
    /// Expands placeholders in map field names, recursively.
    pub fn expand_properties(
        &self,
        properties: &Properties,
        fixed: &Bindings,
    ) -> Result<TypeDescriptor, ExpansionError> {
        Ok(match self {
            TypeDescriptor::Stream(element) => {
                TypeDescriptor::stream(element.expand_properties(properties, fixed)?)
            }
            TypeDescriptor::Map(fields) => {
                let mut expanded = BTreeMap::new();
                for (template, ty) in fields {
                    for (name, bindings) in expand_template(template, properties, fixed)? {
                        let ty = ty.expand_properties(properties, &bindings)?;
                        if expanded.insert(name.clone(), ty).is_some() {
                            return Err(ExpansionError::Duplicate {
                                template: template.clone(),
                                name,
                            });
                        }
                    }
                }
                TypeDescriptor::Map(expanded)
            }
            other => other.clone(),
        })
    }
}
