// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Structural port types.
//!
//! A [`TypeDescriptor`] is the "shape" of a port: a scalar kind, a stream of
//! some element type, a map of named fields, or a generic placeholder that is
//! specified when an operator is instantiated. Types are compared purely
//! structurally; there is no nominal typing.
//!
//! # Serialized form
//!
//! ```yaml
//! type: map
//! map:
//!   init: {type: number}
//!   items:
//!     type: stream
//!     stream: {type: generic, generic: itemType}
//! ```

pub mod expansion;
pub mod generics;

pub use expansion::{expand_template, Bindings, ExpansionError, Properties};
pub use generics::{Generics, UnresolvedGeneric};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Structural type of a port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawType", into = "RawType")]
pub enum TypeDescriptor {
    /// No payload; only the arrival of an item matters.
    Trigger,
    /// Any scalar value.
    Primitive,
    String,
    Number,
    Boolean,
    Binary,
    Stream(Box<TypeDescriptor>),
    /// Named fields, ordered by name.
    Map(BTreeMap<String, TypeDescriptor>),
    /// Placeholder resolved through a [`Generics`] table.
    Generic(String),
}

impl TypeDescriptor {
    pub fn stream(element: TypeDescriptor) -> Self {
        TypeDescriptor::Stream(Box::new(element))
    }

    pub fn map<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, TypeDescriptor)>,
        K: Into<String>,
    {
        TypeDescriptor::Map(fields.into_iter().map(|(k, t)| (k.into(), t)).collect())
    }

    pub fn generic(name: impl Into<String>) -> Self {
        TypeDescriptor::Generic(name.into())
    }

    /// Name of the kind as used in the serialized form.
    pub fn kind_name(&self) -> &'static str {
        match self {
            TypeDescriptor::Trigger => "trigger",
            TypeDescriptor::Primitive => "primitive",
            TypeDescriptor::String => "string",
            TypeDescriptor::Number => "number",
            TypeDescriptor::Boolean => "boolean",
            TypeDescriptor::Binary => "binary",
            TypeDescriptor::Stream(_) => "stream",
            TypeDescriptor::Map(_) => "map",
            TypeDescriptor::Generic(_) => "generic",
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            TypeDescriptor::Primitive
                | TypeDescriptor::String
                | TypeDescriptor::Number
                | TypeDescriptor::Boolean
                | TypeDescriptor::Binary
        )
    }

    /// Trigger, or a map without fields.
    pub fn is_trigger_like(&self) -> bool {
        match self {
            TypeDescriptor::Trigger => true,
            TypeDescriptor::Map(fields) => fields.is_empty(),
            _ => false,
        }
    }

    /// Checks whether a port of this type may be connected to a port of
    /// `other`. On mismatch the error names the first offending location.
    pub fn compatible_with(&self, other: &TypeDescriptor) -> Result<(), String> {
        self.check_compatible(other, "")
    }

    fn check_compatible(&self, other: &TypeDescriptor, at: &str) -> Result<(), String> {
        let location = if at.is_empty() { "top level" } else { at };
        match (self, other) {
            (TypeDescriptor::Primitive, b) if b.is_scalar() => Ok(()),
            (a, TypeDescriptor::Primitive) if a.is_scalar() => Ok(()),
            (a, b) if a.is_trigger_like() && b.is_trigger_like() => Ok(()),
            (TypeDescriptor::Stream(a), TypeDescriptor::Stream(b)) => {
                a.check_compatible(b, &format!("{at}~"))
            }
            (TypeDescriptor::Map(a), TypeDescriptor::Map(b)) => {
                if a.len() != b.len() || a.keys().any(|k| !b.contains_key(k)) {
                    return Err(format!(
                        "map fields differ at {}: [{}] vs [{}]",
                        location,
                        a.keys().cloned().collect::<Vec<_>>().join(", "),
                        b.keys().cloned().collect::<Vec<_>>().join(", ")
                    ));
                }
                for (name, ty) in a {
                    ty.check_compatible(&b[name], &format!("{at}.{name}"))?;
                }
                Ok(())
            }
            (TypeDescriptor::Generic(a), TypeDescriptor::Generic(b)) if a == b => Ok(()),
            (a, b) if a == b && a.is_scalar() => Ok(()),
            (a, b) => Err(format!("{a} is not compatible with {b} at {location}")),
        }
    }

    /// Structural check of a JSON value against this type, used for property
    /// values. Generics accept anything.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            TypeDescriptor::Trigger => value.is_null(),
            TypeDescriptor::Primitive => !value.is_array() && !value.is_object(),
            TypeDescriptor::String => value.is_string(),
            TypeDescriptor::Number => value.is_number(),
            TypeDescriptor::Boolean => value.is_boolean(),
            TypeDescriptor::Binary => match value {
                Value::String(_) => true,
                Value::Array(bytes) => bytes.iter().all(|b| b.as_u64().is_some_and(|b| b <= 255)),
                _ => false,
            },
            TypeDescriptor::Stream(element) => value
                .as_array()
                .is_some_and(|items| items.iter().all(|item| element.accepts(item))),
            TypeDescriptor::Map(fields) if fields.is_empty() => {
                value.is_null() || value.as_object().is_some_and(|o| o.is_empty())
            }
            TypeDescriptor::Map(fields) => value.as_object().is_some_and(|object| {
                fields
                    .iter()
                    .all(|(name, ty)| ty.accepts(object.get(name).unwrap_or(&Value::Null)))
            }),
            TypeDescriptor::Generic(_) => true,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Stream(element) => write!(f, "stream<{element}>"),
            TypeDescriptor::Map(fields) => {
                write!(f, "map{{")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {ty}")?;
                }
                write!(f, "}}")
            }
            TypeDescriptor::Generic(name) => write!(f, "generic<{name}>"),
            other => write!(f, "{}", other.kind_name()),
        }
    }
}

/// Wire form of a [`TypeDescriptor`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawType {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stream: Option<Box<RawType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    map: Option<BTreeMap<String, RawType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    generic: Option<String>,
}

impl TryFrom<RawType> for TypeDescriptor {
    type Error = String;

    fn try_from(raw: RawType) -> Result<Self, Self::Error> {
        Ok(match raw.kind.as_str() {
            "trigger" => TypeDescriptor::Trigger,
            "primitive" => TypeDescriptor::Primitive,
            "string" => TypeDescriptor::String,
            "number" => TypeDescriptor::Number,
            "boolean" => TypeDescriptor::Boolean,
            "binary" => TypeDescriptor::Binary,
            "stream" => {
                let element = raw
                    .stream
                    .ok_or_else(|| "stream type requires a 'stream' element type".to_string())?;
                TypeDescriptor::stream(TypeDescriptor::try_from(*element)?)
            }
            "map" => TypeDescriptor::Map(
                raw.map
                    .unwrap_or_default()
                    .into_iter()
                    .map(|(name, ty)| Ok((name, TypeDescriptor::try_from(ty)?)))
                    .collect::<Result<_, String>>()?,
            ),
            "generic" => match raw.generic {
                Some(name) if !name.trim().is_empty() => TypeDescriptor::Generic(name),
                _ => return Err("generic type requires a non-empty 'generic' name".to_string()),
            },
            other => return Err(format!("unknown type '{other}'")),
        })
    }
}

impl From<TypeDescriptor> for RawType {
    fn from(ty: TypeDescriptor) -> Self {
        let kind = ty.kind_name().to_string();
        let mut raw = RawType {
            kind,
            stream: None,
            map: None,
            generic: None,
        };
        match ty {
            TypeDescriptor::Stream(element) => raw.stream = Some(Box::new((*element).into())),
            TypeDescriptor::Map(fields) => {
                raw.map = Some(fields.into_iter().map(|(k, t)| (k, t.into())).collect())
            }
            TypeDescriptor::Generic(name) => raw.generic = Some(name),
            _ => {}
        }
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> TypeDescriptor {
        TypeDescriptor::map([
            ("item", TypeDescriptor::generic("itemType")),
            ("select", TypeDescriptor::Boolean),
        ])
    }

    #[test]
    fn parse_nested_type() {
        let yaml = r#"
type: stream
stream:
  type: map
  map:
    item: {type: generic, generic: itemType}
    select: {type: boolean}
"#;
        let ty: TypeDescriptor = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(ty, TypeDescriptor::stream(record()));
    }

    #[test]
    fn parse_rejects_invalid_types() {
        let cases = vec![
            ("stream without element", "{type: stream}"),
            ("generic without name", "{type: generic}"),
            ("generic with blank name", "{type: generic, generic: '  '}"),
            ("unknown kind", "{type: tuple}"),
        ];

        for (name, yaml) in cases {
            let result: Result<TypeDescriptor, _> = serde_yaml::from_str(yaml);
            assert!(result.is_err(), "case '{}' should fail", name);
        }
    }

    #[test]
    fn serialize_round_trips_through_json() {
        let ty = TypeDescriptor::stream(record());
        let text = serde_json::to_string(&ty).unwrap();
        assert!(text.contains("\"type\":\"stream\""));
        let back: TypeDescriptor = serde_json::from_str(&text).unwrap();
        assert_eq!(back, ty);
    }

    #[test]
    fn copy_is_not_aliased() {
        let original = TypeDescriptor::stream(record());
        let mut copy = original.clone();
        if let TypeDescriptor::Stream(element) = &mut copy {
            if let TypeDescriptor::Map(fields) = element.as_mut() {
                fields.insert("extra".to_string(), TypeDescriptor::Number);
            }
        }
        assert_ne!(copy, original);
        assert_eq!(original, TypeDescriptor::stream(record()));
    }

    #[test]
    fn primitive_is_scalar_wildcard() {
        assert!(TypeDescriptor::Primitive.compatible_with(&TypeDescriptor::Number).is_ok());
        assert!(TypeDescriptor::String.compatible_with(&TypeDescriptor::Primitive).is_ok());
        assert!(TypeDescriptor::Primitive
            .compatible_with(&TypeDescriptor::stream(TypeDescriptor::Number))
            .is_err());
        assert!(TypeDescriptor::String.compatible_with(&TypeDescriptor::Number).is_err());
    }

    #[test]
    fn empty_map_is_trigger_like() {
        let unit = TypeDescriptor::Map(BTreeMap::new());
        assert!(unit.compatible_with(&TypeDescriptor::Trigger).is_ok());
        assert!(unit.accepts(&Value::Null));
    }

    #[test]
    fn map_field_sets_must_match() {
        let a = TypeDescriptor::map([("x", TypeDescriptor::Number), ("y", TypeDescriptor::Number)]);
        let b = TypeDescriptor::map([("x", TypeDescriptor::Number), ("z", TypeDescriptor::Number)]);
        let err = a.compatible_with(&b).unwrap_err();
        assert!(err.contains("map fields differ"));
    }

    #[test]
    fn mismatch_reports_location() {
        let a = TypeDescriptor::stream(TypeDescriptor::map([("v", TypeDescriptor::Number)]));
        let b = TypeDescriptor::stream(TypeDescriptor::map([("v", TypeDescriptor::String)]));
        let err = a.compatible_with(&b).unwrap_err();
        assert!(err.contains("~.v"), "unexpected message: {}", err);
    }

    #[test]
    fn accepts_checks_structure() {
        let ty = TypeDescriptor::map([
            ("size", TypeDescriptor::Number),
            ("names", TypeDescriptor::stream(TypeDescriptor::String)),
        ]);
        assert!(ty.accepts(&json!({"size": 3, "names": ["a", "b"]})));
        assert!(!ty.accepts(&json!({"size": "3", "names": []})));
        assert!(!ty.accepts(&json!({"size": 3})));
        assert!(TypeDescriptor::Binary.accepts(&json!([0, 255])));
        assert!(!TypeDescriptor::Binary.accepts(&json!([256])));
    }

    #[test]
    fn display_is_readable() {
        assert_eq!(
            TypeDescriptor::stream(record()).to_string(),
            "stream<map{item: generic<itemType>, select: boolean}>"
        );
    }
}
