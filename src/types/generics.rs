// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::TypeDescriptor;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Bindings from generic identifiers to concrete types.
pub type Generics = BTreeMap<String, TypeDescriptor>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("generic '{name}' is not specified")]
pub struct UnresolvedGeneric {
    pub name: String,
}

impl TypeDescriptor {
    /// Replaces every generic placeholder that has a binding in `generics`.
    ///
    /// Inserted types are not rescanned, so a binding that itself mentions a
    /// generic stays as written.
    pub fn specify_generics(&mut self, generics: &Generics) {
        let bound = match self {
            TypeDescriptor::Generic(name) => generics.get(name.as_str()).cloned(),
            TypeDescriptor::Stream(element) => {
                element.specify_generics(generics);
                None
            }
            TypeDescriptor::Map(fields) => {
                for ty in fields.values_mut() {
                    ty.specify_generics(generics);
                }
                None
            }
            _ => None,
        };
        if let Some(bound) = bound {
            *self = bound;
        }
    }

    /// Copy of this type with `generics` applied.
    pub fn resolve(&self, generics: &Generics) -> TypeDescriptor {
        let mut resolved = self.clone();
        resolved.specify_generics(generics);
        resolved
    }

    /// Fails on the first generic placeholder still present.
    pub fn generics_specified(&self) -> Result<(), UnresolvedGeneric> {
        match self {
            TypeDescriptor::Generic(name) => Err(UnresolvedGeneric { name: name.clone() }),
            TypeDescriptor::Stream(element) => element.generics_specified(),
            TypeDescriptor::Map(fields) => fields.values().try_for_each(|t| t.generics_specified()),
            _ => Ok(()),
        }
    }

    pub fn generic_names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_generic_names(&mut names);
        names
    }

    fn collect_generic_names(&self, names: &mut BTreeSet<String>) {
        match self {
            TypeDescriptor::Generic(name) => {
                names.insert(name.clone());
            }
            TypeDescriptor::Stream(element) => element.collect_generic_names(names),
            TypeDescriptor::Map(fields) => {
                for ty in fields.values() {
                    ty.collect_generic_names(names);
                }
            }
            _ => {}
        }
    }
}
