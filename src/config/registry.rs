// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::builtins::BuiltinFactory;
use crate::config::OperatorDef;
use crate::errors::BuildError;
use crate::observability::messages::build::DefinitionReplaced;
use crate::observability::messages::StructuredLog;
use crate::traits::Builtin;

/// A registered operator: code, or a blueprint made of other operators.
#[derive(Clone)]
pub enum Definition {
    Builtin {
        def: Arc<OperatorDef>,
        builtin: Arc<dyn Builtin>,
    },
    Blueprint(Arc<OperatorDef>),
}

impl Definition {
    pub fn def(&self) -> &Arc<OperatorDef> {
        match self {
            Definition::Builtin { def, .. } | Definition::Blueprint(def) => def,
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, Definition::Builtin { .. })
    }
}

/// Operator definitions by id.
///
/// Registering an id twice keeps the later definition and logs a warning.
#[derive(Clone, Default)]
pub struct Registry {
    entries: BTreeMap<String, Definition>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every builtin shipped with the crate.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for builtin in BuiltinFactory::create_all() {
            registry.register_builtin(builtin);
        }
        registry
    }

    pub fn register_builtin(&mut self, builtin: Arc<dyn Builtin>) {
        let def = Arc::new(builtin.definition());
        self.insert(def.id.clone(), Definition::Builtin { def, builtin });
    }

    pub fn register_blueprint(&mut self, def: OperatorDef) {
        self.insert(def.id.clone(), Definition::Blueprint(Arc::new(def)));
    }

    fn insert(&mut self, id: String, definition: Definition) {
        if self.entries.contains_key(&id) {
            DefinitionReplaced { id: &id }.log();
        }
        self.entries.insert(id, definition);
    }

    pub fn get(&self, id: &str) -> Option<&Definition> {
        self.entries.get(id)
    }

    pub fn lookup(&self, id: &str) -> Result<&Definition, BuildError> {
        self.get(id).ok_or_else(|| BuildError::UnknownOperator { id: id.to_string() })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn blueprints(&self) -> impl Iterator<Item = &Arc<OperatorDef>> {
        self.entries.values().filter_map(|d| match d {
            Definition::Blueprint(def) => Some(def),
            Definition::Builtin { .. } => None,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(id, d)| {
                (id, if d.is_builtin() { "builtin" } else { "blueprint" })
            }))
            .finish()
    }
}
