// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Operators implemented in Rust.
//!
//! These are ordinary clients of the port API: each one pulls from its
//! inputs, pushes to its outputs and keeps to the marker protocol like any
//! other leaf.

use std::sync::Arc;

use crate::traits::Builtin;

pub mod add;
pub mod aggregate;
pub mod fork;
pub mod merge;
pub mod window_count;

#[cfg(test)]
pub mod stub;

pub use add::Add;
pub use aggregate::Aggregate;
pub use fork::Fork;
pub use merge::Merge;
pub use window_count::WindowCount;

pub const ADD: &str = "math.add";
pub const AGGREGATE: &str = "stream.aggregate";
pub const FORK: &str = "stream.fork";
pub const MERGE: &str = "stream.merge";
pub const WINDOW_COUNT: &str = "stream.window_count";

/// Factory for the builtins shipped with the crate.
pub struct BuiltinFactory;

impl BuiltinFactory {
    /// Create a builtin by registry id
    ///
    /// - "math.add" -> [`Add`]
    /// - "stream.aggregate" -> [`Aggregate`]
    /// - "stream.fork" -> [`Fork`]
    /// - "stream.merge" -> [`Merge`]
    /// - "stream.window_count" -> [`WindowCount`]
    pub fn create_builtin(name: &str) -> Result<Arc<dyn Builtin>, String> {
        match name {
            ADD => Ok(Arc::new(Add)),
            AGGREGATE => Ok(Arc::new(Aggregate)),
            FORK => Ok(Arc::new(Fork)),
            MERGE => Ok(Arc::new(Merge)),
            WINDOW_COUNT => Ok(Arc::new(WindowCount)),
            _ => Err(format!("Unknown builtin operator: '{}'", name)),
        }
    }

    /// One instance of every available builtin.
    pub fn create_all() -> Vec<Arc<dyn Builtin>> {
        Self::list_available_builtins()
            .into_iter()
            .filter_map(|name| Self::create_builtin(name).ok())
            .collect()
    }

    /// List all available builtin ids
    pub fn list_available_builtins() -> Vec<&'static str> {
        vec![ADD, AGGREGATE, FORK, MERGE, WINDOW_COUNT]
    }

    /// Check if a builtin is available
    pub fn is_builtin_available(name: &str) -> bool {
        Self::list_available_builtins().contains(&name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_every_listed_builtin() {
        for name in BuiltinFactory::list_available_builtins() {
            let builtin = BuiltinFactory::create_builtin(name)
                .unwrap_or_else(|e| panic!("Failed to create builtin {}: {}", name, e));
            assert_eq!(builtin.name(), name);
            assert_eq!(builtin.definition().id, name, "definition id of {}", name);
        }
        assert_eq!(
            BuiltinFactory::create_all().len(),
            BuiltinFactory::list_available_builtins().len()
        );
    }

    #[test]
    fn test_unknown_builtin() {
        let result = BuiltinFactory::create_builtin("stream.nope");
        assert!(result.is_err());
        assert!(result.err().unwrap().contains("stream.nope"));
        assert!(!BuiltinFactory::is_builtin_available("stream.nope"));
        assert!(BuiltinFactory::is_builtin_available(FORK));
    }

    #[test]
    fn test_builtins_have_main_service() {
        for builtin in BuiltinFactory::create_all() {
            let def = builtin.definition();
            assert!(
                def.services.contains_key(crate::config::consts::MAIN_SERVICE),
                "{} has no main service",
                def.id
            );
            assert!(def.operators.is_empty());
            assert!(def.connections.is_empty());
        }
    }
}
