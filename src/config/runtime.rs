// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::MAIN_SERVICE;
use crate::config::{load_blueprints, validate_blueprints, Registry, RunConfig};
use crate::engine::{build, Built, Runtime};
use crate::errors::BuildError;

/// Network runtime builder - turns a [`RunConfig`] into a running network.
///
/// The steps are the same every time:
/// 1. a registry of the builtins plus every blueprint in the configured
///    directory,
/// 2. static validation of those blueprints,
/// 3. building the configured operator,
/// 4. flattening it,
/// 5. optionally buffering the root's main output,
/// 6. starting one worker per leaf.
///
/// # Examples
///
/// ```
/// use portflow::config::{RunConfig, RuntimeBuilder};
///
/// let config: RunConfig = serde_yaml::from_str("operator: math.add").unwrap();
/// let runtime = RuntimeBuilder::from_config(&config).unwrap();
///
/// runtime.main().input().push(serde_json::json!({"a": 1, "b": 2})).unwrap();
/// assert_eq!(
///     runtime.main().output().pull().unwrap().into_value(),
///     Some(serde_json::json!(3))
/// );
/// assert!(runtime.stop().is_empty());
/// ```
pub struct RuntimeBuilder;

impl RuntimeBuilder {
    /// Registry of the builtins and the blueprints found in
    /// `cfg.blueprints`, if set.
    pub fn registry_from_config(cfg: &RunConfig) -> Result<Registry, BuildError> {
        let mut registry = Registry::with_builtins();
        if let Some(dir) = &cfg.blueprints {
            for def in load_blueprints(dir)? {
                registry.register_blueprint(def);
            }
        }
        Ok(registry)
    }

    /// Build and start the configured operator.
    pub fn from_config(cfg: &RunConfig) -> Result<Runtime, BuildError> {
        let registry = Self::registry_from_config(cfg)?;
        Self::from_registry(&registry, cfg)
    }

    /// Like [`RuntimeBuilder::from_config`] with an already assembled
    /// registry.
    pub fn from_registry(registry: &Registry, cfg: &RunConfig) -> Result<Runtime, BuildError> {
        validate_blueprints(registry).map_err(BuildError::Invalid)?;

        let Built { mut network, root } = build(registry, &cfg.operator, &cfg.generics, &cfg.properties)?;
        network.compile(root);

        let main = network.operator(root).service(MAIN_SERVICE).ok_or_else(|| {
            BuildError::MissingService {
                operator: cfg.operator.clone(),
                service: MAIN_SERVICE.to_string(),
            }
        })?;
        let output = main.output().id();
        if cfg.runtime.buffer_output {
            network.bufferize(output);
        }
        Runtime::start(network, root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{parse_blueprint, RuntimeOptions};
    use crate::engine::Item;
    use crate::types::{Generics, Properties};
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    fn run_config(operator: &str) -> RunConfig {
        RunConfig {
            blueprints: None,
            operator: operator.to_string(),
            generics: Generics::new(),
            properties: Properties::new(),
            runtime: RuntimeOptions::default(),
        }
    }

    #[test]
    fn test_builtin_root() {
        let runtime = RuntimeBuilder::from_config(&run_config("math.add")).unwrap();
        assert_eq!(runtime.worker_count(), 1);
        assert!(runtime.network().is_buffered(runtime.main().output().id()));

        runtime.main().input().push(json!({"a": 2, "b": 2})).unwrap();
        assert_eq!(runtime.main().output().pull().unwrap(), Item::Value(json!(4)));
        assert!(runtime.stop().is_empty());
    }

    #[test]
    fn test_blueprints_from_directory() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("double.yaml"),
            r#"
id: example.double
services:
  main: {in: {type: number}, out: {type: number}}
operators:
  add: {operator: math.add}
connections:
  "(": ["(add.a", "(add.b"]
  "add)": [")"]
"#,
        )
        .unwrap();

        let mut cfg = run_config("example.double");
        cfg.blueprints = Some(dir.path().to_path_buf());
        let runtime = RuntimeBuilder::from_config(&cfg).unwrap();

        runtime.main().input().push(json!(21)).unwrap();
        assert_eq!(runtime.main().output().pull().unwrap(), Item::Value(json!(42)));
        assert!(runtime.stop().is_empty());
    }

    #[test]
    fn test_invalid_blueprints_prevent_start() {
        let mut registry = Registry::with_builtins();
        registry.register_blueprint(
            parse_blueprint(r#"{"id": "loop", "operators": {"me": {"operator": "loop"}}}"#, true).unwrap(),
        );

        match RuntimeBuilder::from_registry(&registry, &run_config("math.add")) {
            Err(BuildError::Invalid(errors)) => assert_eq!(errors.len(), 1),
            Err(other) => panic!("unexpected error {}", other),
            Ok(_) => panic!("started despite invalid blueprints"),
        }
    }

    #[test]
    fn test_unbuffered_output() {
        let mut cfg = run_config("math.add");
        cfg.runtime.buffer_output = false;
        let runtime = RuntimeBuilder::from_config(&cfg).unwrap();
        assert!(!runtime.network().is_buffered(runtime.main().output().id()));
        assert!(runtime.stop().is_empty());
    }

    #[test]
    fn test_root_without_main_service() {
        let mut registry = Registry::with_builtins();
        registry.register_blueprint(
            parse_blueprint(
                "id: example.sideways\nservices:\n  other: {in: {type: number}, out: {type: number}}\n",
                false,
            )
            .unwrap(),
        );

        match RuntimeBuilder::from_registry(&registry, &run_config("example.sideways")) {
            Err(BuildError::MissingService { operator, service }) => {
                assert_eq!(operator, "example.sideways");
                assert_eq!(service, "main");
            }
            Err(other) => panic!("unexpected error {}", other),
            Ok(_) => panic!("started without a main service"),
        }
    }

    #[test]
    fn test_unknown_operator() {
        match RuntimeBuilder::from_config(&run_config("nope")) {
            Err(BuildError::UnknownOperator { id }) => assert_eq!(id, "nope"),
            Err(other) => panic!("unexpected error {}", other),
            Ok(_) => panic!("started an unknown operator"),
        }
    }
}
