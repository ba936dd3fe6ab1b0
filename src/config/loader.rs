// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{BLUEPRINT_EXTENSIONS, DEFAULT_DRAIN_TIMEOUT_MS};
use crate::errors::BuildError;
use crate::observability::messages::build::BlueprintLoaded;
use crate::observability::messages::StructuredLog;
use crate::types::{Generics, Properties, TypeDescriptor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Definition of an operator: its interface and, for blueprints, the child
/// operators and connections that implement it.
///
/// Builtins provide the same structure from code, with no children.
///
/// # Fields
/// * `id` - Registry key, conventionally dotted (`stream.aggregate`)
/// * `services` - Named input/output pairs, one of them usually `main`
/// * `delegates` - Named output/input pairs the operator calls out through
/// * `properties` - Declared property types, values given per instance
/// * `operators` - Child instances by name
/// * `connections` - Source reference to destination references
///
/// Names of services, delegates and map fields, as well as connection
/// references, may contain `{property}` placeholders.
///
/// # Example
/// ```yaml
/// id: example.sum
/// services:
///   main:
///     in:
///       type: map
///       map:
///         init: {type: number}
///         items: {type: stream, stream: {type: number}}
///     out: {type: number}
/// operators:
///   agg:
///     operator: stream.aggregate
///     generics:
///       itemType: {type: number}
///       stateType: {type: number}
///   add:
///     operator: math.add
/// connections:
///   "(": ["(agg"]
///   "agg#iteration)~.item": ["(add.a"]
///   "agg#iteration)~.state": ["(add.b"]
///   "add)": ["(agg#iteration~"]
///   "agg)": [")"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorDef {
    pub id: String,
    #[serde(default)]
    pub services: BTreeMap<String, ServiceDef>,
    #[serde(default)]
    pub delegates: BTreeMap<String, ServiceDef>,
    #[serde(default)]
    pub properties: BTreeMap<String, TypeDescriptor>,
    #[serde(default)]
    pub operators: BTreeMap<String, InstanceDef>,
    #[serde(default)]
    pub connections: BTreeMap<String, Vec<String>>,
}

impl OperatorDef {
    pub fn new(id: impl Into<String>) -> Self {
        OperatorDef {
            id: id.into(),
            services: BTreeMap::new(),
            delegates: BTreeMap::new(),
            properties: BTreeMap::new(),
            operators: BTreeMap::new(),
            connections: BTreeMap::new(),
        }
    }

    pub fn with_service(mut self, name: &str, input: TypeDescriptor, output: TypeDescriptor) -> Self {
        self.services
            .insert(name.to_string(), ServiceDef { input, output });
        self
    }

    /// Adds a delegate. `output` leaves the owning operator, `input` comes
    /// back to it.
    pub fn with_delegate(mut self, name: &str, output: TypeDescriptor, input: TypeDescriptor) -> Self {
        self.delegates
            .insert(name.to_string(), ServiceDef { input, output });
        self
    }

    pub fn with_property(mut self, name: &str, ty: TypeDescriptor) -> Self {
        self.properties.insert(name.to_string(), ty);
        self
    }
}

/// One service or delegate interface. For a delegate, `out` is what the
/// owner sends and `in` is what it receives back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDef {
    #[serde(rename = "in")]
    pub input: TypeDescriptor,
    #[serde(rename = "out")]
    pub output: TypeDescriptor,
}

/// A child instance inside a blueprint.
///
/// String property values of the form `$name` take the value of the
/// enclosing operator's property `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceDef {
    pub operator: String,
    #[serde(default)]
    pub generics: Generics,
    #[serde(default)]
    pub properties: Properties,
}

/// What the `portflow` binary runs.
///
/// # Example
/// ```yaml
/// blueprints: ./blueprints
/// operator: example.sum
/// generics: {}
/// properties: {}
/// runtime:
///   buffer_output: true
///   drain_timeout_ms: 500
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// Directory of blueprint files. Relative paths are resolved against the
    /// directory of the run configuration itself.
    #[serde(default)]
    pub blueprints: Option<PathBuf>,
    pub operator: String,
    #[serde(default)]
    pub generics: Generics,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default)]
    pub runtime: RuntimeOptions,
}

/// Runtime options of the driver binary.
///
/// # Fields
/// * `buffer_output` - Give the root's main output unbounded mailboxes so
///   the network never waits for the printer (defaults to true)
/// * `drain_timeout_ms` - Wait after stdin is exhausted before stopping
#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeOptions {
    #[serde(default = "default_buffer_output")]
    pub buffer_output: bool,
    pub drain_timeout_ms: Option<u64>,
}

fn default_buffer_output() -> bool {
    true
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            buffer_output: true,
            drain_timeout_ms: None,
        }
    }
}

impl RuntimeOptions {
    pub fn get_drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms.unwrap_or(DEFAULT_DRAIN_TIMEOUT_MS))
    }
}

fn load_error(path: &Path, reason: impl ToString) -> BuildError {
    BuildError::Load {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("json")
}

/// Parses a blueprint in YAML or, when `json` is set, JSON.
pub fn parse_blueprint(text: &str, json: bool) -> Result<OperatorDef, String> {
    if json {
        serde_json::from_str(text).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str(text).map_err(|e| e.to_string())
    }
}

/// Loads one blueprint file. The format follows the extension.
pub fn load_blueprint<P: AsRef<Path>>(path: P) -> Result<OperatorDef, BuildError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| load_error(path, e))?;
    let def = parse_blueprint(&text, is_json(path)).map_err(|e| load_error(path, e))?;
    BlueprintLoaded {
        path: &path.display().to_string(),
        id: &def.id,
    }
    .log();
    Ok(def)
}

/// Loads every blueprint file in `dir`, in file name order. Files with other
/// extensions are skipped.
pub fn load_blueprints<P: AsRef<Path>>(dir: P) -> Result<Vec<OperatorDef>, BuildError> {
    let dir = dir.as_ref();
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| load_error(dir, e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| BLUEPRINT_EXTENSIONS.contains(&e))
        })
        .collect();
    paths.sort();
    paths.iter().map(load_blueprint).collect()
}

pub fn load_run_config<P: AsRef<Path>>(path: P) -> Result<RunConfig, BuildError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| load_error(path, e))?;
    let mut config: RunConfig = serde_yaml::from_str(&text).map_err(|e| load_error(path, e))?;
    if let (Some(dir), Some(base)) = (config.blueprints.as_ref(), path.parent()) {
        if dir.is_relative() {
            config.blueprints = Some(base.join(dir));
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::{tempdir, Builder, NamedTempFile};

    const SUM: &str = r#"
id: example.sum
services:
  main:
    in:
      type: map
      map:
        init: {type: number}
        items: {type: stream, stream: {type: number}}
    out: {type: number}
operators:
  agg:
    operator: stream.aggregate
    generics:
      itemType: {type: number}
      stateType: {type: number}
  add:
    operator: math.add
connections:
  "(": ["(agg"]
  "agg)": [")"]
"#;

    #[test]
    fn parse_blueprint_yaml() {
        let def = parse_blueprint(SUM, false).unwrap();
        assert_eq!(def.id, "example.sum");
        assert_eq!(def.services["main"].output, TypeDescriptor::Number);
        assert_eq!(def.operators["agg"].operator, "stream.aggregate");
        assert_eq!(
            def.operators["agg"].generics["itemType"],
            TypeDescriptor::Number
        );
        assert_eq!(def.connections["("], vec!["(agg"]);
        assert!(def.delegates.is_empty());
    }

    #[test]
    fn parse_blueprint_json() {
        let text = json!({
            "id": "example.passthrough",
            "services": {"main": {"in": {"type": "string"}, "out": {"type": "string"}}},
            "connections": {"(": [")"]}
        })
        .to_string();
        let def = parse_blueprint(&text, true).unwrap();
        assert_eq!(def.id, "example.passthrough");
        assert!(def.operators.is_empty());
    }

    #[test]
    fn parse_blueprint_rejects_bad_types() {
        let text = "id: broken\nservices:\n  main:\n    in: {type: stream}\n    out: {type: number}\n";
        assert!(parse_blueprint(text, false).is_err());
    }

    #[test]
    fn instance_properties_keep_json_values() {
        let text = r#"
id: example.windows
operators:
  win:
    operator: stream.window_count
    properties:
      size: 3
      slide: "$step"
"#;
        let def = parse_blueprint(text, false).unwrap();
        let props = &def.operators["win"].properties;
        assert_eq!(props["size"], json!(3));
        assert_eq!(props["slide"], json!("$step"));
    }

    #[test]
    fn load_blueprint_from_file() {
        let mut file = Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(file, "{}", SUM).unwrap();

        let def = load_blueprint(file.path()).unwrap();
        assert_eq!(def.id, "example.sum");
    }

    #[test]
    fn load_blueprint_reports_path() {
        let err = load_blueprint("/nonexistent/blueprint.yaml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/blueprint.yaml"));
    }

    #[test]
    fn load_blueprints_skips_other_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.yaml"), SUM).unwrap();
        fs::write(
            dir.path().join("a.json"),
            r#"{"id": "example.first", "services": {}}"#,
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "not a blueprint").unwrap();

        let defs = load_blueprints(dir.path()).unwrap();
        let ids: Vec<&str> = defs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["example.first", "example.sum"]);
    }

    #[test]
    fn run_config_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "operator: example.sum\n").unwrap();

        let config = load_run_config(file.path()).unwrap();
        assert_eq!(config.operator, "example.sum");
        assert!(config.blueprints.is_none());
        assert!(config.runtime.buffer_output);
        assert_eq!(
            config.runtime.get_drain_timeout(),
            Duration::from_millis(DEFAULT_DRAIN_TIMEOUT_MS)
        );
    }

    #[test]
    fn run_config_resolves_relative_blueprints() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.yaml");
        fs::write(
            &path,
            "blueprints: defs\noperator: example.sum\nproperties:\n  size: 2\nruntime:\n  buffer_output: false\n  drain_timeout_ms: 50\n",
        )
        .unwrap();

        let config = load_run_config(&path).unwrap();
        assert_eq!(config.blueprints, Some(dir.path().join("defs")));
        assert_eq!(config.properties["size"], json!(2));
        assert!(!config.runtime.buffer_output);
        assert_eq!(config.runtime.get_drain_timeout(), Duration::from_millis(50));
    }
}
