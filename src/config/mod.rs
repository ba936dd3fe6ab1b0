// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod loader;
pub mod port_ref;
mod registry;
mod runtime;
mod validation;

pub mod consts;

pub use loader::{
    load_blueprint, load_blueprints, load_run_config, parse_blueprint, InstanceDef, OperatorDef,
    RunConfig, RuntimeOptions, ServiceDef,
};
pub use port_ref::{PortRef, Role};
pub use registry::{Definition, Registry};
pub use runtime::RuntimeBuilder;
pub use validation::validate_blueprints;
