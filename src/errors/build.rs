// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::ValidationError;
use crate::types::ExpansionError;
use thiserror::Error;

/// Failures while assembling, compiling or starting a network.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("cannot connect {src} to {dst}: {reason}")]
    TypeMismatch {
        src: String,
        dst: String,
        reason: String,
    },

    #[error("port {port} already receives from {existing}")]
    AlreadyConnected { port: String, existing: String },

    #[error("generic '{name}' is not specified in {location}")]
    UnresolvedGeneric { name: String, location: String },

    #[error("unknown operator '{id}'")]
    UnknownOperator { id: String },

    #[error("operator '{id}' instantiates itself: {}", .chain.join(" -> "))]
    Recursion { id: String, chain: Vec<String> },

    #[error("input {port} of operator '{operator}' has no source")]
    IncompleteWiring { operator: String, port: String },

    #[error("operator '{operator}' has no service '{service}'")]
    MissingService { operator: String, service: String },

    #[error("operator '{operator}' is still composite after compilation")]
    NotFlat { operator: String },

    #[error("invalid port reference '{reference}': {reason}")]
    InvalidPortReference { reference: String, reason: String },

    #[error("operator '{operator}': {reason}")]
    Property { operator: String, reason: String },

    #[error("operator '{operator}': {source}")]
    Expansion {
        operator: String,
        #[source]
        source: ExpansionError,
    },

    #[error("operator '{operator}' rejected connection {src} -> {dst}: {reason}")]
    ConnectionRejected {
        operator: String,
        src: String,
        dst: String,
        reason: String,
    },

    #[error("cannot attach '{operator}': {reason}")]
    Hierarchy { operator: String, reason: String },

    #[error("failed to spawn worker for '{operator}': {source}")]
    WorkerSpawn {
        operator: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load {path}: {reason}")]
    Load { path: String, reason: String },

    #[error("blueprints failed validation: {}", join_errors(.0))]
    Invalid(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
