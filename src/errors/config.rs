// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

/// Problems found by static validation of a set of blueprints
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Blueprints instantiate each other in a loop
    RecursiveDefinition {
        /// Blueprint ids along the loop, first id repeated at the end
        cycle: Vec<String>,
    },
    /// An instance names an operator id the registry does not know
    UnknownOperator {
        blueprint: String,
        instance: String,
        operator: String,
    },
    /// A connection reference does not parse or has the wrong role
    InvalidReference {
        blueprint: String,
        reference: String,
        reason: String,
    },
    /// A connection reference names an instance the blueprint does not declare
    UnknownInstance {
        blueprint: String,
        reference: String,
        instance: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::RecursiveDefinition { cycle } => {
                write!(f, "Recursive blueprint definition: {}", cycle.join(" -> "))
            }
            ValidationError::UnknownOperator {
                blueprint,
                instance,
                operator,
            } => {
                write!(
                    f,
                    "Instance '{}' in blueprint '{}' uses unknown operator '{}'",
                    instance, blueprint, operator
                )
            }
            ValidationError::InvalidReference {
                blueprint,
                reference,
                reason,
            } => {
                write!(
                    f,
                    "Invalid port reference '{}' in blueprint '{}': {}",
                    reference, blueprint, reason
                )
            }
            ValidationError::UnknownInstance {
                blueprint,
                reference,
                instance,
            } => {
                write!(
                    f,
                    "Port reference '{}' in blueprint '{}' names unknown instance '{}'",
                    reference, blueprint, instance
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}
