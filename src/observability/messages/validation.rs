// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for static blueprint validation.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Blueprints instantiate each other in a loop.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use portflow::observability::messages::validation::RecursiveDefinitionDetected;
///
/// let cycle = vec!["a", "b", "a"];
/// let msg = RecursiveDefinitionDetected { cycle: &cycle };
///
/// assert_eq!(msg.to_string(), "Recursive blueprint definition: a -> b -> a");
/// ```
pub struct RecursiveDefinitionDetected<'a> {
    pub cycle: &'a [&'a str],
}

impl Display for RecursiveDefinitionDetected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Recursive blueprint definition: {}", self.cycle.join(" -> "))
    }
}

impl StructuredLog for RecursiveDefinitionDetected<'_> {
    fn log(&self) {
        tracing::error!(
            cycle = self.cycle.join(" -> "),
            cycle_length = self.cycle.len(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::ERROR,
            "recursive_definition",
            name = name,
            cycle = self.cycle.join(" -> "),
        )
    }
}

/// Validation of a blueprint set finished.
///
/// # Log Level
/// `info!` on success, `warn!` when problems were found
pub struct ValidationCompleted {
    pub blueprints: usize,
    pub problems: usize,
}

impl Display for ValidationCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Validated {} blueprints: {} problems",
            self.blueprints, self.problems
        )
    }
}

impl StructuredLog for ValidationCompleted {
    fn log(&self) {
        if self.problems == 0 {
            tracing::info!(blueprints = self.blueprints, "{}", self);
        } else {
            tracing::warn!(
                blueprints = self.blueprints,
                problems = self.problems,
                "{}", self
            );
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("validation", span_name = name, blueprints = self.blueprints)
    }
}
