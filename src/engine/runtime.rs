// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::network::{Network, OperatorId, OperatorKind};
use super::operator::{Operator, Service};
use crate::config::consts::WORKER_THREAD_PREFIX;
use crate::errors::{BuildError, PortError};
use crate::observability::messages::runtime::{
    NetworkStarted, NetworkStopped, WorkerFailed, WorkerPanicked, WorkerStarted, WorkerStopped,
};
use crate::observability::messages::StructuredLog;
use crate::traits::Builtin;
use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// A running network: one worker thread per builtin under the root.
///
/// Dropping a runtime raises the stop signal without waiting for workers;
/// call [`Runtime::stop`] to join them and collect failures.
pub struct Runtime {
    network: Arc<Network>,
    root: OperatorId,
    workers: Vec<Worker>,
    started: Instant,
}

struct Worker {
    operator: String,
    handle: JoinHandle<Result<(), PortError>>,
}

/// A worker that ended other than by the stop signal.
#[derive(Debug)]
pub enum WorkerFailure {
    Failed { operator: String, error: PortError },
    Panicked { operator: String, message: String },
}

impl WorkerFailure {
    pub fn operator(&self) -> &str {
        match self {
            WorkerFailure::Failed { operator, .. } | WorkerFailure::Panicked { operator, .. } => {
                operator
            }
        }
    }
}

impl fmt::Display for WorkerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerFailure::Failed { operator, error } => write!(f, "'{operator}' failed: {error}"),
            WorkerFailure::Panicked { operator, message } => {
                write!(f, "'{operator}' panicked: {message}")
            }
        }
    }
}

impl Runtime {
    /// Checks that `root` is compiled and spawns its workers.
    pub fn start(network: Network, root: OperatorId) -> Result<Self, BuildError> {
        network.check_compiled(root)?;
        let network = Arc::new(network);
        let mut runtime = Runtime {
            network: Arc::clone(&network),
            root,
            workers: Vec::new(),
            started: Instant::now(),
        };

        for leaf in network.leaves(root) {
            let OperatorKind::Leaf(builtin) = &network.operators[leaf.0].kind else {
                continue;
            };
            let builtin = Arc::clone(builtin);
            let operator = network.operator_path(leaf);
            let shared = Arc::clone(&network);
            let spawned = thread::Builder::new()
                .name(format!("{WORKER_THREAD_PREFIX}{operator}"))
                .spawn(move || run_worker(&shared, leaf, builtin.as_ref()));

            match spawned {
                Ok(handle) => runtime.workers.push(Worker { operator, handle }),
                Err(source) => {
                    runtime.shutdown();
                    return Err(BuildError::WorkerSpawn { operator, source });
                }
            }
        }

        NetworkStarted {
            root: &network.operator_path(root),
            workers: runtime.workers.len(),
        }
        .log();
        Ok(runtime)
    }

    pub fn network(&self) -> &Arc<Network> {
        &self.network
    }

    pub fn root(&self) -> Operator<'_> {
        self.network.operator(self.root)
    }

    /// The root's `main` service, where external input goes in and results
    /// come out.
    pub fn main(&self) -> Service<'_> {
        self.root().main()
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Raises the stop signal, joins every worker and returns those that
    /// failed or panicked.
    pub fn stop(mut self) -> Vec<WorkerFailure> {
        let failures = self.shutdown();
        NetworkStopped {
            root: &self.network.operator_path(self.root),
            failures: failures.len(),
            uptime: self.started.elapsed(),
        }
        .log();
        failures
    }

    fn shutdown(&mut self) -> Vec<WorkerFailure> {
        self.network.stop();
        let mut failures = Vec::new();
        for worker in self.workers.drain(..) {
            match worker.handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(error)) => failures.push(WorkerFailure::Failed {
                    operator: worker.operator,
                    error,
                }),
                Err(payload) => {
                    let message = payload
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| payload.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    WorkerPanicked {
                        operator: &worker.operator,
                        message: &message,
                    }
                    .log();
                    failures.push(WorkerFailure::Panicked {
                        operator: worker.operator,
                        message,
                    });
                }
            }
        }
        failures
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.network.stop();
    }
}

fn run_worker(network: &Network, id: OperatorId, builtin: &dyn Builtin) -> Result<(), PortError> {
    let op = network.operator(id);
    let path = op.path();
    let _span = WorkerStarted { operator: &path }.span("worker").entered();
    WorkerStarted { operator: &path }.log();

    match builtin.run(&op) {
        Ok(()) | Err(PortError::Stopped) => {
            WorkerStopped { operator: &path }.log();
            Ok(())
        }
        Err(error) => {
            WorkerFailed {
                operator: &path,
                error: &error,
            }
            .log();
            Err(error)
        }
    }
}
