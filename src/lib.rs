// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod builtins;   // operators implemented in Rust
pub mod config;     // definitions, registry, validation
pub mod engine;     // ports, networks, compiler, runtime
pub mod errors;     // error handling
pub mod observability;
pub mod traits;     // builtin abstraction
pub mod types;      // structural port types
