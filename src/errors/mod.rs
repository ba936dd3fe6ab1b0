// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod build;
mod config;
mod port;

pub use build::BuildError;
pub use config::ValidationError;
pub use port::PortError;
