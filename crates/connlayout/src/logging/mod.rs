// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 connlayout contributors

//! Optional backend for the `log` facade.
//!
//! The crate itself always logs through `log::debug!` / `log::info!` /
//! `log::warn!`. Applications that already run a `log` backend need nothing
//! from this module; the others can install one of the outputs here:
//!
//! ```ignore
//! use connlayout::logging::{init_logger, ConsoleOutput, LogLevel};
//! use std::sync::Arc;
//!
//! // Initialize early in main(), before building the registry
//! init_logger(Arc::new(ConsoleOutput::new(LogLevel::Debug)), LogLevel::Debug);
//! ```
//!
//! Enabled by the `logging` Cargo feature.

pub mod logger;
mod output;

pub use logger::{flush_logger, init_logger};
pub use output::{ConsoleOutput, LogLevel, MemoryOutput, Output};
