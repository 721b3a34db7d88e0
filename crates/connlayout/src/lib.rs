// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 connlayout contributors

//! # connlayout - type-layout cache for connection wrappers
//!
//! Resolves the byte offsets of named sub-objects inside connection wrapper
//! types exactly once, then serves every hot-path access through the cached
//! offset instead of repeating the introspection.
//!
//! ## Quick Start
//!
//! ```rust
//! use connlayout::{Layout, RegistryBuilder, Result};
//! use std::io::Cursor;
//!
//! #[derive(Layout, Default)]
//! struct CommonConn {
//!     input: Cursor<Vec<u8>>,
//!     #[layout(rename = "rawInput")]
//!     raw_input: Vec<u8>,
//! }
//!
//! fn main() -> Result<()> {
//!     // Startup: populate, then seal (read-only from here on)
//!     let mut builder = RegistryBuilder::new();
//!     builder.register::<CommonConn>(&["input", "rawInput"])?;
//!     let registry = builder.seal()?;
//!
//!     // Resolve a typed token once...
//!     let raw_input = registry.token::<CommonConn, Vec<u8>>("rawInput")?;
//!
//!     // ...and use it per connection without any lookup.
//!     let mut conn = CommonConn::default();
//!     raw_input.get_mut(&mut conn).extend_from_slice(b"hello");
//!     assert_eq!(conn.raw_input, b"hello");
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +----------------------------------------------------------------+
//! |  #[derive(Layout)]  ->  Layout::describe() (offset_of! based)   |
//! +----------------------------------------------------------------+
//! |  RegistryBuilder (Uninitialized)  --seal()-->  LayoutRegistry  |
//! |  register::<W>(fields)                         (Ready, Sync)   |
//! +----------------------------------------------------------------+
//! |  RegistryCell / install() / global()   (one-time publication)  |
//! +----------------------------------------------------------------+
//! |  FieldToken<W, F>::get / get_mut      (hot path, no lookups)   |
//! +----------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`RegistryBuilder`] | Population phase, one registration per wrapper type |
//! | [`LayoutRegistry`] | Sealed, read-only layout table |
//! | [`FieldToken`] | Typed accessor bound to a wrapper and field type |
//! | [`RegistryCell`] | One-time publication point for a sealed registry |
//! | [`RegistryConfig`] | Verification switch and required field set |

// Allow the derive macro to work inside this crate's tests
extern crate self as connlayout;

/// Typed field access through cached offsets.
pub mod accessor;
/// Registry configuration (constants, environment, YAML loader).
pub mod config;
/// Error type shared by all operations.
pub mod error;
/// Layout descriptors and field kinds.
pub mod layout;
/// Crate-provided backend for the `log` facade.
#[cfg(feature = "logging")]
pub mod logging;
/// Layout registry: population, sealing and publication.
pub mod registry;

pub use accessor::FieldToken;
pub use config::RegistryConfig;
pub use error::{Error, Result};
pub use layout::{FieldKind, FieldLayout, FieldType, Layout, PrimitiveKind, TypeDescriptor};
pub use registry::{
    global, global_state, install, LayoutRegistry, LookupStats, RegistryBuilder, RegistryCell,
    RegistryState,
};

// Derive macro (for #[derive(connlayout::Layout)])
pub use connlayout_codegen::Layout;

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
