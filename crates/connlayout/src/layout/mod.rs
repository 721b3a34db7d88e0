// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 connlayout contributors

//! Layout metadata for connection wrapper types.
//!
//! Provides `TypeDescriptor` and `FieldLayout` for describing where named
//! sub-objects live inside a wrapper, and `FieldKind` for tagging what lives
//! there. Descriptors are produced once per type by `Layout::describe()`.

pub mod descriptor;
pub mod kind;

pub use descriptor::{FieldLayout, Layout, TypeDescriptor};
pub use kind::{FieldKind, FieldType, PrimitiveKind};
