// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 connlayout contributors

//! Type descriptor for runtime field layout metadata.
//!
//! Defines `TypeDescriptor` and `FieldLayout` for describing connection
//! wrapper types at runtime, and the `Layout` trait that produces them.

use super::kind::{FieldKind, FieldType};
use std::any::{type_name, TypeId};
use std::mem::{align_of, size_of};

/// Layout of a single field inside one wrapper type.
///
/// `offset_bytes` is measured from the start of the concrete wrapper
/// instance, never from an embedding wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    pub name: &'static str,
    pub offset_bytes: usize,
    pub kind: FieldKind,
    pub size_bytes: usize,
    pub alignment: usize,
    /// `TypeId` of the field type.
    pub field_type: TypeId,
    /// Rust type name of the field type (diagnostics only).
    pub field_type_name: &'static str,
    /// `TypeId` of the wrapper type that owns the field.
    pub owner: TypeId,
}

impl FieldLayout {
    /// Describe field `name` of type `F` at `offset_bytes` inside `W`.
    pub fn of<W: 'static, F: FieldType>(name: &'static str, offset_bytes: usize) -> Self {
        Self {
            name,
            offset_bytes,
            kind: F::KIND,
            size_bytes: size_of::<F>(),
            alignment: align_of::<F>(),
            field_type: TypeId::of::<F>(),
            field_type_name: type_name::<F>(),
            owner: TypeId::of::<W>(),
        }
    }

    /// First byte past the field.
    pub const fn end_bytes(&self) -> usize {
        self.offset_bytes.saturating_add(self.size_bytes)
    }
}

/// Type descriptor: layout metadata for one wrapper type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub type_name: &'static str, // e.g., "CommonConn"
    pub type_id: TypeId,
    pub size_bytes: usize,
    pub alignment: usize,
    pub fields: Vec<FieldLayout>,
}

impl TypeDescriptor {
    /// Descriptor for wrapper `W` with the given fields.
    pub fn of<W: 'static>(type_name: &'static str, fields: Vec<FieldLayout>) -> Self {
        Self {
            type_name,
            type_id: TypeId::of::<W>(),
            size_bytes: size_of::<W>(),
            alignment: align_of::<W>(),
            fields,
        }
    }

    /// Find a field by its registry name.
    pub fn field(&self, name: &str) -> Option<&FieldLayout> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }
}

/// Connection wrapper types whose field layout can be introspected.
///
/// Normally implemented with `#[derive(Layout)]`.
///
/// # Safety
///
/// `describe()` must report the true layout of `Self`: every `FieldLayout`
/// must be built with `FieldLayout::of::<Self, F>` where `F` is the declared
/// type of the field living at `offset_bytes` inside `Self`. Typed accessors
/// reinterpret `base + offset_bytes` as `F` on the strength of this contract.
///
/// Every field must also be aligned for `F` wherever a `Self` lives: the
/// field alignment may not exceed `align_of::<Self>()` and `offset_bytes`
/// must be a multiple of it. Packed representations break this and are not
/// supported. The registry re-checks alignment and bounds on every
/// registration, whether or not full verification is enabled.
///
/// The derive satisfies the contract by taking offsets from
/// `core::mem::offset_of!` and refusing `#[repr(packed)]`:
///
/// ```compile_fail
/// use connlayout::Layout;
///
/// #[derive(Layout)]
/// #[repr(C, packed)]
/// struct PackedConn {
///     flag: u8,
///     sequence: u64,
/// }
/// ```
pub unsafe trait Layout: Sized + 'static {
    /// Registry type name.
    const TYPE_NAME: &'static str;

    /// One-time introspection. Not meant for hot paths: allocates.
    fn describe() -> TypeDescriptor;
}
