// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 connlayout contributors

//! Field kind tags.

use std::collections::VecDeque;
use std::io::Cursor;

/// What kind of sub-object lives at a field offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Positioned reader over bytes (e.g. `Cursor<Vec<u8>>`).
    ByteReader,
    /// Growable or owned byte buffer (e.g. `Vec<u8>`).
    ByteBuffer,
    Primitive(PrimitiveKind),
    /// Anything without a more specific tag.
    Opaque,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    U8,
    U16,
    U32,
    U64,
    Usize,
    I8,
    I16,
    I32,
    I64,
    Isize,
    F32,
    F64,
    Bool,
}

impl PrimitiveKind {
    pub const fn tag(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::Usize => "usize",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::Isize => "isize",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Bool => "bool",
        }
    }
}

impl FieldKind {
    /// Stable textual tag, e.g. `"byte-reader"`.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::ByteReader => "byte-reader",
            Self::ByteBuffer => "byte-buffer",
            Self::Primitive(p) => p.tag(),
            Self::Opaque => "opaque",
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Types that may be described as a wrapper field.
///
/// Implement it for your own sub-object types; the default kind is
/// [`FieldKind::Opaque`].
///
/// ```rust
/// use connlayout::{FieldKind, FieldType};
///
/// struct SealedReader;
///
/// impl FieldType for SealedReader {
///     const KIND: FieldKind = FieldKind::ByteReader;
/// }
/// ```
pub trait FieldType: 'static {
    const KIND: FieldKind = FieldKind::Opaque;
}

macro_rules! impl_field_type {
    ($kind:expr => $($ty:ty),+ $(,)?) => {
        $(
            impl FieldType for $ty {
                const KIND: FieldKind = $kind;
            }
        )+
    };
}

impl_field_type!(FieldKind::ByteReader => Cursor<Vec<u8>>, Cursor<Box<[u8]>>, Cursor<&'static [u8]>);
impl_field_type!(FieldKind::ByteBuffer => Vec<u8>, VecDeque<u8>, Box<[u8]>);

impl_field_type!(FieldKind::Primitive(PrimitiveKind::U8) => u8);
impl_field_type!(FieldKind::Primitive(PrimitiveKind::U16) => u16);
impl_field_type!(FieldKind::Primitive(PrimitiveKind::U32) => u32);
impl_field_type!(FieldKind::Primitive(PrimitiveKind::U64) => u64);
impl_field_type!(FieldKind::Primitive(PrimitiveKind::Usize) => usize);
impl_field_type!(FieldKind::Primitive(PrimitiveKind::I8) => i8);
impl_field_type!(FieldKind::Primitive(PrimitiveKind::I16) => i16);
impl_field_type!(FieldKind::Primitive(PrimitiveKind::I32) => i32);
impl_field_type!(FieldKind::Primitive(PrimitiveKind::I64) => i64);
impl_field_type!(FieldKind::Primitive(PrimitiveKind::Isize) => isize);
impl_field_type!(FieldKind::Primitive(PrimitiveKind::F32) => f32);
impl_field_type!(FieldKind::Primitive(PrimitiveKind::F64) => f64);
impl_field_type!(FieldKind::Primitive(PrimitiveKind::Bool) => bool);

impl FieldType for String {}
