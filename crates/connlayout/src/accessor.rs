// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 connlayout contributors

//! Field access through cached offsets.
//!
//! [`FieldToken`] is the safe entry point: it can only be issued by a sealed
//! [`LayoutRegistry`](crate::LayoutRegistry) after the wrapper and field
//! types were checked, and it is bound to both types at compile time, so an
//! offset can never be applied to the wrong wrapper.
//!
//! [`access`] / [`access_mut`] are the raw primitives underneath. They are
//! `unsafe` and exist for callers that hold a bare [`FieldLayout`].

use crate::layout::{FieldKind, FieldLayout, Layout};
use std::any::TypeId;
use std::fmt;
use std::marker::PhantomData;
use std::ptr;

/// Reconstruct `&F` from a wrapper reference and a cached field layout.
///
/// No lookup and no type check happen here in release builds.
///
/// # Safety
///
/// `layout` must have been produced by `W::describe()` for a field whose
/// declared type is exactly `F`. Debug builds assert the `TypeId`s.
#[inline]
pub unsafe fn access<'a, W: 'static, F: 'static>(instance: &'a W, layout: &FieldLayout) -> &'a F {
    debug_assert_eq!(layout.owner, TypeId::of::<W>(), "layout owner mismatch");
    debug_assert_eq!(layout.field_type, TypeId::of::<F>(), "field type mismatch");

    let base = ptr::from_ref(instance).cast::<u8>();
    // SAFETY: caller guarantees an `F` lives at `offset_bytes` inside `W`;
    // the resulting pointer stays within `instance` and borrows it for 'a.
    unsafe { &*base.add(layout.offset_bytes).cast::<F>() }
}

/// Mutable counterpart of [`access`].
///
/// # Safety
///
/// Same contract as [`access`].
#[inline]
pub unsafe fn access_mut<'a, W: 'static, F: 'static>(
    instance: &'a mut W,
    layout: &FieldLayout,
) -> &'a mut F {
    debug_assert_eq!(layout.owner, TypeId::of::<W>(), "layout owner mismatch");
    debug_assert_eq!(layout.field_type, TypeId::of::<F>(), "field type mismatch");

    let base = ptr::from_mut(instance).cast::<u8>();
    // SAFETY: see `access`; exclusivity is inherited from `&'a mut W`.
    unsafe { &mut *base.add(layout.offset_bytes).cast::<F>() }
}

/// Typed, pre-validated accessor for one field of wrapper `W`.
///
/// Issued by [`LayoutRegistry::token`](crate::LayoutRegistry::token).
/// `Copy`, `Send` and `Sync`: resolve once at startup, share with every
/// connection handler.
pub struct FieldToken<W, F> {
    offset: usize,
    name: &'static str,
    kind: FieldKind,
    _marker: PhantomData<fn(&W) -> &F>,
}

impl<W: Layout, F: 'static> FieldToken<W, F> {
    /// # Safety
    ///
    /// `layout` must describe a field of type `F` inside `W`
    /// (owner and field `TypeId`s already checked by the caller).
    pub(crate) unsafe fn from_layout(layout: &FieldLayout) -> Self {
        debug_assert_eq!(layout.owner, TypeId::of::<W>());
        debug_assert_eq!(layout.field_type, TypeId::of::<F>());
        Self {
            offset: layout.offset_bytes,
            name: layout.name,
            kind: layout.kind,
            _marker: PhantomData,
        }
    }

    /// Borrow the field inside `instance`.
    #[inline]
    pub fn get<'a>(&self, instance: &'a W) -> &'a F {
        let base = ptr::from_ref(instance).cast::<u8>();
        // SAFETY: tokens are only built from layouts verified to place an `F`
        // at `offset` inside `W` (see `from_layout`).
        unsafe { &*base.add(self.offset).cast::<F>() }
    }

    /// Mutably borrow the field inside `instance`.
    #[inline]
    pub fn get_mut<'a>(&self, instance: &'a mut W) -> &'a mut F {
        let base = ptr::from_mut(instance).cast::<u8>();
        // SAFETY: as in `get`; `&'a mut W` makes the field borrow exclusive.
        unsafe { &mut *base.add(self.offset).cast::<F>() }
    }

    /// Compute the field address from a raw wrapper address.
    ///
    /// Never dereferences. The result is only meaningful while `base`
    /// points at a live `W`.
    #[inline]
    pub fn project(&self, base: *const W) -> *const F {
        base.cast::<u8>().wrapping_add(self.offset).cast::<F>()
    }

    pub const fn offset(&self) -> usize {
        self.offset
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub const fn kind(&self) -> FieldKind {
        self.kind
    }
}

impl<W, F> Clone for FieldToken<W, F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<W, F> Copy for FieldToken<W, F> {}

impl<W: Layout, F> fmt::Debug for FieldToken<W, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldToken")
            .field("type", &W::TYPE_NAME)
            .field("field", &self.name)
            .field("offset", &self.offset)
            .field("kind", &self.kind)
            .finish()
    }
}
