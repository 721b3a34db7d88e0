// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 connlayout contributors

//! Layout registry for connection wrapper types.
//!
//! The registry ensures that layout introspection happens only once per
//! wrapper type. It has two states:
//!
//! ```text
//! RegistryBuilder (Uninitialized)  --seal()-->  LayoutRegistry (Ready)
//!   register::<W>(fields)                        lookup / token
//!   &mut self, single thread                     &self, any thread, no locks
//! ```
//!
//! There is no way back from `LayoutRegistry` to a builder, and no lookup
//! API on the builder, so a partially populated table is never observable.
//! [`RegistryCell`] publishes a sealed registry to other threads.

mod cell;

pub use cell::{global, global_state, install, RegistryCell, RegistryState};

use crate::accessor::FieldToken;
use crate::config::{RegistryConfig, MAX_TYPE_CAPACITY};
use crate::error::{Error, Result};
use crate::layout::{FieldLayout, Layout, TypeDescriptor};
use std::any::TypeId;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem::{align_of, size_of};
use std::sync::atomic::{AtomicU64, Ordering};

/// Composite `(type name, field name)` key.
type FieldKey = (&'static str, &'static str);

/// Borrowed view of a [`FieldKey`], so probes need neither `'static`
/// strings nor an allocation.
trait FieldKeyRef {
    fn parts(&self) -> (&str, &str);
}

impl FieldKeyRef for (&str, &str) {
    fn parts(&self) -> (&str, &str) {
        (self.0, self.1)
    }
}

impl<'a> Borrow<dyn FieldKeyRef + 'a> for FieldKey {
    fn borrow(&self) -> &(dyn FieldKeyRef + 'a) {
        self
    }
}

// Must hash exactly like the tuple key.
impl Hash for dyn FieldKeyRef + '_ {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.parts().hash(state);
    }
}

impl PartialEq for dyn FieldKeyRef + '_ {
    fn eq(&self, other: &Self) -> bool {
        self.parts() == other.parts()
    }
}

impl Eq for dyn FieldKeyRef + '_ {}

fn field_entry<'m>(
    fields: &'m HashMap<FieldKey, FieldLayout>,
    type_name: &str,
    field_name: &str,
) -> Option<&'m FieldLayout> {
    fields.get(&(type_name, field_name) as &dyn FieldKeyRef)
}

/// Registry counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LookupStats {
    pub misses: u64,
    pub tokens_issued: u64,
}

/// Population phase of the layout registry.
pub struct RegistryBuilder {
    config: RegistryConfig,
    types: HashMap<&'static str, TypeDescriptor>,
    type_ids: HashMap<TypeId, &'static str>,
    fields: HashMap<FieldKey, FieldLayout>,
}

impl RegistryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        // Pre-size hint only; never let it abort the process.
        let capacity = config.type_capacity.min(MAX_TYPE_CAPACITY);
        Self {
            config,
            types: HashMap::with_capacity(capacity),
            type_ids: HashMap::with_capacity(capacity),
            fields: HashMap::with_capacity(capacity.saturating_mul(4)),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Resolve and record the offsets of `field_names` inside `W`.
    ///
    /// Every name must exist on `W` (`Error::UnknownField` otherwise).
    /// Registering the same type again is idempotent; new names are added,
    /// already recorded entries never change.
    pub fn register<W: Layout>(&mut self, field_names: &[&str]) -> Result<&mut Self> {
        let descriptor = self.introspect::<W>()?;

        let mut selected: Vec<FieldLayout> = Vec::with_capacity(field_names.len());
        for &name in field_names {
            let Some(field) = descriptor.field(name) else {
                return Err(Error::UnknownField {
                    type_name: descriptor.type_name,
                    field: name.to_string(),
                });
            };
            if !selected.iter().any(|f| f.name == field.name) {
                selected.push(*field);
            }
        }

        self.insert(descriptor, selected);
        Ok(self)
    }

    /// Register every field `W` describes.
    pub fn register_all<W: Layout>(&mut self) -> Result<&mut Self> {
        let descriptor = self.introspect::<W>()?;
        let selected = descriptor.fields.clone();
        self.insert(descriptor, selected);
        Ok(self)
    }

    /// Finish population and return the read-only registry.
    ///
    /// Fails with `Error::MissingRequired` if a type/field pair listed in
    /// the configuration was never registered.
    pub fn seal(self) -> Result<LayoutRegistry> {
        for (type_name, fields) in &self.config.required {
            for field in fields {
                if field_entry(&self.fields, type_name, field).is_none() {
                    return Err(Error::MissingRequired {
                        type_name: type_name.clone(),
                        field: field.clone(),
                    });
                }
            }
        }

        log::info!(
            "[registry] sealed layout registry: {} types, {} fields",
            self.types.len(),
            self.fields.len()
        );

        Ok(LayoutRegistry {
            types: self.types,
            type_ids: self.type_ids,
            fields: self.fields,
            misses: AtomicU64::new(0),
            tokens_issued: AtomicU64::new(0),
        })
    }

    /// Run `W::describe()` once and check it against `W` itself.
    fn introspect<W: Layout>(&self) -> Result<TypeDescriptor> {
        let descriptor = W::describe();
        let type_name = descriptor.type_name;

        if let Some(existing) = self.types.get(type_name) {
            if existing.type_id != TypeId::of::<W>() {
                return Err(Error::TypeNameConflict { type_name });
            }
        }

        // Placement is checked unconditionally: tokens hand out references
        // at these offsets.
        check_placement::<W>(&descriptor)?;
        if self.config.verify_layouts {
            verify::<W>(&descriptor)?;
        }

        Ok(descriptor)
    }

    fn insert(&mut self, descriptor: TypeDescriptor, selected: Vec<FieldLayout>) {
        let type_name = descriptor.type_name;
        let entry = self.types.entry(type_name).or_insert_with(|| TypeDescriptor {
            fields: Vec::new(),
            ..descriptor
        });
        self.type_ids.insert(entry.type_id, type_name);

        let mut added = 0usize;
        for field in selected {
            let key = (type_name, field.name);
            if let Some(existing) = self.fields.get(&key) {
                debug_assert_eq!(*existing, field, "layout changed within one process");
                continue;
            }
            self.fields.insert(key, field);
            entry.fields.push(field);
            added += 1;
        }

        log::debug!(
            "[registry] registered `{}` ({} bytes): {} new fields, {} total",
            type_name,
            entry.size_bytes,
            added,
            entry.fields.len()
        );
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryBuilder")
            .field("types", &self.types.len())
            .field("fields", &self.fields.len())
            .field("config", &self.config)
            .finish()
    }
}

/// Every field must lie inside `W` and be aligned wherever a `W` lives.
fn check_placement<W: Layout>(descriptor: &TypeDescriptor) -> Result<()> {
    for field in &descriptor.fields {
        if let Some(reason) = placement_error(
            field.offset_bytes,
            field.size_bytes,
            field.alignment,
            size_of::<W>(),
            align_of::<W>(),
        ) {
            return Err(Error::InvalidLayout {
                type_name: descriptor.type_name,
                field: field.name,
                reason,
            });
        }
    }
    Ok(())
}

fn placement_error(
    offset: usize,
    size: usize,
    alignment: usize,
    wrapper_size: usize,
    wrapper_alignment: usize,
) -> Option<&'static str> {
    if !alignment.is_power_of_two() {
        Some("field alignment is not a power of two")
    } else if alignment > wrapper_alignment {
        Some("field is more aligned than the type (packed layout?)")
    } else if offset % alignment != 0 {
        Some("field offset is misaligned")
    } else if offset.saturating_add(size) > wrapper_size {
        Some("field extends past the end of the type")
    } else {
        None
    }
}

/// One-time consistency check of a descriptor against the real type.
fn verify<W: Layout>(descriptor: &TypeDescriptor) -> Result<()> {
    let type_name = descriptor.type_name;
    let invalid = |field: &'static str, reason: &'static str| Error::InvalidLayout {
        type_name,
        field,
        reason,
    };

    if descriptor.type_id != TypeId::of::<W>() {
        return Err(invalid("", "descriptor describes a different type"));
    }
    if descriptor.size_bytes != size_of::<W>() || descriptor.alignment != align_of::<W>() {
        return Err(invalid("", "descriptor size or alignment differs from the type"));
    }

    for field in &descriptor.fields {
        if field.owner != TypeId::of::<W>() {
            return Err(invalid(field.name, "field belongs to a different type"));
        }
    }

    Ok(())
}

/// Sealed, read-only layout table.
///
/// Safe for unlimited concurrent readers; nothing here takes a lock.
pub struct LayoutRegistry {
    types: HashMap<&'static str, TypeDescriptor>,
    type_ids: HashMap<TypeId, &'static str>,
    fields: HashMap<FieldKey, FieldLayout>,
    misses: AtomicU64,
    tokens_issued: AtomicU64,
}

impl LayoutRegistry {
    /// Cached layout of `type_name.field_name`, or `None` if never registered.
    #[inline]
    pub fn lookup(&self, type_name: &str, field_name: &str) -> Option<&FieldLayout> {
        let hit = field_entry(&self.fields, type_name, field_name);
        if hit.is_none() {
            self.misses.fetch_add(1, Ordering::Relaxed);
            log::debug!("[registry] lookup miss: {}.{}", type_name, field_name);
        }
        hit
    }

    /// Issue a typed accessor for field `field_name` of `W`.
    ///
    /// Checks happen here, once; the returned token performs none.
    pub fn token<W: Layout, F: 'static>(&self, field_name: &str) -> Result<FieldToken<W, F>> {
        let Some(&type_name) = self.type_ids.get(&TypeId::of::<W>()) else {
            return Err(Error::NotRegistered(W::TYPE_NAME));
        };

        let Some(layout) = field_entry(&self.fields, type_name, field_name)
            .filter(|layout| layout.owner == TypeId::of::<W>())
        else {
            return Err(Error::FieldNotRegistered {
                type_name,
                field: field_name.to_string(),
            });
        };

        if layout.field_type != TypeId::of::<F>() {
            return Err(Error::FieldTypeMismatch {
                type_name,
                field: layout.name,
                expected: layout.field_type_name,
                found: std::any::type_name::<F>(),
            });
        }

        // Re-check against `F` itself; descriptor metadata is plain data.
        if let Some(reason) = placement_error(
            layout.offset_bytes,
            size_of::<F>(),
            align_of::<F>(),
            size_of::<W>(),
            align_of::<W>(),
        ) {
            return Err(Error::InvalidLayout {
                type_name,
                field: layout.name,
                reason,
            });
        }

        self.tokens_issued.fetch_add(1, Ordering::Relaxed);
        log::debug!(
            "[registry] token issued: {}.{} @ {}",
            type_name,
            layout.name,
            layout.offset_bytes
        );

        // SAFETY: the layout came from `W::describe()` (owner TypeId is `W`,
        // checked via `type_ids` at registration), its field TypeId is `F`,
        // and an `F` at this offset is in bounds and aligned in every `W`.
        Ok(unsafe { FieldToken::from_layout(layout) })
    }

    pub fn descriptor(&self, type_name: &str) -> Option<&TypeDescriptor> {
        self.types.get(type_name)
    }

    pub fn descriptor_of<W: Layout>(&self) -> Option<&TypeDescriptor> {
        let type_name = self.type_ids.get(&TypeId::of::<W>())?;
        self.types.get(type_name)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.types.keys().copied()
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Number of registered fields across all types.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn stats(&self) -> LookupStats {
        LookupStats {
            misses: self.misses.load(Ordering::Relaxed),
            tokens_issued: self.tokens_issued.load(Ordering::Relaxed),
        }
    }
}

impl fmt::Debug for LayoutRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutRegistry")
            .field("types", &self.types.len())
            .field("fields", &self.fields.len())
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests;
