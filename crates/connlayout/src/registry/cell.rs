// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 connlayout contributors

//! One-time publication of a sealed registry.
//!
//! `RegistryCell` is the synchronization point between the startup thread
//! that populates the registry and the connection handlers that read it.
//! Publication goes through `OnceLock`, so every reader that observes the
//! registry observes all of it.

use super::LayoutRegistry;
use crate::error::{Error, Result};
use std::sync::OnceLock;

static GLOBAL: RegistryCell = RegistryCell::new();

/// Lifecycle state of a registry cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryState {
    /// Nothing published; lookups are not permitted.
    Uninitialized,
    /// A sealed registry is published and readable from any thread.
    Ready,
}

/// Write-once slot holding a sealed [`LayoutRegistry`].
pub struct RegistryCell {
    inner: OnceLock<LayoutRegistry>,
}

impl RegistryCell {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: OnceLock::new(),
        }
    }

    /// Publish `registry`. Fails with `Error::AlreadyPublished` if the cell
    /// is already `Ready`; the published registry is never replaced.
    pub fn publish(&self, registry: LayoutRegistry) -> Result<&LayoutRegistry> {
        let types = registry.len();
        self.inner
            .set(registry)
            .map_err(|_| Error::AlreadyPublished)?;
        log::info!("[registry] published layout registry ({} types)", types);
        self.get()
    }

    /// Published registry, or `Error::NotReady`.
    #[inline]
    pub fn get(&self) -> Result<&LayoutRegistry> {
        self.inner.get().ok_or(Error::NotReady)
    }

    /// Return the published registry, building and publishing it first if
    /// needed. If two threads race, one registry wins and the other is
    /// dropped; both observe the winner. A failed build is reported only
    /// while the cell is still empty.
    pub fn get_or_publish<F>(&self, build: F) -> Result<&LayoutRegistry>
    where
        F: FnOnce() -> Result<LayoutRegistry>,
    {
        if let Some(registry) = self.inner.get() {
            return Ok(registry);
        }

        let registry = match build() {
            Ok(registry) => registry,
            // Another thread may have published while this build ran.
            Err(err) => {
                return match self.inner.get() {
                    Some(registry) => {
                        log::warn!(
                            "[registry] build failed after publication, keeping the published registry: {}",
                            err
                        );
                        Ok(registry)
                    }
                    None => Err(err),
                }
            }
        };
        if self.inner.set(registry).is_err() {
            log::warn!("[registry] concurrent publication, keeping the first registry");
        }
        self.get()
    }

    pub fn state(&self) -> RegistryState {
        if self.inner.get().is_some() {
            RegistryState::Ready
        } else {
            RegistryState::Uninitialized
        }
    }
}

impl Default for RegistryCell {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RegistryCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryCell")
            .field("state", &self.state())
            .finish()
    }
}

/// Publish the process-wide registry. Call once at startup, before
/// accepting connections.
pub fn install(registry: LayoutRegistry) -> Result<&'static LayoutRegistry> {
    GLOBAL.publish(registry)
}

/// Process-wide registry, or `Error::NotReady` before [`install`].
#[inline]
pub fn global() -> Result<&'static LayoutRegistry> {
    GLOBAL.get()
}

pub fn global_state() -> RegistryState {
    GLOBAL.state()
}
