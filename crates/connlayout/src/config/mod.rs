// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 connlayout contributors

//! Registry configuration.
//!
//! - **Static**: well-known wrapper/field names and environment variable names
//! - **Runtime**: `RegistryConfig` (verification switch, required field set)
//!
//! # Example
//!
//! ```rust
//! use connlayout::config::{self, RegistryConfig};
//!
//! let config = RegistryConfig::default()
//!     .require(config::COMMON_CONN_TYPE, [config::INPUT_FIELD, config::RAW_INPUT_FIELD]);
//! assert!(config.verify_layouts);
//! assert_eq!(config.required["CommonConn"], ["input", "rawInput"]);
//! ```

#[cfg(feature = "config-loaders")]
pub mod yaml;

use crate::error::Result;
use std::collections::BTreeMap;

// =======================================================================
// Well-known connection wrapper
// =======================================================================

/// Registry name of the common connection wrapper.
pub const COMMON_CONN_TYPE: &str = "CommonConn";

/// Decrypted-input reader inside the common connection wrapper.
pub const INPUT_FIELD: &str = "input";

/// Raw (still encrypted) input buffer inside the common connection wrapper.
pub const RAW_INPUT_FIELD: &str = "rawInput";

// =======================================================================
// Defaults and environment
// =======================================================================

/// Initial capacity of the registry tables, in wrapper types.
pub const DEFAULT_TYPE_CAPACITY: usize = 16;

/// Largest accepted `type_capacity`; larger hints are clamped by the builder
/// and rejected by the YAML loader.
pub const MAX_TYPE_CAPACITY: usize = 4096;

/// `0`, `false` or `off` disables one-time layout verification.
pub const ENV_VERIFY_LAYOUTS: &str = "CONNLAYOUT_VERIFY_LAYOUTS";

/// Path to a YAML registry configuration (feature `config-loaders`).
pub const ENV_CONFIG_PATH: &str = "CONNLAYOUT_CONFIG";

/// Runtime configuration for a [`RegistryBuilder`](crate::RegistryBuilder).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Check every descriptor against the real type at registration.
    pub verify_layouts: bool,
    /// Pre-size hint for the registry tables.
    pub type_capacity: usize,
    /// Type name -> field names that must be registered before `seal()`.
    pub required: BTreeMap<String, Vec<String>>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            verify_layouts: true,
            type_capacity: DEFAULT_TYPE_CAPACITY,
            required: BTreeMap::new(),
        }
    }
}

impl RegistryConfig {
    /// Defaults, overridden by `CONNLAYOUT_VERIFY_LAYOUTS` and, when the
    /// `config-loaders` feature is on, by the YAML file named in
    /// `CONNLAYOUT_CONFIG`.
    pub fn from_env() -> Result<Self> {
        #[cfg(feature = "config-loaders")]
        let mut config = match std::env::var(ENV_CONFIG_PATH) {
            Ok(path) if !path.is_empty() => yaml::YamlLoader::load(path)?,
            _ => Self::default(),
        };
        #[cfg(not(feature = "config-loaders"))]
        let mut config = Self::default();

        if let Ok(value) = std::env::var(ENV_VERIFY_LAYOUTS) {
            config.verify_layouts = parse_switch(&value).unwrap_or(config.verify_layouts);
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_verify_layouts(mut self, verify: bool) -> Self {
        self.verify_layouts = verify;
        self
    }

    #[must_use]
    pub fn with_type_capacity(mut self, capacity: usize) -> Self {
        self.type_capacity = capacity;
        self
    }

    /// Require `fields` of `type_name` to be registered before sealing.
    #[must_use]
    pub fn require<I, S>(mut self, type_name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self.required.entry(type_name.into()).or_default();
        for field in fields {
            let field = field.into();
            if !entry.contains(&field) {
                entry.push(field);
            }
        }
        self
    }
}

/// Parse an on/off switch value.
fn parse_switch(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RegistryConfig::default();
        assert!(config.verify_layouts);
        assert_eq!(config.type_capacity, DEFAULT_TYPE_CAPACITY);
        assert!(config.required.is_empty());
    }

    #[test]
    fn test_require_merges_and_dedups() {
        let config = RegistryConfig::default()
            .require(COMMON_CONN_TYPE, [INPUT_FIELD])
            .require(COMMON_CONN_TYPE, [INPUT_FIELD, RAW_INPUT_FIELD]);
        assert_eq!(config.required.len(), 1);
        assert_eq!(config.required[COMMON_CONN_TYPE], ["input", "rawInput"]);
    }

    #[test]
    fn test_parse_switch() {
        assert_eq!(parse_switch("0"), Some(false));
        assert_eq!(parse_switch(" OFF "), Some(false));
        assert_eq!(parse_switch("true"), Some(true));
        assert_eq!(parse_switch("maybe"), None);
    }
}
