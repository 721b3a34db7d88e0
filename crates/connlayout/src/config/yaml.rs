// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 connlayout contributors

//! YAML registry configuration loader.
//!
//! # Example YAML
//!
//! ```yaml
//! # connlayout.yaml
//! verify_layouts: true
//! type_capacity: 8
//! required:
//!   CommonConn: [input, rawInput]
//! ```

use super::{RegistryConfig, DEFAULT_TYPE_CAPACITY, MAX_TYPE_CAPACITY};
use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// YAML registry configuration loader.
pub struct YamlLoader;

/// Root YAML document structure.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct YamlRegistryDocument {
    #[serde(default = "default_verify_layouts")]
    pub verify_layouts: bool,

    #[serde(default = "default_type_capacity")]
    pub type_capacity: usize,

    /// Type name -> field names that must resolve before sealing.
    #[serde(default)]
    pub required: BTreeMap<String, Vec<String>>,
}

fn default_verify_layouts() -> bool {
    true
}

fn default_type_capacity() -> usize {
    DEFAULT_TYPE_CAPACITY
}

impl YamlLoader {
    /// Load a registry configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<RegistryConfig> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        log::debug!("[config] loading registry configuration from {}", path.display());
        Self::parse(&content)
    }

    /// Parse a registry configuration from YAML text.
    pub fn parse(content: &str) -> Result<RegistryConfig> {
        let doc: YamlRegistryDocument =
            serde_yaml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;

        if doc.type_capacity > MAX_TYPE_CAPACITY {
            return Err(Error::Config(format!(
                "type_capacity {} exceeds the maximum of {}",
                doc.type_capacity, MAX_TYPE_CAPACITY
            )));
        }

        let mut config = RegistryConfig::default()
            .with_verify_layouts(doc.verify_layouts)
            .with_type_capacity(doc.type_capacity);
        for (type_name, fields) in doc.required {
            if fields.is_empty() {
                return Err(Error::Config(format!(
                    "required type `{}` lists no fields",
                    type_name
                )));
            }
            config = config.require(type_name, fields);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r"
verify_layouts: false
type_capacity: 4
required:
  CommonConn: [input, rawInput]
  ServerConn:
    - peer
";

    #[test]
    fn test_parse_full_document() {
        let config = YamlLoader::parse(SAMPLE).expect("valid yaml");
        assert!(!config.verify_layouts);
        assert_eq!(config.type_capacity, 4);
        assert_eq!(config.required["CommonConn"], ["input", "rawInput"]);
        assert_eq!(config.required["ServerConn"], ["peer"]);
    }

    #[test]
    fn test_parse_empty_document_uses_defaults() {
        let config = YamlLoader::parse("{}").expect("empty mapping");
        assert_eq!(config, RegistryConfig::default());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = YamlLoader::parse("verify: true").expect_err("unknown key");
        assert!(matches!(err, Error::Config(_)));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_empty_field_list_rejected() {
        let err = YamlLoader::parse("required:\n  CommonConn: []\n").expect_err("no fields");
        assert!(matches!(err, Error::Config(msg) if msg.contains("CommonConn")));
    }

    #[test]
    fn test_oversized_capacity_rejected() {
        let err = YamlLoader::parse("type_capacity: 18446744073709551615").expect_err("too large");
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("type_capacity")));
        assert!(err.is_configuration());

        let config = YamlLoader::parse(&format!("type_capacity: {}", MAX_TYPE_CAPACITY))
            .expect("upper bound accepted");
        assert_eq!(config.type_capacity, MAX_TYPE_CAPACITY);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(SAMPLE.as_bytes()).expect("write yaml");

        let config = YamlLoader::load(file.path()).expect("load yaml");
        assert_eq!(config.required.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let err = YamlLoader::load("/nonexistent/connlayout.yaml").expect_err("missing");
        assert!(matches!(err, Error::IoError(_)));
    }
}
