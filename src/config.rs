//! Configuration types for ez-unzip
//!
//! The engine reads no settings store of its own. Host-level preferences
//! (default output folder, launch at login, ...) stay with the caller; this
//! config only tunes how the engine extracts, unwinds and cleans up.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration for the archive engine
///
/// Every field has a default, so `{}` is a valid JSON config.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Extraction and nested-archive unwinding
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Platform junk removal after extraction
    #[serde(default)]
    pub cleanup: CleanupConfig,

    /// Zip creation settings
    #[serde(default)]
    pub compression: CompressionConfig,
}

impl Config {
    /// Parse a config from a JSON string and validate it
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file and validate it
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Reject settings the engine cannot act on
    pub fn validate(&self) -> Result<()> {
        for name in &self.cleanup.junk_names {
            if name.is_empty() {
                return Err(Error::Config {
                    message: "junk name must not be empty".to_string(),
                    key: Some("junk_names".to_string()),
                });
            }
            if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
                return Err(Error::Config {
                    message: format!("junk name {name:?} must be a single path component"),
                    key: Some("junk_names".to_string()),
                });
            }
        }
        Ok(())
    }
}

/// Archive extraction configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Maximum nesting depth for unwinding archives found inside an
    /// extracted folder (default: 8, 0 disables unwinding)
    #[serde(default = "default_max_recursion")]
    pub max_recursion_depth: u32,

    /// Delete a nested archive once it has been expanded (default: true)
    #[serde(default = "default_true")]
    pub delete_nested_archives: bool,

    /// Collision handling for every path the engine writes
    #[serde(default)]
    pub file_collision: FileCollisionAction,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_recursion_depth: default_max_recursion(),
            delete_nested_archives: true,
            file_collision: FileCollisionAction::default(),
        }
    }
}

/// File collision handling strategy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCollisionAction {
    /// Append (1), (2), etc. to the name (default)
    #[default]
    Rename,
    /// Overwrite the existing file
    Overwrite,
    /// Fail instead of touching the existing file
    Skip,
}

/// Cleanup configuration for platform metadata entries
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// Remove junk entries after each extraction (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Entry names removed wherever they appear in an extracted tree
    #[serde(default = "default_junk_names")]
    pub junk_names: Vec<String>,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            junk_names: default_junk_names(),
        }
    }
}

/// Zip creation configuration
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionConfig {
    /// Compression method for new zip entries
    #[serde(default)]
    pub method: ZipMethod,
}

/// Compression method used when packing into a zip
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZipMethod {
    /// Deflate (default)
    #[default]
    Deflated,
    /// No compression
    Stored,
}

impl From<ZipMethod> for zip::CompressionMethod {
    fn from(method: ZipMethod) -> Self {
        match method {
            ZipMethod::Deflated => zip::CompressionMethod::Deflated,
            ZipMethod::Stored => zip::CompressionMethod::Stored,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_recursion() -> u32 {
    8
}

fn default_junk_names() -> Vec<String> {
    vec!["__MACOSX".into(), ".DS_Store".into()]
}
